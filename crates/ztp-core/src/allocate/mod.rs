// ── Link IP allocation ──
//
// Deterministic, ledger-free block allocation. See `allocator` for how a
// leaf finds its offset in the shared sequence.

pub mod address;
pub mod allocator;

pub use address::{AddressGenerator, AddressPlan, Allocation};
pub use allocator::{LinkAllocator, consumed_blocks, plan_blocks};
