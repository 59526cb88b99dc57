// ztp-core: Link discovery, address allocation and interface provisioning for one switch run.

pub mod allocate;
pub mod classify;
pub mod config;
pub mod error;
pub mod fabric;
pub mod model;
pub mod provision;
pub mod report;
pub mod toggle;
pub mod trunk;

#[cfg(test)]
mod sim;

// ── Primary re-exports ──────────────────────────────────────────────
pub use allocate::{AddressGenerator, AddressPlan, Allocation, LinkAllocator, plan_blocks};
pub use config::{Addressing, FabricConfig};
pub use error::CoreError;
pub use fabric::Fabric;
pub use report::{Outcome, Report, ReportEntry};

pub use model::{AddressFamily, Link, LinkAddresses, LinkBlock, Membership, Port, PortLayout, Role};
