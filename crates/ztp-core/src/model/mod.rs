// ── Fabric domain model ──
//
// Switches, ports and links as the provisioning steps see them. Everything
// here is derived from device state at the start of a run and discarded at
// the end of it.

pub mod link;
pub mod port;
pub mod switch;

// ── Re-exports ──────────────────────────────────────────────────────

pub use link::{AddressFamily, Link, LinkAddresses, LinkBlock};
pub use port::{Membership, Port, PortLayout};
pub use switch::Role;
