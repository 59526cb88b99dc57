// ztp-api: Typed async access to the switch CLI used for fabric provisioning

pub mod client;
pub mod error;
pub mod models;
pub mod request;
pub mod transport;

pub use client::{NvosClient, SwitchApi};
pub use error::Error;
pub use models::{
    BezelPort, BfdTimers, FabricNetwork, InterfaceAdd, InterfaceConfig, NatRealm, NeighborPort,
    PortAction, PortId, PortRange, PortSet, PortSpeed, Speed,
};
pub use request::Request;
pub use transport::{CliTransport, Transport, TransportConfig};
