// ── Links and address blocks ──

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use ztp_api::PortId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum AddressFamily {
    #[strum(serialize = "ipv4")]
    #[serde(rename = "ipv4")]
    V4,
    #[strum(serialize = "ipv6")]
    #[serde(rename = "ipv6")]
    V6,
}

impl AddressFamily {
    pub fn of(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    /// Width of an address in bits.
    pub fn max_prefix(self) -> u8 {
        match self {
            Self::V4 => 32,
            Self::V6 => 128,
        }
    }
}

/// A leaf port confirmed by LLDP to face a spine port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub leaf: String,
    pub leaf_port: PortId,
    pub spine: String,
    pub spine_port: PortId,
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} <-> {}:{}",
            self.leaf, self.leaf_port, self.spine, self.spine_port
        )
    }
}

/// One address block from a single family.
///
/// The spine side always takes the first usable address and the leaf side
/// the next one. `reserved` is only set for IPv6 blocks wider than a
/// point-to-point pair, where the network address is issued but unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkBlock {
    pub spine: IpAddr,
    pub leaf: IpAddr,
    pub reserved: Option<IpAddr>,
    pub prefix: u8,
}

impl LinkBlock {
    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(self.spine)
    }

    /// Spine-side address in `ip/prefix` form.
    pub fn spine_cidr(&self) -> String {
        format!("{}/{}", self.spine, self.prefix)
    }

    /// Leaf-side address in `ip/prefix` form.
    pub fn leaf_cidr(&self) -> String {
        format!("{}/{}", self.leaf, self.prefix)
    }
}

/// Addresses issued to one link: the primary block plus the IPv6 block
/// carried as `ip2` when both families are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkAddresses {
    pub primary: LinkBlock,
    pub secondary: Option<LinkBlock>,
}

impl LinkAddresses {
    pub fn spine(&self) -> (String, Option<String>) {
        (
            self.primary.spine_cidr(),
            self.secondary.as_ref().map(LinkBlock::spine_cidr),
        )
    }

    pub fn leaf(&self) -> (String, Option<String>) {
        (
            self.primary.leaf_cidr(),
            self.secondary.as_ref().map(LinkBlock::leaf_cidr),
        )
    }
}
