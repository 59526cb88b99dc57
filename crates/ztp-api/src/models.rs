// ── Typed CLI values ──
//
// Values that flow in both directions across the CLI boundary: port ids
// and ranges, speeds, and the typed payloads of the few mutations that
// carry more than a handful of arguments.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Physical port identifier as the switch numbers it.
pub type PortId = u32;

/// Configured port speed.
///
/// Rendered and parsed in the CLI's lowercase `<n>g` form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum Speed {
    #[strum(serialize = "1g")]
    #[serde(rename = "1g")]
    G1,
    #[strum(serialize = "10g")]
    #[serde(rename = "10g")]
    G10,
    #[strum(serialize = "25g")]
    #[serde(rename = "25g")]
    G25,
    #[strum(serialize = "40g")]
    #[serde(rename = "40g")]
    G40,
    #[strum(serialize = "50g")]
    #[serde(rename = "50g")]
    G50,
    #[strum(serialize = "100g")]
    #[serde(rename = "100g")]
    G100,
}

impl Speed {
    pub fn gbps(self) -> u32 {
        match self {
            Self::G1 => 1,
            Self::G10 => 10,
            Self::G25 => 25,
            Self::G40 => 40,
            Self::G50 => 50,
            Self::G100 => 100,
        }
    }
}

// ── Port sets ───────────────────────────────────────────────────────

/// An inclusive run of port ids, rendered as `49` or `49-52`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortRange {
    pub first: PortId,
    pub last: PortId,
}

impl PortRange {
    pub fn single(port: PortId) -> Self {
        Self {
            first: port,
            last: port,
        }
    }

    pub fn span(first: PortId, last: PortId) -> Self {
        Self { first, last }
    }

    pub fn contains(&self, port: PortId) -> bool {
        (self.first..=self.last).contains(&port)
    }

    pub fn ports(&self) -> impl Iterator<Item = PortId> {
        self.first..=self.last
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

/// Ordered list of port ranges, rendered comma-separated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortSet(Vec<PortRange>);

impl PortSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, range: PortRange) {
        self.0.push(range);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ranges(&self) -> &[PortRange] {
        &self.0
    }

    /// Every individual port id covered by the set.
    pub fn ports(&self) -> impl Iterator<Item = PortId> + '_ {
        self.0.iter().flat_map(PortRange::ports)
    }

    pub fn contains(&self, port: PortId) -> bool {
        self.0.iter().any(|r| r.contains(port))
    }
}

impl FromIterator<PortRange> for PortSet {
    fn from_iter<I: IntoIterator<Item = PortRange>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<PortId> for PortSet {
    fn from_iter<I: IntoIterator<Item = PortId>>(iter: I) -> Self {
        Self(iter.into_iter().map(PortRange::single).collect())
    }
}

impl fmt::Display for PortSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{range}")?;
        }
        Ok(())
    }
}

// ── Query rows ──────────────────────────────────────────────────────

/// One row of `port-config-show format port,speed`.
///
/// `speed` is `None` for values the switch reports that are not a
/// toggleable line rate (e.g. `disable`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSpeed {
    pub port: PortId,
    pub speed: Option<Speed>,
}

/// One row of `port-show format port,bezel-port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BezelPort {
    pub port: PortId,
    pub bezel_port: String,
}

impl BezelPort {
    /// Lane number encoded in the bezel label (`49.2` -> `Some(2)`).
    pub fn lane(&self) -> Option<u8> {
        let (_, lane) = self.bezel_port.split_once('.')?;
        lane.parse().ok()
    }
}

/// A local port with an LLDP neighbour, and the neighbour's port id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NeighborPort {
    pub port: PortId,
    pub remote_port: PortId,
}

// ── Mutation payloads ───────────────────────────────────────────────

/// What `port-config-modify` does to a port set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortAction {
    Disable,
    Enable { speed: Option<Speed> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NatRealm {
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FabricNetwork {
    Mgmt,
    InBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BfdTimers {
    pub min_rx: u32,
    pub multiplier: u32,
}

/// Payload of `vrouter-interface-add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAdd {
    pub vrouter: String,
    pub ip: String,
    pub ip2: Option<String>,
    pub l3_port: PortId,
    pub mtu: Option<u32>,
    pub nat_realm: Option<NatRealm>,
}

/// Payload of `vrouter-interface-config-add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    pub vrouter: String,
    pub nic: String,
    pub bfd: Option<BfdTimers>,
    pub ospf_point_to_point: bool,
}
