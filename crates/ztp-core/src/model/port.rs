// ── Port layout ──
//
// A switch's ports after classification. Splitter lanes are kept in the
// layout so lookups stay total, but they never appear in a toggle group.

use std::collections::BTreeMap;

use serde::Serialize;
use ztp_api::{PortId, PortRange, Speed};

/// How a physical port participates in link discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Membership {
    Standalone,
    /// First port of a 4-lane breakout; addressed as `p-(p+3)`.
    SplitterPrimary,
    /// Lane offset 1..=3 behind a splitter primary.
    SplitterLane(u8),
    /// Fixed-lane port on quad models; never restored to native speed.
    Quad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Port {
    pub id: PortId,
    /// Configured (native) speed at the start of the run.
    pub speed: Option<Speed>,
    pub membership: Membership,
}

impl Port {
    /// Lanes are driven through their primary only.
    pub fn is_lane(&self) -> bool {
        matches!(self.membership, Membership::SplitterLane(_))
    }

    /// The port range this port occupies when disabled or split.
    pub fn span(&self) -> PortRange {
        match self.membership {
            Membership::SplitterPrimary => match self.id.checked_add(3) {
                Some(last) => PortRange::span(self.id, last),
                None => PortRange::single(self.id),
            },
            _ => PortRange::single(self.id),
        }
    }
}

/// All classified ports of one switch, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortLayout {
    ports: BTreeMap<PortId, Port>,
}

impl PortLayout {
    pub fn get(&self, id: PortId) -> Option<&Port> {
        self.ports.get(&id)
    }

    /// Ports in ascending id order.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

impl FromIterator<Port> for PortLayout {
    fn from_iter<I: IntoIterator<Item = Port>>(iter: I) -> Self {
        Self {
            ports: iter.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}
