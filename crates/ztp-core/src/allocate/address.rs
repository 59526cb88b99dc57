// ── Address plans and block generators ──
//
// A plan slices the CIDR range around a base address into equal blocks.
// Point-to-point plans (/31, /127) hand out consecutive pairs starting at
// the base address itself; wider plans hand out subnet-aligned networks
// starting with the one that contains the base address.
//
// All arithmetic is done on the address as a `u128` so both families share
// one code path.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::IpNet;
use serde::Serialize;

use crate::error::CoreError;
use crate::model::{AddressFamily, LinkBlock};

/// One address family's share of the fabric address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddressPlan {
    base: IpAddr,
    cidr: u8,
    subnet: u8,
    #[serde(skip)]
    first: u128,
    #[serde(skip)]
    last: u128,
    #[serde(skip)]
    block_size: u128,
}

impl AddressPlan {
    /// Build a plan from a base address, the prefix of the range it lives in
    /// and the prefix of each link subnet.
    pub fn new(base: IpAddr, cidr: u8, subnet: u8) -> Result<Self, CoreError> {
        let family = AddressFamily::of(base);
        let max = family.max_prefix();

        let range = IpNet::new(base, cidr).map_err(|_| {
            CoreError::validation(format!("{family} prefix /{cidr} is longer than /{max}"))
        })?;
        if subnet < cidr || subnet >= max {
            return Err(CoreError::validation(format!(
                "{family} link subnet /{subnet} must lie between /{cidr} and /{}",
                max - 1
            )));
        }
        let block_size = 1u128
            .checked_shl(u32::from(max - subnet))
            .ok_or_else(|| CoreError::validation(format!("{family} link subnet /{subnet} is too wide")))?;

        Ok(Self {
            base,
            cidr,
            subnet,
            first: to_bits(range.network()),
            last: to_bits(range.broadcast()),
            block_size,
        })
    }

    pub fn base(&self) -> IpAddr {
        self.base
    }

    pub fn cidr(&self) -> u8 {
        self.cidr
    }

    pub fn subnet(&self) -> u8 {
        self.subnet
    }

    pub fn family(&self) -> AddressFamily {
        AddressFamily::of(self.base)
    }

    /// `true` for /31 and /127 link subnets.
    pub fn is_point_to_point(&self) -> bool {
        self.subnet == self.family().max_prefix() - 1
    }

    pub fn generator(&self) -> AddressGenerator {
        AddressGenerator::new(*self)
    }

    fn first_block(&self) -> u128 {
        let base = to_bits(self.base);
        if self.is_point_to_point() {
            base
        } else {
            base & !(self.block_size - 1)
        }
    }

    /// Assign addresses within a block starting at `start`.
    fn block_at(&self, start: u128) -> Option<LinkBlock> {
        let family = self.family();
        let (spine, leaf, reserved) = if self.is_point_to_point() {
            (start, start + 1, None)
        } else {
            let reserved = (family == AddressFamily::V6).then_some(start);
            (start + 1, start + 2, reserved)
        };
        Some(LinkBlock {
            spine: from_bits(family, spine)?,
            leaf: from_bits(family, leaf)?,
            reserved: match reserved {
                Some(bits) => Some(from_bits(family, bits)?),
                None => None,
            },
            prefix: self.subnet,
        })
    }
}

// ── Generator ───────────────────────────────────────────────────────

/// Result of asking a generator for its next block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    Block(LinkBlock),
    /// The next block would leave the plan's range. Terminal.
    Exhausted,
}

/// Bounded cursor over a plan's blocks.
#[derive(Debug, Clone)]
pub struct AddressGenerator {
    plan: AddressPlan,
    /// Start of the next block; `None` once exhausted.
    cursor: Option<u128>,
}

impl AddressGenerator {
    pub fn new(plan: AddressPlan) -> Self {
        Self {
            cursor: Some(plan.first_block()),
            plan,
        }
    }

    pub fn plan(&self) -> &AddressPlan {
        &self.plan
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_none()
    }

    /// Skip `count` blocks without issuing them.
    pub fn skip(&mut self, count: usize) {
        let step = u128::try_from(count)
            .ok()
            .and_then(|n| n.checked_mul(self.plan.block_size));
        self.cursor = match (self.cursor, step) {
            (Some(cursor), Some(step)) => cursor.checked_add(step),
            _ => None,
        };
    }

    pub fn next_block(&mut self) -> Allocation {
        let Some(start) = self.cursor else {
            return Allocation::Exhausted;
        };
        let end = start.checked_add(self.plan.block_size - 1);
        let block = match end {
            Some(end) if end <= self.plan.last && start >= self.plan.first => {
                self.plan.block_at(start)
            }
            _ => None,
        };
        match block {
            Some(block) => {
                self.cursor = end.and_then(|end| end.checked_add(1));
                Allocation::Block(block)
            }
            None => {
                self.cursor = None;
                Allocation::Exhausted
            }
        }
    }
}

// ── Address arithmetic ──────────────────────────────────────────────

fn to_bits(addr: IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u128::from(u32::from(v4)),
        IpAddr::V6(v6) => u128::from(v6),
    }
}

fn from_bits(family: AddressFamily, bits: u128) -> Option<IpAddr> {
    match family {
        AddressFamily::V4 => u32::try_from(bits).ok().map(|b| IpAddr::V4(Ipv4Addr::from(b))),
        AddressFamily::V6 => Some(IpAddr::V6(Ipv6Addr::from(bits))),
    }
}
