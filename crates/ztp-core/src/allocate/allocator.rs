// ── Link allocator ──
//
// Each leaf derives its position in the shared address sequence on its
// own: it counts the spine-facing ports of every leaf configured before it
// and skips that many blocks. No ledger is kept anywhere. The count is
// read from live LLDP state, so leafs must be brought up in configured
// order the first time; two leafs allocating concurrently on an empty
// fabric can observe the same predecessor count and collide.

use tracing::{debug, info, warn};
use ztp_api::SwitchApi;

use super::address::{AddressGenerator, AddressPlan, Allocation};
use crate::config::{Addressing, FabricConfig};
use crate::error::CoreError;
use crate::model::{LinkAddresses, LinkBlock};

/// Per-run allocator holding one generator per active family.
#[derive(Debug, Clone)]
pub struct LinkAllocator {
    v4: Option<AddressGenerator>,
    v6: Option<AddressGenerator>,
}

impl LinkAllocator {
    pub fn new(addressing: &Addressing) -> Self {
        Self {
            v4: addressing.v4.as_ref().map(AddressPlan::generator),
            v6: addressing.v6.as_ref().map(AddressPlan::generator),
        }
    }

    /// Skip the blocks already consumed by preceding leafs, in every family.
    pub fn fast_forward(&mut self, blocks: usize) {
        for generator in self.v4.iter_mut().chain(self.v6.iter_mut()) {
            generator.skip(blocks);
        }
    }

    /// Issue the addresses for the next link.
    ///
    /// IPv4 is primary when active; IPv6 then rides along as the secondary
    /// address. Running out in either family fails the whole link.
    pub fn next_link(&mut self) -> Result<LinkAddresses, CoreError> {
        let v4 = self.v4.as_mut().map(take).transpose()?;
        let v6 = self.v6.as_mut().map(take).transpose()?;
        match (v4, v6) {
            (Some(primary), secondary) => Ok(LinkAddresses { primary, secondary }),
            (None, Some(primary)) => Ok(LinkAddresses {
                primary,
                secondary: None,
            }),
            (None, None) => Err(CoreError::validation("no address family is configured")),
        }
    }
}

fn take(generator: &mut AddressGenerator) -> Result<LinkBlock, CoreError> {
    match generator.next_block() {
        Allocation::Block(block) => Ok(block),
        Allocation::Exhausted => {
            let family = generator.plan().family();
            warn!(%family, "address space exhausted");
            Err(CoreError::AddressSpaceExhausted { family })
        }
    }
}

/// Number of blocks consumed by the leafs configured before the current one.
pub async fn consumed_blocks<A: SwitchApi>(api: &A, config: &FabricConfig) -> Result<usize, CoreError> {
    let mut total = 0;
    for leaf in config.preceding_leafs() {
        let ports = api.neighbor_ports(leaf, &config.spines).await?;
        debug!(leaf = %leaf, links = ports.len(), "counted spine links of preceding leaf");
        total += ports.len();
    }
    info!(switch = %config.current_switch, consumed = total, "fast-forwarding address plans");
    Ok(total)
}

/// Blocks a leaf would receive after `preceding` blocks, without touching
/// a device.
pub fn plan_blocks(plan: &AddressPlan, preceding: usize, links: usize) -> Result<Vec<LinkBlock>, CoreError> {
    let mut generator = plan.generator();
    generator.skip(preceding);
    (0..links).map(|_| take(&mut generator)).collect()
}
