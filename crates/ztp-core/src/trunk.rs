// ── Trunk conflict resolver ──
//
// A port cannot be a trunk member and a routed interface at the same time.
// Auto-trunk is switched off on a switch before the first mutation made on
// it, so a deleted trunk does not re-form under the new interface, and is
// switched back on once the link loop is finished.

use tracing::{debug, info};
use ztp_api::{PortId, SwitchApi};

use crate::error::CoreError;
use crate::report::Outcome;

/// Switches whose auto-trunk this run has turned off, in order.
#[derive(Debug, Default)]
pub struct AutoTrunk {
    suspended: Vec<String>,
}

impl AutoTrunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suspended(&self) -> &[String] {
        &self.suspended
    }

    /// Turn auto-trunk off on `switch` unless this run already did.
    pub async fn suspend<A: SwitchApi>(&mut self, api: &A, switch: &str) -> Result<(), CoreError> {
        if self.suspended.iter().any(|s| s == switch) {
            return Ok(());
        }
        debug!(switch, "disabling auto-trunk");
        api.set_auto_trunk(switch, false).await?;
        self.suspended.push(switch.to_owned());
        Ok(())
    }

    /// Turn auto-trunk back on everywhere it was suspended.
    pub async fn restore<A: SwitchApi>(self, api: &A) -> Result<(), CoreError> {
        for switch in &self.suspended {
            debug!(switch = %switch, "re-enabling auto-trunk");
            api.set_auto_trunk(switch, true).await?;
        }
        Ok(())
    }
}

/// Delete the trunk `port` on `switch` belongs to on the link towards `peer`.
///
/// Missing trunks are a silent no-op. Only the first reported trunk is
/// deleted; a port belongs to at most one.
pub async fn clear_trunk<A: SwitchApi>(
    api: &A,
    auto_trunk: &mut AutoTrunk,
    switch: &str,
    port: PortId,
    peer: &str,
) -> Result<Outcome<()>, CoreError> {
    let trunks = api.port_trunks(switch, port, peer).await?;
    let Some(trunk) = trunks.first() else {
        return Ok(Outcome::unchanged(()));
    };

    auto_trunk.suspend(api, switch).await?;
    api.trunk_delete(switch, trunk).await?;
    info!(switch, port, trunk = %trunk, "deleted trunk");
    Ok(Outcome::changed(()).note(switch, format!("Deleted {trunk} trunk successfully")))
}
