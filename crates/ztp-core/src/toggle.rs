// ── Port speed toggler ──
//
// Ports that cannot see their neighbour at native speed are walked down a
// fixed list of lower speeds until LLDP reports a neighbour. Each toggle
// group runs its own small state machine:
//
//   Idle -> Probing(s) -> Settling(s) -> Reevaluating(s)
//        -> Probing(next) | Reverting -> Done
//
// A port that finds its neighbour keeps the speed that found it. Anything
// still dark at the end is put back at native speed, except quad ports,
// which are left disabled.

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{debug, info};
use ztp_api::{PortAction, PortId, PortSet, Speed, SwitchApi};

use crate::classify::{ToggleGroup, read_layout, toggle_groups};
use crate::error::CoreError;
use crate::model::{Membership, Port};
use crate::report::Outcome;

/// Time given to link training and LLDP after every speed change.
pub const SETTLE_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Index into the group's candidate speeds.
    Probing(usize),
    Settling(usize),
    Reevaluating(usize),
    Reverting,
    Done,
}

/// Toggle every eligible port on `switch` for link discovery.
pub async fn toggle_ports<A: SwitchApi>(api: &A, switch: &str) -> Result<Outcome<()>, CoreError> {
    let layout = read_layout(api, switch).await?;
    let mut outcome = Outcome::unchanged(());

    for group in toggle_groups(&layout) {
        let toggler = Toggler {
            api,
            switch,
            group: &group,
        };
        if toggler.run().await? {
            outcome.changed = true;
            outcome = outcome.note(
                switch,
                format!("Toggled {} ports for link discovery", group.native),
            );
        }
    }
    Ok(outcome)
}

struct Toggler<'a, A> {
    api: &'a A,
    switch: &'a str,
    group: &'a ToggleGroup,
}

impl<A: SwitchApi> Toggler<'_, A> {
    /// Drive the group to `Done`. Returns whether any port was modified.
    async fn run(&self) -> Result<bool, CoreError> {
        let mut phase = Phase::Idle;
        let mut dark: Vec<Port> = Vec::new();
        let mut changed = false;

        loop {
            debug!(switch = self.switch, native = %self.group.native, ?phase, "toggle step");
            phase = match phase {
                Phase::Idle => {
                    dark = self.undiscovered().await?;
                    if dark.is_empty() || self.group.candidates.is_empty() {
                        Phase::Done
                    } else {
                        Phase::Probing(0)
                    }
                }
                Phase::Probing(i) => {
                    let Some(&speed) = self.group.candidates.get(i) else {
                        break;
                    };
                    self.probe(&dark, speed).await?;
                    changed = true;
                    Phase::Settling(i)
                }
                Phase::Settling(i) => {
                    tokio::time::sleep(SETTLE_INTERVAL).await;
                    Phase::Reevaluating(i)
                }
                Phase::Reevaluating(i) => {
                    dark = self.undiscovered().await?;
                    if dark.is_empty() {
                        Phase::Done
                    } else if i + 1 < self.group.candidates.len() {
                        Phase::Probing(i + 1)
                    } else {
                        Phase::Reverting
                    }
                }
                Phase::Reverting => {
                    self.revert(&dark).await?;
                    Phase::Done
                }
                Phase::Done => break,
            };
        }
        Ok(changed)
    }

    /// Group ports without an LLDP neighbour, ascending.
    async fn undiscovered(&self) -> Result<Vec<Port>, CoreError> {
        let seen: BTreeSet<PortId> = self.api.lldp_local_ports(self.switch).await?;
        Ok(self
            .group
            .ports
            .iter()
            .filter(|p| !seen.contains(&p.id))
            .copied()
            .collect())
    }

    /// Disable the dark ports and bring them back at `speed`.
    ///
    /// Breakouts come back as a whole range only when the candidate speed
    /// fits four times into the native one; otherwise just the primary is
    /// enabled and its lanes stay down.
    async fn probe(&self, dark: &[Port], speed: Speed) -> Result<(), CoreError> {
        let splittable = self.group.native.gbps() >= 4 * speed.gbps();
        let spans: PortSet = dark.iter().map(Port::span).collect();
        info!(switch = self.switch, ports = %spans, %speed, "probing at lower speed");

        self.modify(&spans, PortAction::Disable).await?;
        let enable = if splittable {
            spans
        } else {
            dark.iter().map(|p| p.id).collect()
        };
        self.modify(&enable, PortAction::Enable { speed: Some(speed) })
            .await
    }

    async fn revert(&self, dark: &[Port]) -> Result<(), CoreError> {
        let disable: PortSet = dark.iter().map(Port::span).collect();
        let restore: PortSet = dark
            .iter()
            .filter(|p| p.membership != Membership::Quad)
            .map(|p| p.id)
            .collect();
        info!(
            switch = self.switch,
            ports = %disable,
            native = %self.group.native,
            "reverting undiscovered ports"
        );

        self.modify(&disable, PortAction::Disable).await?;
        self.modify(
            &restore,
            PortAction::Enable {
                speed: Some(self.group.native),
            },
        )
        .await
    }

    async fn modify(&self, ports: &PortSet, action: PortAction) -> Result<(), CoreError> {
        if ports.is_empty() {
            return Ok(());
        }
        self.api
            .port_config_modify(self.switch, ports, action)
            .await
            .map_err(CoreError::from)
    }
}
