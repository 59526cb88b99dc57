// ── Vrouter interface provisioner ──
//
// Query-before-create for both the vrouter and its interfaces. An
// interface whose (l3-port, ip) is already owned by the switch's vrouter is
// reported and skipped, which is what makes a re-run on a configured
// fabric a no-op.

use std::collections::HashMap;

use tracing::info;
use ztp_api::{InterfaceAdd, InterfaceConfig, PortId, SwitchApi};

use crate::config::FabricConfig;
use crate::error::CoreError;
use crate::report::Outcome;
use crate::trunk::AutoTrunk;

/// MTU applied to link interfaces when jumbo frames are enabled.
pub const JUMBO_MTU: u32 = 9216;

/// One routed interface to make sure of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRequest {
    pub switch: String,
    pub l3_port: PortId,
    pub ip: String,
    pub ip2: Option<String>,
}

pub struct Provisioner<'a, A> {
    api: &'a A,
    config: &'a FabricConfig,
    /// Vrouter name per switch, resolved once per run.
    vrouters: HashMap<String, String>,
}

impl<'a, A: SwitchApi> Provisioner<'a, A> {
    pub fn new(api: &'a A, config: &'a FabricConfig) -> Self {
        Self {
            api,
            config,
            vrouters: HashMap::new(),
        }
    }

    /// Name of the vrouter on `switch`, creating one if none exists.
    pub async fn ensure_vrouter(&mut self, switch: &str) -> Result<Outcome<String>, CoreError> {
        if let Some(name) = self.vrouters.get(switch) {
            return Ok(Outcome::unchanged(name.clone()));
        }

        let existing = self.api.vrouter_names(switch).await?;
        let outcome = if let Some(name) = existing.into_iter().next() {
            Outcome::unchanged(name)
        } else {
            let name = FabricConfig::vrouter_name(switch);
            let vnet = self.config.vnet();
            self.api.vrouter_create(switch, &name, &vnet).await?;
            info!(switch, vrouter = %name, vnet = %vnet, "created vrouter");
            Outcome::changed(name.clone()).note(switch, format!("Created vrouter with name {name}"))
        };
        self.vrouters
            .insert(switch.to_owned(), outcome.value.clone());
        Ok(outcome)
    }

    /// Create the interface unless its vrouter already owns it.
    pub async fn ensure_interface(
        &mut self,
        auto_trunk: &mut AutoTrunk,
        request: &InterfaceRequest,
    ) -> Result<Outcome<()>, CoreError> {
        let switch = request.switch.as_str();
        let vrouter_outcome = self.ensure_vrouter(switch).await?;
        let vrouter = vrouter_outcome.value.clone();
        let mut outcome = Outcome {
            value: (),
            changed: vrouter_outcome.changed,
            notes: vrouter_outcome.notes,
        };

        let owners = self
            .api
            .vrouter_interface_owners(request.l3_port, &request.ip)
            .await?;
        if owners.contains(&vrouter) {
            return Ok(outcome.note(
                switch,
                format!(
                    "Vrouter interface with ip {} already present on {vrouter}",
                    request.ip
                ),
            ));
        }

        auto_trunk.suspend(self.api, switch).await?;
        self.api
            .vrouter_interface_add(&InterfaceAdd {
                vrouter: vrouter.clone(),
                ip: request.ip.clone(),
                ip2: request.ip2.clone(),
                l3_port: request.l3_port,
                mtu: self.config.jumbo_frames.then_some(JUMBO_MTU),
                nat_realm: self.config.nat_realm,
            })
            .await?;
        info!(switch, vrouter = %vrouter, ip = %request.ip, port = request.l3_port, "added vrouter interface");
        outcome.changed = true;
        let mut added = format!("Added vrouter interface with ip {}", request.ip);
        if let Some(ref ip2) = request.ip2 {
            added.push_str(&format!(" ip2 {ip2}"));
        }
        added.push_str(&format!(" on {vrouter}"));
        outcome = outcome.note(switch, added);

        self.configure_interface(switch, &vrouter, request.l3_port, outcome)
            .await
    }

    /// Attach BFD timers and the OSPF point-to-point marker to a new interface.
    async fn configure_interface(
        &self,
        switch: &str,
        vrouter: &str,
        l3_port: PortId,
        mut outcome: Outcome<()>,
    ) -> Result<Outcome<()>, CoreError> {
        let bfd = self.config.bfd;
        let point_to_point = self.config.addressing.is_point_to_point();
        if bfd.is_none() && !point_to_point {
            return Ok(outcome);
        }

        let nic = self
            .api
            .vrouter_interface_nic(vrouter, l3_port)
            .await?
            .ok_or_else(|| CoreError::UnexpectedOutput {
                command: format!("vrouter-interface-show vrouter-name {vrouter} l3-port {l3_port}"),
                reason: "no nic reported for the new interface".into(),
            })?;

        self.api
            .vrouter_interface_config_add(&InterfaceConfig {
                vrouter: vrouter.to_owned(),
                nic,
                bfd,
                ospf_point_to_point: point_to_point,
            })
            .await?;

        if bfd.is_some() {
            outcome = outcome.note(switch, format!("Added BFD configuration to {vrouter}"));
        }
        if point_to_point {
            outcome = outcome.note(
                switch,
                format!("Added OSPF network type as point-to-point to {vrouter}"),
            );
        }
        Ok(outcome)
    }
}
