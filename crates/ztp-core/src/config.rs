// ── Runtime fabric configuration ──
//
// What a single run needs to know about the fabric. The config crate
// builds this from files and environment; nothing here touches disk.

use ztp_api::{BfdTimers, NatRealm};

use crate::allocate::AddressPlan;
use crate::error::CoreError;
use crate::model::Role;

/// Active address plans. At least one must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Addressing {
    pub v4: Option<AddressPlan>,
    pub v6: Option<AddressPlan>,
}

impl Addressing {
    /// `true` when any active family uses two-host link subnets.
    pub fn is_point_to_point(&self) -> bool {
        self.v4
            .iter()
            .chain(self.v6.iter())
            .any(AddressPlan::is_point_to_point)
    }

    pub fn is_empty(&self) -> bool {
        self.v4.is_none() && self.v6.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct FabricConfig {
    pub fabric_name: String,
    /// Vnet for created vrouters; defaults to `<fabric_name>-global`.
    pub vnet: Option<String>,
    /// The switch this run provisions.
    pub current_switch: String,
    /// Spines in canonical order.
    pub spines: Vec<String>,
    /// Leafs in canonical order. Position decides address offsets.
    pub leafs: Vec<String>,
    pub addressing: Addressing,
    pub bfd: Option<BfdTimers>,
    pub nat_realm: Option<NatRealm>,
    pub jumbo_frames: bool,
    pub stp: bool,
    pub update_fabric_to_inband: bool,
    pub toggle_port_speed: bool,
}

impl FabricConfig {
    pub fn role_of(&self, switch: &str) -> Option<Role> {
        if self.spines.iter().any(|s| s == switch) {
            Some(Role::Spine)
        } else if self.leafs.iter().any(|l| l == switch) {
            Some(Role::Leaf)
        } else {
            None
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.role_of(&self.current_switch)
    }

    pub fn vnet(&self) -> String {
        self.vnet
            .clone()
            .unwrap_or_else(|| format!("{}-global", self.fabric_name))
    }

    /// Name given to a vrouter this run has to create.
    pub fn vrouter_name(switch: &str) -> String {
        format!("{switch}-vrouter")
    }

    /// Leafs configured before the current switch; empty for spines.
    pub fn preceding_leafs(&self) -> &[String] {
        let index = self
            .leafs
            .iter()
            .position(|l| *l == self.current_switch)
            .unwrap_or(0);
        self.leafs.get(..index).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.fabric_name.is_empty() {
            return Err(CoreError::validation("fabric name must not be empty"));
        }
        if let Some(dup) = self.spines.iter().find(|s| self.leafs.contains(*s)) {
            return Err(CoreError::validation(format!(
                "switch '{dup}' is listed as both spine and leaf"
            )));
        }
        if self.role().is_none() {
            return Err(CoreError::validation(format!(
                "current switch '{}' is neither a configured spine nor leaf",
                self.current_switch
            )));
        }
        if self.addressing.is_empty() {
            return Err(CoreError::validation("no address family is configured"));
        }
        Ok(())
    }
}
