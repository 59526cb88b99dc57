// ── Orchestration ──
//
// One run provisions the current switch. Leafs drive link provisioning for
// both ends of each of their links; spines only toggle and apply the
// ancillary settings. Any error aborts the run where it happens.

use tracing::info;
use ztp_api::{FabricNetwork, SwitchApi};

use crate::allocate::{LinkAllocator, consumed_blocks};
use crate::config::FabricConfig;
use crate::error::CoreError;
use crate::model::{Link, Role};
use crate::provision::{InterfaceRequest, Provisioner};
use crate::report::{Outcome, Report};
use crate::toggle::toggle_ports;
use crate::trunk::{AutoTrunk, clear_trunk};

pub struct Fabric<'a, A> {
    api: &'a A,
    config: &'a FabricConfig,
}

impl<'a, A: SwitchApi> Fabric<'a, A> {
    pub fn new(api: &'a A, config: &'a FabricConfig) -> Self {
        Self { api, config }
    }

    /// Full provisioning run on the current switch.
    pub async fn run(&self) -> Result<Report, CoreError> {
        self.config.validate()?;
        let switch = self.config.current_switch.as_str();
        let mut report = Report::new();
        info!(switch, role = ?self.config.role(), "starting provisioning run");

        if self.config.toggle_port_speed {
            report.absorb(toggle_ports(self.api, switch).await?);
        }
        if self.config.role() == Some(Role::Leaf) {
            report.absorb(self.provision_links().await?);
        }
        if self.config.update_fabric_to_inband {
            report.absorb(self.ensure_in_band().await?);
        }
        if self.config.stp {
            report.absorb(self.ensure_stp().await?);
        }

        info!(switch, changed = report.changed, "provisioning run finished");
        Ok(report)
    }

    /// Only the port speed toggler, on the current switch.
    pub async fn toggle(&self) -> Result<Report, CoreError> {
        self.config.validate()?;
        let mut report = Report::new();
        report.absorb(toggle_ports(self.api, &self.config.current_switch).await?);
        Ok(report)
    }

    /// Spine links of the current leaf: per spine in configured order, per
    /// leaf port ascending.
    pub async fn links(&self) -> Result<Vec<Link>, CoreError> {
        let leaf = &self.config.current_switch;
        let mut links = Vec::new();
        for spine in &self.config.spines {
            let ports = self
                .api
                .neighbor_ports(leaf, std::slice::from_ref(spine))
                .await?;
            links.extend(ports.into_iter().map(|np| Link {
                leaf: leaf.clone(),
                leaf_port: np.port,
                spine: spine.clone(),
                spine_port: np.remote_port,
            }));
        }
        Ok(links)
    }

    async fn provision_links(&self) -> Result<Outcome<()>, CoreError> {
        let mut outcome = Outcome::unchanged(());
        let mut allocator = LinkAllocator::new(&self.config.addressing);
        allocator.fast_forward(consumed_blocks(self.api, self.config).await?);

        let mut auto_trunk = AutoTrunk::new();
        let mut provisioner = Provisioner::new(self.api, self.config);

        for link in self.links().await? {
            let addresses = allocator.next_link()?;
            info!(%link, ip = %addresses.primary.spine_cidr(), "allocated link block");

            let (spine_ip, spine_ip2) = addresses.spine();
            let (leaf_ip, leaf_ip2) = addresses.leaf();
            let sides = [
                (&link.spine, link.spine_port, &link.leaf, spine_ip, spine_ip2),
                (&link.leaf, link.leaf_port, &link.spine, leaf_ip, leaf_ip2),
            ];
            for (switch, port, peer, ip, ip2) in sides {
                let cleared = clear_trunk(self.api, &mut auto_trunk, switch, port, peer).await?;
                merge(&mut outcome, cleared);

                let request = InterfaceRequest {
                    switch: switch.clone(),
                    l3_port: port,
                    ip,
                    ip2,
                };
                let created = provisioner.ensure_interface(&mut auto_trunk, &request).await?;
                merge(&mut outcome, created);
            }
        }

        auto_trunk.restore(self.api).await?;
        Ok(outcome)
    }

    async fn ensure_in_band(&self) -> Result<Outcome<()>, CoreError> {
        let switch = self.config.current_switch.as_str();
        if self.api.fabric_network().await? == Some(FabricNetwork::InBand) {
            return Ok(Outcome::unchanged(()));
        }
        self.api
            .set_fabric_network(switch, FabricNetwork::InBand)
            .await?;
        Ok(Outcome::changed(()).note(switch, "Updated fabric network to in-band"))
    }

    async fn ensure_stp(&self) -> Result<Outcome<()>, CoreError> {
        let switch = self.config.current_switch.as_str();
        if self.api.stp_enabled(switch).await? {
            return Ok(Outcome::unchanged(()));
        }
        self.api.set_stp(switch, true).await?;
        Ok(Outcome::changed(()).note(switch, "STP enabled"))
    }
}

fn merge(into: &mut Outcome<()>, step: Outcome<()>) {
    into.changed |= step.changed;
    into.notes.extend(step.notes);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;
    use ztp_api::{BfdTimers, NatRealm, PortId, Request};

    use super::*;
    use crate::allocate::AddressPlan;
    use crate::config::Addressing;
    use crate::config::tests::fabric;
    use crate::model::AddressFamily;
    use crate::sim::SimFabric;

    const SPINES: &[&str] = &["spine1", "spine2"];
    const LEAFS: &[&str] = &["leaf1", "leaf2", "leaf3"];

    async fn provision(sim: &SimFabric, config: &FabricConfig) -> Report {
        Fabric::new(sim, config).run().await.unwrap()
    }

    async fn provision_all(sim: &SimFabric, template: &FabricConfig) -> Vec<Report> {
        let mut reports = Vec::new();
        for leaf in LEAFS {
            let config = FabricConfig {
                current_switch: (*leaf).to_owned(),
                ..template.clone()
            };
            reports.push(provision(sim, &config).await);
        }
        reports
    }

    fn index_of(mutations: &[Request], wanted: impl Fn(&Request) -> bool) -> usize {
        mutations.iter().position(wanted).unwrap()
    }

    fn messages(report: &Report) -> Vec<&str> {
        report.entries.iter().map(|e| e.message.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn first_leaf_gets_the_first_blocks() {
        let sim = SimFabric::leaf_spine(&["spine1"], &["leaf1"], 2);
        let config = fabric("leaf1", &["spine1"], &["leaf1"]);

        let report = provision(&sim, &config).await;

        let by_side: Vec<(String, PortId, String)> = sim
            .interfaces()
            .into_iter()
            .map(|i| (i.switch, i.l3_port, i.ip))
            .collect();
        assert_eq!(
            by_side,
            vec![
                ("spine1".into(), 1, "172.168.1.1/31".into()),
                ("leaf1".into(), 1, "172.168.1.2/31".into()),
                ("spine1".into(), 2, "172.168.1.3/31".into()),
                ("leaf1".into(), 2, "172.168.1.4/31".into()),
            ]
        );
        assert!(report.changed);
        assert!(messages(&report).contains(&"Created vrouter with name spine1-vrouter"));
        assert!(messages(&report).contains(&"Added vrouter interface with ip 172.168.1.2/31 on leaf1-vrouter"));
    }

    #[tokio::test(start_paused = true)]
    async fn blocks_are_disjoint_across_leafs_in_order() {
        let sim = SimFabric::leaf_spine(SPINES, LEAFS, 2);
        let template = fabric("leaf1", SPINES, LEAFS);

        provision_all(&sim, &template).await;

        let interfaces = sim.interfaces();
        assert_eq!(interfaces.len(), LEAFS.len() * SPINES.len() * 2 * 2);
        let distinct: HashSet<&str> = interfaces.iter().map(|i| i.ip.as_str()).collect();
        assert_eq!(distinct.len(), interfaces.len());
        let last = interfaces.last().unwrap();
        assert_eq!((last.switch.as_str(), last.ip.as_str()), ("leaf3", "172.168.1.24/31"));
    }

    #[tokio::test(start_paused = true)]
    async fn rerun_on_configured_fabric_changes_nothing() {
        let sim = SimFabric::leaf_spine(SPINES, LEAFS, 2);
        let template = FabricConfig {
            stp: true,
            update_fabric_to_inband: true,
            toggle_port_speed: true,
            bfd: Some(BfdTimers {
                min_rx: 200,
                multiplier: 3,
            }),
            ..fabric("leaf1", SPINES, LEAFS)
        };
        provision_all(&sim, &template).await;
        sim.clear_mutations();

        let reports = provision_all(&sim, &template).await;

        assert!(reports.iter().all(|r| !r.changed));
        assert_eq!(sim.mutations(), Vec::<Request>::new());
        assert!(messages(&reports[0]).contains(&"Vrouter interface with ip 172.168.1.1/31 already present on spine1-vrouter"));
    }

    #[tokio::test(start_paused = true)]
    async fn trunk_is_deleted_before_the_interface_is_added() {
        let sim = SimFabric::leaf_spine(&["spine1"], &["leaf1"], 1);
        sim.add_trunk("spine1", 1, "auto-128");
        let config = fabric("leaf1", &["spine1"], &["leaf1"]);

        let report = provision(&sim, &config).await;

        let mutations = sim.mutations();
        let suspend = index_of(&mutations, |r| {
            *r == Request::AutoTrunkModify {
                switch: "spine1".into(),
                enable: false,
            }
        });
        let delete = index_of(&mutations, |r| {
            matches!(r, Request::TrunkDelete { name, .. } if name == "auto-128")
        });
        let add = index_of(&mutations, |r| {
            matches!(r, Request::VrouterInterfaceAdd(add) if add.vrouter == "spine1-vrouter")
        });
        assert!(suspend < delete && delete < add);
        assert_eq!(
            mutations.last(),
            Some(&Request::AutoTrunkModify {
                switch: "leaf1".into(),
                enable: true,
            })
        );
        assert!(messages(&report).contains(&"Deleted auto-128 trunk successfully"));
    }

    #[tokio::test(start_paused = true)]
    async fn dual_stack_interfaces_carry_options() {
        let sim = SimFabric::leaf_spine(&["spine1"], &["leaf1"], 1);
        let config = FabricConfig {
            addressing: Addressing {
                v4: Some(AddressPlan::new("10.0.0.0".parse().unwrap(), 24, 30).unwrap()),
                v6: Some(AddressPlan::new("2001:db8::".parse().unwrap(), 64, 127).unwrap()),
            },
            bfd: Some(BfdTimers {
                min_rx: 200,
                multiplier: 3,
            }),
            jumbo_frames: true,
            nat_realm: Some(NatRealm::Internal),
            ..fabric("leaf1", &["spine1"], &["leaf1"])
        };

        let report = provision(&sim, &config).await;

        let leaf = sim
            .interfaces()
            .into_iter()
            .find(|i| i.switch == "leaf1")
            .unwrap();
        assert_eq!(leaf.ip, "10.0.0.2/30");
        assert_eq!(leaf.ip2.as_deref(), Some("2001:db8::1/127"));
        let applied = leaf.config.unwrap();
        assert_eq!(applied.bfd, config.bfd);
        assert!(applied.ospf_point_to_point);
        let add = sim
            .mutations()
            .into_iter()
            .find_map(|r| match r {
                Request::VrouterInterfaceAdd(add) => Some(add),
                _ => None,
            })
            .unwrap();
        assert_eq!((add.mtu, add.nat_realm), (Some(9216), Some(NatRealm::Internal)));
        assert!(messages(&report).contains(&"Added vrouter interface with ip 10.0.0.2/30 ip2 2001:db8::1/127 on leaf1-vrouter"));
        assert!(messages(&report).contains(&"Added BFD configuration to leaf1-vrouter"));
        assert!(messages(&report).contains(&"Added OSPF network type as point-to-point to leaf1-vrouter"));
    }

    #[tokio::test(start_paused = true)]
    async fn wide_v4_subnet_skips_interface_config_without_bfd() {
        let sim = SimFabric::leaf_spine(&["spine1"], &["leaf1"], 1);
        let config = FabricConfig {
            addressing: Addressing {
                v4: Some(AddressPlan::new("10.0.0.0".parse().unwrap(), 24, 30).unwrap()),
                v6: None,
            },
            ..fabric("leaf1", &["spine1"], &["leaf1"])
        };

        provision(&sim, &config).await;

        assert!(
            !sim.mutations()
                .iter()
                .any(|r| matches!(r, Request::VrouterInterfaceConfigAdd(_)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn v6_exhaustion_aborts_with_links_left() {
        let sim = SimFabric::leaf_spine(&["spine1"], &["leaf1"], 3);
        let config = FabricConfig {
            addressing: Addressing {
                v4: None,
                v6: Some(AddressPlan::new("2001:db8::".parse().unwrap(), 126, 127).unwrap()),
            },
            ..fabric("leaf1", &["spine1"], &["leaf1"])
        };

        let err = Fabric::new(&sim, &config).run().await.unwrap_err();

        assert!(
            matches!(err, CoreError::AddressSpaceExhausted { family: AddressFamily::V6 }),
            "expected v6 exhaustion, got: {err:?}"
        );
        // Links provisioned before the failure stay in place.
        assert_eq!(sim.interfaces().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn device_error_aborts_the_run() {
        let sim = SimFabric::leaf_spine(&["spine1"], &["leaf1"], 1);
        sim.fail_on("vrouter-create name leaf1-vrouter");
        let config = fabric("leaf1", &["spine1"], &["leaf1"]);

        let err = Fabric::new(&sim, &config).run().await.unwrap_err();

        match err {
            CoreError::CommandFailed { command, message } => {
                assert!(command.contains("vrouter-create"));
                assert_eq!(message, "simulated failure");
            }
            other => panic!("expected CommandFailed, got: {other:?}"),
        }
        assert!(sim.interfaces().iter().all(|i| i.switch == "spine1"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_trunk_delete_aborts_before_any_interface() {
        let sim = SimFabric::leaf_spine(&["spine1"], &["leaf1"], 1);
        sim.add_trunk("spine1", 1, "auto-128");
        sim.fail_on("trunk-delete");
        let config = fabric("leaf1", &["spine1"], &["leaf1"]);

        let err = Fabric::new(&sim, &config).run().await.unwrap_err();

        match err {
            CoreError::CommandFailed { command, message } => {
                assert!(command.contains("trunk-delete name auto-128"));
                assert_eq!(message, "simulated failure");
            }
            other => panic!("expected CommandFailed, got: {other:?}"),
        }
        assert!(sim.interfaces().is_empty());
        // Auto-trunk stays off on the switch already touched.
        assert_eq!(
            sim.mutations(),
            vec![Request::AutoTrunkModify {
                switch: "spine1".into(),
                enable: false,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn spine_run_skips_link_provisioning() {
        let sim = SimFabric::leaf_spine(&["spine1"], &["leaf1"], 2);
        let config = FabricConfig {
            stp: true,
            ..fabric("spine1", &["spine1"], &["leaf1"])
        };

        let report = provision(&sim, &config).await;

        assert_eq!(
            sim.mutations(),
            vec![Request::StpModify {
                switch: "spine1".into(),
                enable: true,
            }]
        );
        assert_eq!(messages(&report), vec!["STP enabled"]);
    }

    #[tokio::test(start_paused = true)]
    async fn fabric_moves_to_in_band_once() {
        let sim = SimFabric::leaf_spine(&["spine1"], &["leaf1"], 1);
        let config = FabricConfig {
            update_fabric_to_inband: true,
            ..fabric("spine1", &["spine1"], &["leaf1"])
        };

        let first = provision(&sim, &config).await;
        let second = provision(&sim, &config).await;

        assert_eq!(messages(&first), vec!["Updated fabric network to in-band"]);
        assert!(first.changed);
        assert!(!second.changed);
        assert_eq!(
            sim.mutations(),
            vec![Request::FabricLocalModify {
                switch: "spine1".into(),
                network: FabricNetwork::InBand,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn links_follow_spine_order_then_port_order() {
        let sim = SimFabric::leaf_spine(SPINES, &["leaf1"], 2);
        let config = fabric("leaf1", &["spine2", "spine1"], &["leaf1"]);

        let links = Fabric::new(&sim, &config).links().await.unwrap();

        let order: Vec<(&str, PortId)> = links.iter().map(|l| (l.spine.as_str(), l.leaf_port)).collect();
        assert_eq!(order, vec![("spine2", 3), ("spine2", 4), ("spine1", 1), ("spine1", 2)]);
    }
}
