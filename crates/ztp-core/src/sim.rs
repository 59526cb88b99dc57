#![allow(clippy::unwrap_used)]
// In-memory fabric used by the core tests.
//
// Models just enough device behaviour for the provisioning steps: port
// speed and admin state, LLDP visibility that depends on both, trunks,
// vrouters and their interfaces. Every mutation is recorded as the
// `Request` a real client would have sent.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use ztp_api::{
    BezelPort, Error, FabricNetwork, InterfaceAdd, InterfaceConfig, NeighborPort, PortAction,
    PortId, PortSet, PortSpeed, Request, Speed, SwitchApi,
};

#[derive(Debug, Clone)]
pub struct SimPort {
    pub speed: Option<Speed>,
    pub enabled: bool,
    pub bezel: String,
    /// Cabled peer switch and port.
    pub peer: Option<(String, PortId)>,
    /// Speeds at which the cable trains and LLDP comes up.
    pub link_speeds: Vec<Speed>,
}

impl SimPort {
    pub fn new(id: PortId, speed: Speed) -> Self {
        Self {
            speed: Some(speed),
            enabled: true,
            bezel: id.to_string(),
            peer: None,
            link_speeds: vec![speed],
        }
    }

    fn is_up(&self) -> bool {
        self.enabled && self.speed.is_some_and(|s| self.link_speeds.contains(&s))
    }
}

#[derive(Debug, Clone)]
pub struct SimInterface {
    pub switch: String,
    pub vrouter: String,
    pub ip: String,
    pub ip2: Option<String>,
    pub l3_port: PortId,
    pub nic: String,
    pub config: Option<InterfaceConfig>,
}

#[derive(Debug, Default)]
struct SimSwitch {
    model: Option<String>,
    ports: BTreeMap<PortId, SimPort>,
    trunks: BTreeMap<PortId, String>,
    vrouter: Option<String>,
    stp: bool,
}

#[derive(Debug, Default)]
struct State {
    switches: BTreeMap<String, SimSwitch>,
    interfaces: Vec<SimInterface>,
    in_band: bool,
    mutations: Vec<Request>,
    fail_on: Option<String>,
}

impl State {
    fn switch(&self, name: &str) -> Result<&SimSwitch, Error> {
        self.switches.get(name).ok_or_else(|| failed(name, "switch not found"))
    }

    fn switch_mut(&mut self, name: &str) -> Result<&mut SimSwitch, Error> {
        self.switches
            .get_mut(name)
            .ok_or_else(|| failed(name, "switch not found"))
    }

    /// Whether `port` on `switch` currently sees its neighbour.
    fn lldp_up(&self, switch: &str, port: PortId) -> bool {
        let Some(local) = self.switches.get(switch).and_then(|s| s.ports.get(&port)) else {
            return false;
        };
        let Some((peer, peer_port)) = &local.peer else {
            return false;
        };
        let remote_up = self
            .switches
            .get(peer)
            .and_then(|s| s.ports.get(peer_port))
            .is_some_and(|p| p.enabled);
        local.is_up() && remote_up
    }

    /// Record a mutation, failing it if it matches the injected pattern.
    fn record(&mut self, request: Request) -> Result<(), Error> {
        let command = request.to_string();
        if self.fail_on.as_ref().is_some_and(|p| command.contains(p.as_str())) {
            return Err(Error::CommandFailed {
                command,
                stderr: "simulated failure".into(),
            });
        }
        self.mutations.push(request);
        Ok(())
    }
}

fn failed(command: &str, stderr: &str) -> Error {
    Error::CommandFailed {
        command: command.into(),
        stderr: stderr.into(),
    }
}

#[derive(Debug, Default)]
pub struct SimFabric {
    state: Mutex<State>,
}

impl SimFabric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every leaf cabled to every spine with `links` 10g cables each.
    ///
    /// Leaf `i` port `s * links + j + 1` faces spine `s` port
    /// `i * links + j + 1`.
    pub fn leaf_spine(spines: &[&str], leafs: &[&str], links: u32) -> Self {
        let fabric = Self::new();
        for name in spines.iter().chain(leafs) {
            fabric.add_switch(name);
        }
        for (i, leaf) in (0u32..).zip(leafs) {
            for (s, spine) in (0u32..).zip(spines) {
                for j in 0..links {
                    let leaf_port = s * links + j + 1;
                    let spine_port = i * links + j + 1;
                    fabric.set_port(leaf, leaf_port, SimPort::new(leaf_port, Speed::G10));
                    fabric.set_port(spine, spine_port, SimPort::new(spine_port, Speed::G10));
                    fabric.cable(leaf, leaf_port, spine, spine_port);
                }
            }
        }
        fabric
    }

    pub fn add_switch(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .switches
            .entry(name.to_owned())
            .or_default();
    }

    pub fn set_model(&self, switch: &str, model: &str) {
        let mut state = self.state.lock().unwrap();
        state.switch_mut(switch).unwrap().model = Some(model.to_owned());
    }

    pub fn set_port(&self, switch: &str, id: PortId, port: SimPort) {
        let mut state = self.state.lock().unwrap();
        state.switch_mut(switch).unwrap().ports.insert(id, port);
    }

    pub fn cable(&self, a: &str, a_port: PortId, b: &str, b_port: PortId) {
        let mut state = self.state.lock().unwrap();
        state.switch_mut(a).unwrap().ports.get_mut(&a_port).unwrap().peer = Some((b.to_owned(), b_port));
        state.switch_mut(b).unwrap().ports.get_mut(&b_port).unwrap().peer = Some((a.to_owned(), a_port));
    }

    pub fn add_trunk(&self, switch: &str, port: PortId, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.switch_mut(switch).unwrap().trunks.insert(port, name.to_owned());
    }

    pub fn fail_on(&self, pattern: &str) {
        self.state.lock().unwrap().fail_on = Some(pattern.to_owned());
    }

    pub fn port(&self, switch: &str, id: PortId) -> SimPort {
        let state = self.state.lock().unwrap();
        state.switch(switch).unwrap().ports[&id].clone()
    }

    pub fn mutations(&self) -> Vec<Request> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn clear_mutations(&self) {
        self.state.lock().unwrap().mutations.clear();
    }

    pub fn interfaces(&self) -> Vec<SimInterface> {
        self.state.lock().unwrap().interfaces.clone()
    }
}

impl SwitchApi for SimFabric {
    async fn port_speeds(&self, switch: &str) -> Result<Vec<PortSpeed>, Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .switch(switch)?
            .ports
            .iter()
            .map(|(&port, p)| PortSpeed { port, speed: p.speed })
            .collect())
    }

    async fn bezel_ports(&self, switch: &str, ports: &PortSet) -> Result<Vec<BezelPort>, Error> {
        let state = self.state.lock().unwrap();
        let sw = state.switch(switch)?;
        Ok(ports
            .ports()
            .filter_map(|id| {
                sw.ports.get(&id).map(|p| BezelPort {
                    port: id,
                    bezel_port: p.bezel.clone(),
                })
            })
            .collect())
    }

    async fn switch_model(&self, switch: &str) -> Result<Option<String>, Error> {
        let state = self.state.lock().unwrap();
        Ok(state.switch(switch)?.model.clone())
    }

    async fn lldp_local_ports(&self, switch: &str) -> Result<BTreeSet<PortId>, Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .switch(switch)?
            .ports
            .keys()
            .copied()
            .filter(|&p| state.lldp_up(switch, p))
            .collect())
    }

    async fn neighbor_ports(&self, switch: &str, peers: &[String]) -> Result<Vec<NeighborPort>, Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .switch(switch)?
            .ports
            .iter()
            .filter(|&(&id, _)| state.lldp_up(switch, id))
            .filter_map(|(&port, p)| {
                let (peer, remote_port) = p.peer.as_ref()?;
                peers
                    .contains(peer)
                    .then_some(NeighborPort {
                        port,
                        remote_port: *remote_port,
                    })
            })
            .collect())
    }

    async fn port_config_modify(&self, switch: &str, ports: &PortSet, action: PortAction) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.record(Request::PortConfigModify {
            switch: switch.into(),
            ports: ports.clone(),
            action,
        })?;
        let sw = state.switch_mut(switch)?;
        for id in ports.ports() {
            let Some(port) = sw.ports.get_mut(&id) else {
                continue;
            };
            match action {
                PortAction::Disable => port.enabled = false,
                PortAction::Enable { speed } => {
                    port.enabled = true;
                    if speed.is_some() {
                        port.speed = speed;
                    }
                }
            }
        }
        Ok(())
    }

    async fn port_trunks(&self, switch: &str, port: PortId, peer: &str) -> Result<Vec<String>, Error> {
        let state = self.state.lock().unwrap();
        let sw = state.switch(switch)?;
        let faces_peer = sw
            .ports
            .get(&port)
            .and_then(|p| p.peer.as_ref())
            .is_some_and(|(name, _)| name == peer);
        Ok(sw
            .trunks
            .get(&port)
            .filter(|_| faces_peer)
            .cloned()
            .into_iter()
            .collect())
    }

    async fn trunk_delete(&self, switch: &str, trunk: &str) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.record(Request::TrunkDelete {
            switch: switch.into(),
            name: trunk.into(),
        })?;
        let sw = state.switch_mut(switch)?;
        let before = sw.trunks.len();
        sw.trunks.retain(|_, name| *name != trunk);
        if sw.trunks.len() == before {
            return Err(failed("trunk-delete", "trunk not found"));
        }
        Ok(())
    }

    async fn set_auto_trunk(&self, switch: &str, enable: bool) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.switch(switch)?;
        state.record(Request::AutoTrunkModify {
            switch: switch.into(),
            enable,
        })
    }

    async fn vrouter_names(&self, switch: &str) -> Result<Vec<String>, Error> {
        let state = self.state.lock().unwrap();
        Ok(state.switch(switch)?.vrouter.clone().into_iter().collect())
    }

    async fn vrouter_create(&self, switch: &str, name: &str, vnet: &str) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.record(Request::VrouterCreate {
            switch: switch.into(),
            name: name.into(),
            vnet: vnet.into(),
        })?;
        let sw = state.switch_mut(switch)?;
        if sw.vrouter.is_some() {
            return Err(failed("vrouter-create", "switch already has a vrouter"));
        }
        sw.vrouter = Some(name.to_owned());
        Ok(())
    }

    async fn vrouter_interface_owners(&self, l3_port: PortId, ip: &str) -> Result<Vec<String>, Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .interfaces
            .iter()
            .filter(|i| i.l3_port == l3_port && i.ip == ip)
            .map(|i| i.vrouter.clone())
            .collect())
    }

    async fn vrouter_interface_add(&self, add: &InterfaceAdd) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.record(Request::VrouterInterfaceAdd(add.clone()))?;
        let switch = state
            .switches
            .iter()
            .find(|(_, sw)| sw.vrouter.as_deref() == Some(add.vrouter.as_str()))
            .map(|(name, _)| name.clone())
            .ok_or_else(|| failed("vrouter-interface-add", "vrouter not found"))?;
        let nic = format!("eth0.{}", 4000 + state.interfaces.len());
        state.interfaces.push(SimInterface {
            switch,
            vrouter: add.vrouter.clone(),
            ip: add.ip.clone(),
            ip2: add.ip2.clone(),
            l3_port: add.l3_port,
            nic,
            config: None,
        });
        Ok(())
    }

    async fn vrouter_interface_nic(&self, vrouter: &str, l3_port: PortId) -> Result<Option<String>, Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .interfaces
            .iter()
            .find(|i| i.vrouter == vrouter && i.l3_port == l3_port)
            .map(|i| i.nic.clone()))
    }

    async fn vrouter_interface_config_add(&self, config: &InterfaceConfig) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.record(Request::VrouterInterfaceConfigAdd(config.clone()))?;
        let iface = state
            .interfaces
            .iter_mut()
            .find(|i| i.vrouter == config.vrouter && i.nic == config.nic)
            .ok_or_else(|| failed("vrouter-interface-config-add", "nic not found"))?;
        iface.config = Some(config.clone());
        Ok(())
    }

    async fn stp_enabled(&self, switch: &str) -> Result<bool, Error> {
        let state = self.state.lock().unwrap();
        Ok(state.switch(switch)?.stp)
    }

    async fn set_stp(&self, switch: &str, enable: bool) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.record(Request::StpModify {
            switch: switch.into(),
            enable,
        })?;
        state.switch_mut(switch)?.stp = enable;
        Ok(())
    }

    async fn fabric_network(&self) -> Result<Option<FabricNetwork>, Error> {
        let state = self.state.lock().unwrap();
        Ok(Some(if state.in_band {
            FabricNetwork::InBand
        } else {
            FabricNetwork::Mgmt
        }))
    }

    async fn set_fabric_network(&self, switch: &str, network: FabricNetwork) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.record(Request::FabricLocalModify {
            switch: switch.into(),
            network,
        })?;
        state.in_band = network == FabricNetwork::InBand;
        Ok(())
    }
}
