// ── Request API ──
//
// Every CLI command the provisioning flow issues is a `Request` variant.
// Rendering to argv happens in exactly one place so the rest of the
// workspace never concatenates command strings.

use std::fmt;

use crate::models::{
    FabricNetwork, InterfaceAdd, InterfaceConfig, PortAction, PortId, PortSet,
};

/// All commands sent to the switch CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    // ── Port state ───────────────────────────────────────────────────
    PortConfigShow {
        switch: String,
    },
    BezelPortShow {
        switch: String,
        ports: PortSet,
    },
    SwitchInfoShow {
        switch: String,
    },
    LldpShow {
        switch: String,
    },
    NeighborPortShow {
        switch: String,
        hostnames: Vec<String>,
    },
    PortConfigModify {
        switch: String,
        ports: PortSet,
        action: PortAction,
    },

    // ── Trunks ───────────────────────────────────────────────────────
    PortTrunkShow {
        switch: String,
        port: PortId,
        hostname: String,
    },
    TrunkDelete {
        switch: String,
        name: String,
    },
    AutoTrunkModify {
        switch: String,
        enable: bool,
    },

    // ── Vrouters ─────────────────────────────────────────────────────
    VrouterShow {
        switch: String,
    },
    VrouterCreate {
        switch: String,
        name: String,
        vnet: String,
    },
    VrouterInterfaceShow {
        l3_port: PortId,
        ip: String,
    },
    VrouterInterfaceNicShow {
        vrouter: String,
        l3_port: PortId,
    },
    VrouterInterfaceAdd(InterfaceAdd),
    VrouterInterfaceConfigAdd(InterfaceConfig),

    // ── Fabric / STP ─────────────────────────────────────────────────
    StpShow {
        switch: String,
    },
    StpModify {
        switch: String,
        enable: bool,
    },
    FabricInfo,
    FabricLocalModify {
        switch: String,
        network: FabricNetwork,
    },
}

/// Builder that keeps argv construction terse.
struct Argv(Vec<String>);

impl Argv {
    fn new() -> Self {
        Self(Vec::new())
    }

    fn switch(self, switch: &str) -> Self {
        self.word("switch").word(switch)
    }

    fn word(mut self, word: impl ToString) -> Self {
        self.0.push(word.to_string());
        self
    }

    fn pair(self, key: &str, value: impl ToString) -> Self {
        self.word(key).word(value)
    }

    fn parsable(self, fields: &str) -> Self {
        self.pair("format", fields).pair("parsable-delim", ",")
    }
}

impl Request {
    /// Returns `true` if the request changes device state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::PortConfigShow { .. }
                | Self::BezelPortShow { .. }
                | Self::SwitchInfoShow { .. }
                | Self::LldpShow { .. }
                | Self::NeighborPortShow { .. }
                | Self::PortTrunkShow { .. }
                | Self::VrouterShow { .. }
                | Self::VrouterInterfaceShow { .. }
                | Self::VrouterInterfaceNicShow { .. }
                | Self::StpShow { .. }
                | Self::FabricInfo
        )
    }

    /// Render the command words, without the CLI program or login flags.
    #[allow(clippy::too_many_lines)]
    pub fn args(&self) -> Vec<String> {
        let argv = Argv::new();
        let argv = match self {
            Self::PortConfigShow { switch } => argv
                .switch(switch)
                .word("port-config-show")
                .parsable("port,speed"),
            Self::BezelPortShow { switch, ports } => argv
                .switch(switch)
                .word("port-show")
                .pair("port", ports)
                .parsable("port,bezel-port"),
            Self::SwitchInfoShow { switch } => argv
                .switch(switch)
                .word("switch-info-show")
                .parsable("model"),
            Self::LldpShow { switch } => argv
                .switch(switch)
                .word("lldp-show")
                .parsable("local-port"),
            Self::NeighborPortShow { switch, hostnames } => argv
                .switch(switch)
                .word("port-show")
                .pair("hostname", hostnames.join(","))
                .parsable("port,rport"),
            Self::PortConfigModify {
                switch,
                ports,
                action,
            } => {
                let argv = argv
                    .switch(switch)
                    .word("port-config-modify")
                    .pair("port", ports);
                match action {
                    PortAction::Disable => argv.word("disable"),
                    PortAction::Enable { speed: Some(speed) } => {
                        argv.pair("speed", speed).word("enable")
                    }
                    PortAction::Enable { speed: None } => argv.word("enable"),
                }
            }
            Self::PortTrunkShow {
                switch,
                port,
                hostname,
            } => argv
                .switch(switch)
                .word("port-show")
                .pair("port", port)
                .pair("hostname", hostname)
                .parsable("trunk"),
            Self::TrunkDelete { switch, name } => {
                argv.switch(switch).word("trunk-delete").pair("name", name)
            }
            Self::AutoTrunkModify { switch, enable } => argv
                .switch(switch)
                .word("system-settings-modify")
                .word(if *enable { "auto-trunk" } else { "no-auto-trunk" }),
            Self::VrouterShow { switch } => argv
                .word("vrouter-show")
                .pair("location", switch)
                .parsable("name"),
            Self::VrouterCreate { switch, name, vnet } => argv
                .switch(switch)
                .word("vrouter-create")
                .pair("name", name)
                .pair("vnet", vnet)
                .pair("router-type", "hardware"),
            Self::VrouterInterfaceShow { l3_port, ip } => argv
                .word("vrouter-interface-show")
                .pair("l3-port", l3_port)
                .pair("ip", ip)
                .parsable("switch"),
            Self::VrouterInterfaceNicShow { vrouter, l3_port } => argv
                .word("vrouter-interface-show")
                .pair("vrouter-name", vrouter)
                .pair("l3-port", l3_port)
                .parsable("nic"),
            Self::VrouterInterfaceAdd(add) => {
                let mut argv = argv
                    .word("vrouter-interface-add")
                    .pair("vrouter-name", &add.vrouter)
                    .pair("ip", &add.ip);
                if let Some(ref ip2) = add.ip2 {
                    argv = argv.pair("ip2", ip2);
                }
                argv = argv.pair("l3-port", add.l3_port);
                if let Some(mtu) = add.mtu {
                    argv = argv.pair("mtu", mtu);
                }
                if let Some(realm) = add.nat_realm {
                    argv = argv.pair("if-nat-realm", realm);
                }
                argv
            }
            Self::VrouterInterfaceConfigAdd(config) => {
                let mut argv = argv
                    .word("vrouter-interface-config-add")
                    .pair("vrouter-name", &config.vrouter)
                    .pair("nic", &config.nic);
                if let Some(bfd) = config.bfd {
                    argv = argv
                        .pair("bfd-min-rx", bfd.min_rx)
                        .pair("bfd-multiplier", bfd.multiplier);
                }
                if config.ospf_point_to_point {
                    argv = argv.pair("ospf-network-type", "point-to-point");
                }
                argv
            }
            Self::StpShow { switch } => argv.switch(switch).word("stp-show").parsable("enable"),
            Self::StpModify { switch, enable } => argv
                .switch(switch)
                .word("stp-modify")
                .word(if *enable { "enable" } else { "disable" }),
            Self::FabricInfo => argv.word("fabric-info").parsable("fabric-network"),
            Self::FabricLocalModify { switch, network } => argv
                .switch(switch)
                .word("fabric-local-modify")
                .pair("fabric-network", network),
        };
        argv.0
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args().join(" "))
    }
}
