// Typed switch client
//
// `SwitchApi` is the contract the provisioning logic is written against:
// typed queries in, typed rows out. `NvosClient` implements it on top of a
// `Transport` by rendering `Request`s and parsing the comma-delimited
// rows the CLI prints with `parsable-delim ,`.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

use tracing::debug;

use crate::error::Error;
use crate::models::{
    BezelPort, FabricNetwork, InterfaceAdd, InterfaceConfig, NeighborPort, PortAction, PortId,
    PortSet, PortSpeed, Speed,
};
use crate::request::Request;
use crate::transport::Transport;

/// Typed view of a switch (and the fabric it belongs to).
///
/// All methods are a single device round-trip. Queries never mutate;
/// mutations return `()` and surface device errors as
/// [`Error::CommandFailed`].
pub trait SwitchApi: Send + Sync {
    // ── Device state ────────────────────────────────────────────────
    fn port_speeds(
        &self,
        switch: &str,
    ) -> impl Future<Output = Result<Vec<PortSpeed>, Error>> + Send;

    fn bezel_ports(
        &self,
        switch: &str,
        ports: &PortSet,
    ) -> impl Future<Output = Result<Vec<BezelPort>, Error>> + Send;

    fn switch_model(&self, switch: &str) -> impl Future<Output = Result<Option<String>, Error>> + Send;

    /// Local ports that currently have an LLDP neighbour.
    fn lldp_local_ports(
        &self,
        switch: &str,
    ) -> impl Future<Output = Result<BTreeSet<PortId>, Error>> + Send;

    /// Local ports whose LLDP neighbour is one of `peers`, ascending and
    /// de-duplicated by local port.
    fn neighbor_ports(
        &self,
        switch: &str,
        peers: &[String],
    ) -> impl Future<Output = Result<Vec<NeighborPort>, Error>> + Send;

    fn port_config_modify(
        &self,
        switch: &str,
        ports: &PortSet,
        action: PortAction,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    // ── Trunks ──────────────────────────────────────────────────────
    /// Trunks containing `port` on the link towards `peer`.
    fn port_trunks(
        &self,
        switch: &str,
        port: PortId,
        peer: &str,
    ) -> impl Future<Output = Result<Vec<String>, Error>> + Send;

    fn trunk_delete(&self, switch: &str, trunk: &str) -> impl Future<Output = Result<(), Error>> + Send;

    fn set_auto_trunk(&self, switch: &str, enable: bool) -> impl Future<Output = Result<(), Error>> + Send;

    // ── Vrouters ────────────────────────────────────────────────────
    /// Names of the vrouters located on `switch`.
    fn vrouter_names(&self, switch: &str) -> impl Future<Output = Result<Vec<String>, Error>> + Send;

    fn vrouter_create(
        &self,
        switch: &str,
        name: &str,
        vnet: &str,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Vrouters that already own an interface with this l3-port and ip.
    fn vrouter_interface_owners(
        &self,
        l3_port: PortId,
        ip: &str,
    ) -> impl Future<Output = Result<Vec<String>, Error>> + Send;

    fn vrouter_interface_add(
        &self,
        add: &InterfaceAdd,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn vrouter_interface_nic(
        &self,
        vrouter: &str,
        l3_port: PortId,
    ) -> impl Future<Output = Result<Option<String>, Error>> + Send;

    fn vrouter_interface_config_add(
        &self,
        config: &InterfaceConfig,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    // ── Fabric / STP ────────────────────────────────────────────────
    fn stp_enabled(&self, switch: &str) -> impl Future<Output = Result<bool, Error>> + Send;

    fn set_stp(&self, switch: &str, enable: bool) -> impl Future<Output = Result<(), Error>> + Send;

    fn fabric_network(&self) -> impl Future<Output = Result<Option<FabricNetwork>, Error>> + Send;

    fn set_fabric_network(
        &self,
        switch: &str,
        network: FabricNetwork,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

// ── Row parsing ─────────────────────────────────────────────────────

/// Non-empty output lines split on the parsable delimiter.
fn rows(output: &str) -> Vec<Vec<&str>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.split(',').map(str::trim).collect())
        .collect()
}

fn parse_port(request: &Request, field: &str) -> Result<PortId, Error> {
    field.parse().map_err(|_| Error::UnexpectedOutput {
        command: request.to_string(),
        reason: format!("'{field}' is not a port number"),
    })
}

fn field<'a>(request: &Request, row: &[&'a str], index: usize) -> Result<&'a str, Error> {
    row.get(index).copied().ok_or_else(|| Error::UnexpectedOutput {
        command: request.to_string(),
        reason: format!("expected at least {} fields, got {}", index + 1, row.len()),
    })
}

/// Distinct non-empty values of the first column, in output order.
fn first_column_distinct(output: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    rows(output)
        .into_iter()
        .filter_map(|row| row.first().map(|v| (*v).to_owned()))
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

/// Last column of the first row, which is where single-value queries land
/// whether or not the CLI echoes the key column.
fn single_value(output: &str) -> Option<String> {
    rows(output)
        .first()
        .and_then(|row| row.last())
        .filter(|v| !v.is_empty())
        .map(|v| (*v).to_owned())
}

// ── Client ──────────────────────────────────────────────────────────

/// [`SwitchApi`] over any [`Transport`].
#[derive(Debug, Clone)]
pub struct NvosClient<T> {
    transport: T,
}

impl<T: Transport> NvosClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request and return its raw output.
    pub async fn send(&self, request: &Request) -> Result<String, Error> {
        debug!(command = %request, "switch request");
        self.transport.run(&request.args()).await
    }

    async fn execute(&self, request: Request) -> Result<(), Error> {
        self.send(&request).await.map(|_| ())
    }
}

impl<T: Transport> SwitchApi for NvosClient<T> {
    async fn port_speeds(&self, switch: &str) -> Result<Vec<PortSpeed>, Error> {
        let request = Request::PortConfigShow {
            switch: switch.into(),
        };
        let output = self.send(&request).await?;
        rows(&output)
            .iter()
            .map(|row| -> Result<PortSpeed, Error> {
                Ok(PortSpeed {
                    port: parse_port(&request, field(&request, row, 0)?)?,
                    speed: row.get(1).and_then(|s| s.parse::<Speed>().ok()),
                })
            })
            .collect()
    }

    async fn bezel_ports(&self, switch: &str, ports: &PortSet) -> Result<Vec<BezelPort>, Error> {
        if ports.is_empty() {
            return Ok(Vec::new());
        }
        let request = Request::BezelPortShow {
            switch: switch.into(),
            ports: ports.clone(),
        };
        let output = self.send(&request).await?;
        rows(&output)
            .iter()
            .map(|row| -> Result<BezelPort, Error> {
                Ok(BezelPort {
                    port: parse_port(&request, field(&request, row, 0)?)?,
                    bezel_port: field(&request, row, 1)?.to_owned(),
                })
            })
            .collect()
    }

    async fn switch_model(&self, switch: &str) -> Result<Option<String>, Error> {
        let output = self
            .send(&Request::SwitchInfoShow {
                switch: switch.into(),
            })
            .await?;
        Ok(single_value(&output))
    }

    async fn lldp_local_ports(&self, switch: &str) -> Result<BTreeSet<PortId>, Error> {
        let request = Request::LldpShow {
            switch: switch.into(),
        };
        let output = self.send(&request).await?;
        rows(&output)
            .iter()
            .map(|row| parse_port(&request, field(&request, row, 0)?))
            .collect()
    }

    async fn neighbor_ports(
        &self,
        switch: &str,
        peers: &[String],
    ) -> Result<Vec<NeighborPort>, Error> {
        if peers.is_empty() {
            return Ok(Vec::new());
        }
        let request = Request::NeighborPortShow {
            switch: switch.into(),
            hostnames: peers.to_vec(),
        };
        let output = self.send(&request).await?;
        let mut by_port = BTreeMap::new();
        for row in rows(&output) {
            let port = parse_port(&request, field(&request, &row, 0)?)?;
            let remote_port = parse_port(&request, field(&request, &row, 1)?)?;
            by_port.entry(port).or_insert(remote_port);
        }
        Ok(by_port
            .into_iter()
            .map(|(port, remote_port)| NeighborPort { port, remote_port })
            .collect())
    }

    async fn port_config_modify(
        &self,
        switch: &str,
        ports: &PortSet,
        action: PortAction,
    ) -> Result<(), Error> {
        self.execute(Request::PortConfigModify {
            switch: switch.into(),
            ports: ports.clone(),
            action,
        })
        .await
    }

    async fn port_trunks(&self, switch: &str, port: PortId, peer: &str) -> Result<Vec<String>, Error> {
        let output = self
            .send(&Request::PortTrunkShow {
                switch: switch.into(),
                port,
                hostname: peer.into(),
            })
            .await?;
        Ok(first_column_distinct(&output))
    }

    async fn trunk_delete(&self, switch: &str, trunk: &str) -> Result<(), Error> {
        self.execute(Request::TrunkDelete {
            switch: switch.into(),
            name: trunk.into(),
        })
        .await
    }

    async fn set_auto_trunk(&self, switch: &str, enable: bool) -> Result<(), Error> {
        self.execute(Request::AutoTrunkModify {
            switch: switch.into(),
            enable,
        })
        .await
    }

    async fn vrouter_names(&self, switch: &str) -> Result<Vec<String>, Error> {
        let output = self
            .send(&Request::VrouterShow {
                switch: switch.into(),
            })
            .await?;
        Ok(first_column_distinct(&output))
    }

    async fn vrouter_create(&self, switch: &str, name: &str, vnet: &str) -> Result<(), Error> {
        self.execute(Request::VrouterCreate {
            switch: switch.into(),
            name: name.into(),
            vnet: vnet.into(),
        })
        .await
    }

    async fn vrouter_interface_owners(&self, l3_port: PortId, ip: &str) -> Result<Vec<String>, Error> {
        let output = self
            .send(&Request::VrouterInterfaceShow {
                l3_port,
                ip: ip.into(),
            })
            .await?;
        Ok(first_column_distinct(&output))
    }

    async fn vrouter_interface_add(&self, add: &InterfaceAdd) -> Result<(), Error> {
        self.execute(Request::VrouterInterfaceAdd(add.clone())).await
    }

    async fn vrouter_interface_nic(&self, vrouter: &str, l3_port: PortId) -> Result<Option<String>, Error> {
        let output = self
            .send(&Request::VrouterInterfaceNicShow {
                vrouter: vrouter.into(),
                l3_port,
            })
            .await?;
        Ok(single_value(&output))
    }

    async fn vrouter_interface_config_add(&self, config: &InterfaceConfig) -> Result<(), Error> {
        self.execute(Request::VrouterInterfaceConfigAdd(config.clone()))
            .await
    }

    async fn stp_enabled(&self, switch: &str) -> Result<bool, Error> {
        let output = self
            .send(&Request::StpShow {
                switch: switch.into(),
            })
            .await?;
        Ok(single_value(&output).is_some_and(|v| v == "yes"))
    }

    async fn set_stp(&self, switch: &str, enable: bool) -> Result<(), Error> {
        self.execute(Request::StpModify {
            switch: switch.into(),
            enable,
        })
        .await
    }

    async fn fabric_network(&self) -> Result<Option<FabricNetwork>, Error> {
        let output = self.send(&Request::FabricInfo).await?;
        Ok(single_value(&output).and_then(|v| v.parse().ok()))
    }

    async fn set_fabric_network(&self, switch: &str, network: FabricNetwork) -> Result<(), Error> {
        self.execute(Request::FabricLocalModify {
            switch: switch.into(),
            network,
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Echoes the rendered command back as its output.
    struct Echo;

    impl Transport for Echo {
        async fn run(&self, args: &[String]) -> Result<String, Error> {
            Ok(args.join(" "))
        }
    }

    #[test]
    fn send_passes_rendered_argv_to_transport() {
        let client = NvosClient::new(Echo);
        let request = Request::FabricInfo;

        let out = tokio_test::block_on(client.send(&request)).unwrap();

        assert_eq!(out, request.to_string());
    }

    #[test]
    fn rows_skip_blank_lines_and_trim_fields() {
        let parsed = rows("49, 40g\n\n 53,100g \n");
        assert_eq!(parsed, vec![vec!["49", "40g"], vec!["53", "100g"]]);
    }

    #[test]
    fn first_column_distinct_keeps_first_occurrence() {
        let values = first_column_distinct("auto-128\nauto-128\n\nauto-129\n");
        assert_eq!(values, vec!["auto-128", "auto-129"]);
    }

    #[test]
    fn single_value_reads_last_field() {
        assert_eq!(single_value("leaf1-vrouter,eth0.4092\n").as_deref(), Some("eth0.4092"));
        assert_eq!(single_value("yes").as_deref(), Some("yes"));
        assert_eq!(single_value("  \n"), None);
    }
}
