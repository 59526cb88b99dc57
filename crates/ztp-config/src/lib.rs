//! Fabric configuration for the `ztp` binary.
//!
//! One TOML file describes the fabric every switch shares: ordered spine
//! and leaf lists, address plans and link options. Each switch runs with
//! the same file and only overrides `current_switch`. Credentials for the
//! switch CLI resolve through env var, keyring, then plaintext.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ztp_api::{BfdTimers, NatRealm, TransportConfig};
use ztp_core::{AddressPlan, Addressing, FabricConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for CLI user '{username}' in fabric '{fabric}'")]
    NoCredentials { fabric: String, username: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Which address families links get.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddrType {
    #[default]
    Ipv4,
    Ipv6,
    Ipv4Ipv6,
}

/// Top-level fabric file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct FabricFile {
    #[serde(default)]
    pub fabric_name: String,

    /// Vnet for created vrouters (default: `<fabric_name>-global`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnet: Option<String>,

    /// Switch this invocation provisions. Usually set per host via
    /// `ZTP_CURRENT_SWITCH` or `--switch`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_switch: Option<String>,

    /// Spines in canonical order.
    #[serde(default)]
    pub spines: Vec<String>,

    /// Leafs in canonical order. Order decides address offsets.
    #[serde(default)]
    pub leafs: Vec<String>,

    #[serde(default)]
    pub addr_type: AddrType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<NetworkSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<NetworkSection>,

    #[serde(default)]
    pub bfd: BfdSection,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nat_realm: Option<NatRealm>,

    #[serde(default)]
    pub jumbo_frames: bool,

    #[serde(default)]
    pub stp: bool,

    #[serde(default)]
    pub update_fabric_to_inband: bool,

    #[serde(default = "default_true")]
    pub toggle_port_speed: bool,

    #[serde(default)]
    pub cli: CliSection,
}

impl Default for FabricFile {
    fn default() -> Self {
        Self {
            fabric_name: String::new(),
            vnet: None,
            current_switch: None,
            spines: Vec::new(),
            leafs: Vec::new(),
            addr_type: AddrType::default(),
            ipv4: None,
            ipv6: None,
            bfd: BfdSection::default(),
            nat_realm: None,
            jumbo_frames: false,
            stp: false,
            update_fabric_to_inband: false,
            toggle_port_speed: true,
            cli: CliSection::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// One family's link address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkSection {
    /// First address handed out.
    pub net_address: IpAddr,
    /// Prefix of the range the links are carved from.
    pub cidr: u8,
    /// Prefix of each link subnet (31 / 127 for point-to-point).
    pub subnet: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BfdSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rx: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<u32>,
}

/// How to reach the switch CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CliSection {
    #[serde(default = "default_cli_path")]
    pub path: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Plaintext password (prefer keyring or `password_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable holding the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
}

impl Default for CliSection {
    fn default() -> Self {
        Self {
            path: default_cli_path(),
            username: None,
            password: None,
            password_env: None,
        }
    }
}

fn default_cli_path() -> PathBuf {
    PathBuf::from("/usr/bin/cli")
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the fabric file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("net", "ztp", "ztp").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("ztp");
            p.push("fabric.toml");
            p
        },
        |dirs| dirs.config_dir().join("fabric.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the fabric file plus `ZTP_*` environment overrides.
///
/// Nested keys use a double underscore: `ZTP_IPV4__CIDR=24`.
pub fn load(path: Option<&Path>) -> Result<FabricFile, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if !path.exists() {
        return Err(ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("config file {} not found", path.display()),
        )));
    }

    let figment = Figment::new()
        .merge(Serialized::defaults(FabricFile::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("ZTP_").split("__"));

    Ok(figment.extract()?)
}

/// Render a fabric file back to TOML.
pub fn to_toml(file: &FabricFile) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(file)?)
}

// ── Translation to core ─────────────────────────────────────────────

impl FabricFile {
    /// Build the runtime config, optionally overriding the current switch.
    pub fn to_fabric_config(&self, current_switch: Option<&str>) -> Result<FabricConfig, ConfigError> {
        let current = current_switch
            .map(str::to_owned)
            .or_else(|| self.current_switch.clone())
            .ok_or_else(|| {
                ConfigError::invalid(
                    "current_switch",
                    "not set (use --switch, ZTP_CURRENT_SWITCH or current_switch in the file)",
                )
            })?;

        let config = FabricConfig {
            fabric_name: self.fabric_name.clone(),
            vnet: self.vnet.clone(),
            current_switch: current,
            spines: self.spines.clone(),
            leafs: self.leafs.clone(),
            addressing: self.addressing()?,
            bfd: self.bfd_timers()?,
            nat_realm: self.nat_realm,
            jumbo_frames: self.jumbo_frames,
            stp: self.stp,
            update_fabric_to_inband: self.update_fabric_to_inband,
            toggle_port_speed: self.toggle_port_speed,
        };
        config
            .validate()
            .map_err(|e| ConfigError::invalid("fabric", e.to_string()))?;
        Ok(config)
    }

    /// Address plans for the families `addr_type` selects.
    pub fn addressing(&self) -> Result<Addressing, ConfigError> {
        let (want_v4, want_v6) = match self.addr_type {
            AddrType::Ipv4 => (true, false),
            AddrType::Ipv6 => (false, true),
            AddrType::Ipv4Ipv6 => (true, true),
        };
        Ok(Addressing {
            v4: if want_v4 { Some(plan("ipv4", self.ipv4, false)?) } else { None },
            v6: if want_v6 { Some(plan("ipv6", self.ipv6, true)?) } else { None },
        })
    }

    fn bfd_timers(&self) -> Result<Option<BfdTimers>, ConfigError> {
        if !self.bfd.enabled {
            return Ok(None);
        }
        match (self.bfd.min_rx, self.bfd.multiplier) {
            (Some(min_rx), Some(multiplier)) => Ok(Some(BfdTimers { min_rx, multiplier })),
            _ => Err(ConfigError::invalid(
                "bfd",
                "min_rx and multiplier are required when BFD is enabled",
            )),
        }
    }

    /// Transport settings with the password resolved.
    pub fn transport_config(&self) -> Result<TransportConfig, ConfigError> {
        Ok(TransportConfig {
            program: self.cli.path.clone(),
            username: self.cli.username.clone(),
            password: self.resolve_password()?,
        })
    }

    /// Resolve the CLI password: env var, then keyring, then plaintext.
    ///
    /// Without a username the CLI runs in the caller's session and no
    /// password is needed.
    pub fn resolve_password(&self) -> Result<Option<SecretString>, ConfigError> {
        let Some(ref username) = self.cli.username else {
            return Ok(None);
        };

        // 1. Env var named by the file
        if let Some(ref env_name) = self.cli.password_env {
            if let Ok(pw) = std::env::var(env_name) {
                return Ok(Some(SecretString::from(pw)));
            }
        }

        // 2. System keyring
        if let Ok(entry) = keyring::Entry::new("ztp", &format!("{}/password", self.fabric_name)) {
            if let Ok(pw) = entry.get_password() {
                return Ok(Some(SecretString::from(pw)));
            }
        }

        // 3. Plaintext in config
        if let Some(ref pw) = self.cli.password {
            return Ok(Some(SecretString::from(pw.clone())));
        }

        Err(ConfigError::NoCredentials {
            fabric: self.fabric_name.clone(),
            username: username.clone(),
        })
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.cli.password.is_some() {
            copy.cli.password = Some("********".into());
        }
        copy
    }
}

fn plan(field: &str, section: Option<NetworkSection>, v6: bool) -> Result<AddressPlan, ConfigError> {
    let section = section.ok_or_else(|| ConfigError::invalid(field, "section is required by addr_type"))?;
    if section.net_address.is_ipv6() != v6 {
        return Err(ConfigError::invalid(
            field,
            format!("net_address {} is not an {field} address", section.net_address),
        ));
    }
    AddressPlan::new(section.net_address, section.cidr, section.subnet)
        .map_err(|e| ConfigError::invalid(field, e.to_string()))
}
