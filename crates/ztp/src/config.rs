//! Fabric file resolution for CLI invocations.

use std::path::PathBuf;

use ztp_api::{CliTransport, NvosClient};
use ztp_config::FabricFile;
use ztp_core::FabricConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// `--config` / `ZTP_CONFIG`, else the platform default.
pub fn fabric_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(ztp_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<FabricFile, CliError> {
    let path = fabric_path(global);
    if !path.exists() {
        return Err(CliError::NoConfig {
            path: path.display().to_string(),
        });
    }
    Ok(ztp_config::load(Some(&path))?)
}

/// Runtime config for the switch selected by `--switch` or the file.
pub fn fabric_config(file: &FabricFile, global: &GlobalOpts) -> Result<FabricConfig, CliError> {
    Ok(file.to_fabric_config(global.switch.as_deref())?)
}

/// Client for the local switch CLI with credentials resolved.
pub fn connect(file: &FabricFile) -> Result<NvosClient<CliTransport>, CliError> {
    let transport = CliTransport::new(file.transport_config()?);
    Ok(NvosClient::new(transport))
}
