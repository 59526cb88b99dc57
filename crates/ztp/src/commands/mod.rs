//! Command handlers, one module per top-level subcommand group.

pub mod config_cmd;
pub mod plan;
pub mod provision;
