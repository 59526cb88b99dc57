//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use ztp_config::ConfigError;
use ztp_core::{AddressFamily, CoreError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const DEVICE: i32 = 4;
    pub const EXHAUSTED: i32 = 5;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Device ───────────────────────────────────────────────────────

    #[error("Switch command failed: {command}")]
    #[diagnostic(
        code(ztp::command_failed),
        help(
            "The switch CLI reported: {message}\n\
             Re-run with -vv to see every command sent."
        )
    )]
    CommandFailed { command: String, message: String },

    #[error("Unexpected output from '{command}': {reason}")]
    #[diagnostic(
        code(ztp::unexpected_output),
        help("Check that the switch CLI version matches the expected column layout.")
    )]
    UnexpectedOutput { command: String, reason: String },

    // ── Allocation ───────────────────────────────────────────────────

    #[error("{family} address space exhausted while links remain unassigned")]
    #[diagnostic(
        code(ztp::address_space_exhausted),
        help(
            "Widen the {family} range (cidr) or use smaller link subnets.\n\
             Interfaces added before the failure are left in place."
        )
    )]
    AddressSpaceExhausted { family: AddressFamily },

    // ── Authentication ───────────────────────────────────────────────

    #[error("No password configured for CLI user '{username}' in fabric '{fabric}'")]
    #[diagnostic(
        code(ztp::no_credentials),
        help(
            "Store one with: ztp config set-password\n\
             Or set cli.password_env in the fabric file."
        )
    )]
    NoCredentials { fabric: String, username: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ztp::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Fabric file not found")]
    #[diagnostic(
        code(ztp::no_config),
        help(
            "Pass one with --config or ZTP_CONFIG.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(ztp::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(ztp::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(ztp::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed { .. } | Self::UnexpectedOutput { .. } => exit_code::DEVICE,
            Self::AddressSpaceExhausted { .. } => exit_code::EXHAUSTED,
            Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::CommandFailed { command, message } => Self::CommandFailed { command, message },
            CoreError::UnexpectedOutput { command, reason } => {
                Self::UnexpectedOutput { command, reason }
            }
            CoreError::AddressSpaceExhausted { family } => Self::AddressSpaceExhausted { family },
            CoreError::Validation { message } => Self::Validation {
                field: "fabric".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { fabric, username } => {
                Self::NoCredentials { fabric, username }
            }
            ConfigError::Serialization(e) => Self::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
            ConfigError::Figment(e) => Self::Config(e),
            ConfigError::Io(e) => Self::Io(e),
        }
    }
}
