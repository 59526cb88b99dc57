use thiserror::Error;

/// Top-level error type for the `ztp-api` crate.
///
/// Every failure at the switch CLI boundary lands here. `ztp-core` maps
/// these into run-aborting domain errors; nothing in this crate retries.
#[derive(Debug, Error)]
pub enum Error {
    // ── Execution ───────────────────────────────────────────────────
    /// The switch CLI rejected the command (non-empty error output or a
    /// failing exit status).
    #[error("command `{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// The CLI binary could not be started at all.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// The command succeeded but its rows could not be parsed.
    #[error("unexpected output from `{command}`: {reason}")]
    UnexpectedOutput { command: String, reason: String },
}

impl Error {
    /// The rendered command this error is about, if any.
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { command, .. } | Self::UnexpectedOutput { command, .. } => {
                Some(command)
            }
            Self::Spawn { .. } => None,
        }
    }

    /// Returns `true` when the device itself reported the failure.
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::CommandFailed { .. })
    }
}
