// ── Core error types ──
//
// Every variant aborts the run it occurs in. Nothing here is retried and
// nothing already applied to a device is rolled back; a re-run relies on
// the query-before-create checks to skip completed work.

use thiserror::Error;

use crate::model::AddressFamily;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Device errors ────────────────────────────────────────────────
    #[error("Command `{command}` failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Unexpected output from `{command}`: {reason}")]
    UnexpectedOutput { command: String, reason: String },

    // ── Allocation errors ────────────────────────────────────────────
    #[error("{family} address space exhausted while links remain unassigned")]
    AddressSpaceExhausted { family: AddressFamily },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ztp_api::Error> for CoreError {
    fn from(err: ztp_api::Error) -> Self {
        match err {
            ztp_api::Error::CommandFailed { command, stderr } => Self::CommandFailed {
                command,
                message: stderr,
            },
            ztp_api::Error::Spawn { program, source } => Self::CommandFailed {
                command: program,
                message: source.to_string(),
            },
            ztp_api::Error::UnexpectedOutput { command, reason } => {
                Self::UnexpectedOutput { command, reason }
            }
        }
    }
}
