// Process transport for the switch CLI.
//
// The switch exposes its configuration through a local CLI binary. Every
// request is one invocation; login flags are prepended here so callers
// only ever deal in command words.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};

use crate::error::Error;

/// Runs one CLI command and returns its standard output.
///
/// Implementations must treat any device-reported error as
/// [`Error::CommandFailed`]; an empty stdout is a successful command with
/// no rows.
pub trait Transport: Send + Sync {
    fn run(&self, args: &[String]) -> impl Future<Output = Result<String, Error>> + Send;
}

/// Shared configuration for the process-backed transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Path of the switch CLI binary.
    pub program: PathBuf,
    /// Login user. When absent the CLI runs with the caller's session.
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("/usr/bin/cli"),
            username: None,
            password: None,
        }
    }
}

impl TransportConfig {
    /// Login and output flags placed before every command.
    fn login_args(&self) -> Vec<String> {
        let mut args = vec!["--quiet".to_owned(), "--no-login-prompt".to_owned()];
        if let Some(ref user) = self.username {
            let credential = match self.password {
                Some(ref pw) => format!("{user}:{}", pw.expose_secret()),
                None => user.clone(),
            };
            args.push("--user".into());
            args.push(credential);
        }
        args
    }
}

/// [`Transport`] that spawns the switch CLI with `tokio::process`.
#[derive(Debug, Clone)]
pub struct CliTransport {
    config: TransportConfig,
}

impl CliTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Transport for CliTransport {
    async fn run(&self, args: &[String]) -> Result<String, Error> {
        let command = args.join(" ");
        debug!(%command, "running switch cli");

        let output = tokio::process::Command::new(&self.config.program)
            .args(self.config.login_args())
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: self.config.program.display().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        trace!(%command, stdout = %stdout, stderr = %stderr, "switch cli returned");

        if !output.status.success() || (stdout.trim().is_empty() && !stderr.is_empty()) {
            return Err(Error::CommandFailed {
                command,
                stderr: if stderr.is_empty() {
                    output.status.to_string()
                } else {
                    stderr
                },
            });
        }

        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_args_embed_credentials() {
        let config = TransportConfig {
            username: Some("network-admin".into()),
            password: Some(SecretString::from("test123")),
            ..TransportConfig::default()
        };
        assert_eq!(
            config.login_args(),
            vec!["--quiet", "--no-login-prompt", "--user", "network-admin:test123"]
        );
    }

    #[test]
    fn login_args_without_user_skip_login() {
        let config = TransportConfig::default();
        assert_eq!(config.login_args(), vec!["--quiet", "--no-login-prompt"]);
    }
}
