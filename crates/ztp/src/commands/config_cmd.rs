//! Config subcommand handlers.

use std::io::BufRead;

use ztp_config::FabricFile;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Render the fabric file with secrets masked.
fn render_show(file: &FabricFile, format: &OutputFormat) -> Result<String, CliError> {
    let shown = file.redacted();
    let toml = ztp_config::to_toml(&shown)?;
    output::render_single(format, &shown, |_| toml.clone())
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let out = render_show(&config::load(global)?, &global.output)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::fabric_path(global).display());
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword => {
            let file = config::load(global)?;
            let mut secret = String::new();
            std::io::stdin().lock().read_line(&mut secret)?;
            let secret = secret.trim_end_matches(['\r', '\n']);

            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }

            let entry = keyring::Entry::new("ztp", &format!("{}/password", file.fabric_name))
                .map_err(|e| CliError::Validation {
                    field: "keyring".into(),
                    reason: format!("failed to access keyring: {e}"),
                })?;
            entry.set_password(secret).map_err(|e| CliError::Validation {
                field: "keyring".into(),
                reason: format!("failed to store password in keyring: {e}"),
            })?;

            if !global.quiet {
                eprintln!("✓ Password stored in system keyring for fabric '{}'", file.fabric_name);
            }
            Ok(())
        }
    }
}
