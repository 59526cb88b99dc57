//! Clap derive structures for the `ztp` CLI.
//!
//! Shared with build.rs for man page generation, so this module may only
//! depend on clap, clap_complete and std.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ztp -- zero-touch provisioning for L3 leaf-spine fabrics
#[derive(Debug, Parser)]
#[command(
    name = "ztp",
    version,
    about = "Zero-touch provisioning for L3 leaf-spine fabrics",
    long_about = "Discovers spine links, allocates link subnets and provisions\n\
        routed vrouter interfaces on the switch this command runs for.\n\n\
        Every switch in the fabric runs with the same fabric file; only the\n\
        current switch differs.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Fabric file (default: platform config dir, fabric.toml)
    #[arg(long, env = "ZTP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Switch to provision (overrides current_switch in the fabric file)
    #[arg(long, short = 's', env = "ZTP_SWITCH", global = true)]
    pub switch: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ZTP_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full provisioning pass on the current switch
    #[command(alias = "run")]
    Provision,

    /// Only toggle port speeds until spine links come up
    Toggle,

    /// List the spine links LLDP reports for the current leaf
    Links,

    /// Preview link subnets without touching a switch
    Plan(PlanArgs),

    /// Inspect the fabric file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Plan ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Address range as ADDRESS/CIDR (default: address plans from the fabric file)
    #[arg(long, value_parser = parse_range, requires = "subnet")]
    pub range: Option<(IpAddr, u8)>,

    /// Link subnet prefix for --range
    #[arg(long, requires = "range")]
    pub subnet: Option<u8>,

    /// Links allocated before the first one shown
    #[arg(long, default_value = "0")]
    pub preceding: usize,

    /// Number of links to show
    #[arg(long, short = 'n', default_value = "1")]
    pub links: usize,
}

/// Parse `ADDRESS/CIDR`, keeping the host bits of the address.
fn parse_range(s: &str) -> Result<(IpAddr, u8), String> {
    let (addr, cidr) = s
        .split_once('/')
        .ok_or_else(|| format!("expected ADDRESS/CIDR, got '{s}'"))?;
    let addr: IpAddr = addr
        .parse()
        .map_err(|e| format!("invalid address '{addr}': {e}"))?;
    let cidr: u8 = cidr
        .parse()
        .map_err(|e| format!("invalid prefix length '{cidr}': {e}"))?;
    Ok((addr, cidr))
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved fabric file (secrets masked)
    Show,

    /// Print the default fabric file location
    Path,

    /// Store the switch CLI password in the system keyring (read from stdin)
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
