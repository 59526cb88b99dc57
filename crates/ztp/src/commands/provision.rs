//! Commands that talk to the local switch CLI.

use serde::Serialize;
use tabled::Tabled;

use ztp_core::{Fabric, Link, Report, ReportEntry};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Switch")]
    switch: String,
    #[tabled(rename = "Message")]
    message: String,
}

fn report_row(e: &ReportEntry) -> ReportRow {
    ReportRow {
        switch: e.switch.clone(),
        message: e.message.clone(),
    }
}

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "Leaf")]
    leaf: String,
    #[tabled(rename = "Leaf Port")]
    leaf_port: u32,
    #[tabled(rename = "Spine")]
    spine: String,
    #[tabled(rename = "Spine Port")]
    spine_port: u32,
}

fn link_row(l: &Link) -> LinkRow {
    LinkRow {
        leaf: l.leaf.clone(),
        leaf_port: l.leaf_port,
        spine: l.spine.clone(),
        spine_port: l.spine_port,
    }
}

// ── Handlers ────────────────────────────────────────────────────────

/// `ztp provision`: full run on the current switch.
pub async fn run(global: &GlobalOpts) -> Result<(), CliError> {
    let file = config::load(global)?;
    let fabric = config::fabric_config(&file, global)?;
    let api = config::connect(&file)?;

    let report = Fabric::new(&api, &fabric).run().await?;
    print_report(&report, &fabric.current_switch, global)
}

/// `ztp toggle`: port speed toggling only.
pub async fn toggle(global: &GlobalOpts) -> Result<(), CliError> {
    let file = config::load(global)?;
    let fabric = config::fabric_config(&file, global)?;
    let api = config::connect(&file)?;

    let report = Fabric::new(&api, &fabric).toggle().await?;
    print_report(&report, &fabric.current_switch, global)
}

/// `ztp links`: spine links of the current switch as LLDP sees them.
pub async fn links(global: &GlobalOpts) -> Result<(), CliError> {
    let file = config::load(global)?;
    let fabric = config::fabric_config(&file, global)?;
    let api = config::connect(&file)?;

    let links = Fabric::new(&api, &fabric).links().await?;
    let out = output::render_list(&global.output, &links, link_row, ToString::to_string)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_report(report: &Report, switch: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => output::render_list(
            &global.output,
            &report.entries,
            report_row,
            |e| format!("{}: {}", e.switch, e.message),
        )?,
        _ => render_structured(report, global)?,
    };
    if !report.entries.is_empty() || !matches!(global.output, OutputFormat::Table) {
        output::print_output(&out, global.quiet);
    }

    if !global.quiet {
        let color = output::should_color(&global.color);
        eprintln!("{}", output::summary(switch, report.changed, color));
    }
    Ok(())
}

fn render_structured<T: Serialize>(data: &T, global: &GlobalOpts) -> Result<String, CliError> {
    output::render_single(&global.output, data, |_| String::new())
}
