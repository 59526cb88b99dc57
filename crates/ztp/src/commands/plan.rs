//! `ztp plan`: offline preview of link subnets.
//!
//! Uses the same generator as a provisioning run, so the output matches
//! what a leaf with `--preceding` earlier links would be assigned.

use serde::Serialize;
use tabled::Tabled;

use ztp_core::{AddressFamily, AddressPlan, plan_blocks};

use crate::cli::{GlobalOpts, PlanArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Clone, Serialize, Tabled)]
struct PlannedLink {
    #[tabled(rename = "Link")]
    link: usize,
    #[tabled(rename = "Family")]
    family: AddressFamily,
    #[tabled(rename = "Spine")]
    spine: String,
    #[tabled(rename = "Leaf")]
    leaf: String,
}

pub fn handle(args: &PlanArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let plans = match (args.range, args.subnet) {
        (Some((base, cidr)), Some(subnet)) => vec![AddressPlan::new(base, cidr, subnet)?],
        _ => {
            let addressing = config::load(global)?.addressing()?;
            addressing.v4.into_iter().chain(addressing.v6).collect()
        }
    };

    let mut rows = Vec::new();
    for plan in &plans {
        let blocks = plan_blocks(plan, args.preceding, args.links)?;
        rows.extend(blocks.iter().enumerate().map(|(i, block)| PlannedLink {
            link: args.preceding + i + 1,
            family: block.family(),
            spine: block.spine_cidr(),
            leaf: block.leaf_cidr(),
        }));
    }

    let out = output::render_list(&global.output, &rows, PlannedLink::clone, |r| {
        format!("{} {}", r.spine, r.leaf)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
