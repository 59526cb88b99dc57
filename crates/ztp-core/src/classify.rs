// ── Splitter/quad port classifier ──
//
// Turns raw port speeds and bezel labels into a `PortLayout`, then groups
// the toggleable ports by native speed. A port is the primary of a 4-lane
// breakout when its successor's bezel label carries lane `.2`.

use std::collections::BTreeMap;

use tracing::debug;
use ztp_api::{BezelPort, PortId, PortSet, PortSpeed, Speed, SwitchApi};

use crate::error::CoreError;
use crate::model::{Membership, Port, PortLayout};

/// Models whose 25g ports are fixed quad lanes.
pub const QUAD_MODELS: &[&str] = &["ACCTON-AS7316-54X"];

/// Native speeds that are toggled, in processing order.
pub const TOGGLE_ORDER: [Speed; 3] = [Speed::G25, Speed::G40, Speed::G100];

/// Lower speeds tried for a port of the given native speed, in order.
pub fn candidate_speeds(native: Speed) -> &'static [Speed] {
    match native {
        Speed::G25 | Speed::G40 => &[Speed::G10],
        Speed::G100 => &[Speed::G10, Speed::G25, Speed::G40],
        Speed::G1 | Speed::G10 | Speed::G50 => &[],
    }
}

/// Ports of one native speed, toggled together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleGroup {
    pub native: Speed,
    pub candidates: &'static [Speed],
    /// Primaries, standalone and quad ports in ascending order.
    pub ports: Vec<Port>,
}

/// Classify every port of a switch.
pub fn classify(speeds: &[PortSpeed], bezels: &[BezelPort], model: Option<&str>) -> PortLayout {
    let mut splitters: BTreeMap<PortId, Membership> = BTreeMap::new();
    for bezel in bezels.iter().filter(|b| b.lane() == Some(2)) {
        let Some(primary) = bezel.port.checked_sub(1) else {
            continue;
        };
        // A group whose last lane would overflow the id space is not a splitter.
        if primary.checked_add(3).is_none() {
            continue;
        }
        splitters.insert(primary, Membership::SplitterPrimary);
        for offset in 1u8..=3 {
            if let Some(lane) = primary.checked_add(PortId::from(offset)) {
                splitters.insert(lane, Membership::SplitterLane(offset));
            }
        }
    }

    let quad_model = model.is_some_and(|m| QUAD_MODELS.contains(&m));

    speeds
        .iter()
        .map(|ps| {
            let membership = match splitters.get(&ps.port) {
                Some(m) => *m,
                None if quad_model && ps.speed == Some(Speed::G25) => Membership::Quad,
                None => Membership::Standalone,
            };
            Port {
                id: ps.port,
                speed: ps.speed,
                membership,
            }
        })
        .collect()
}

/// Group toggleable ports by native speed. Splitter lanes never appear.
pub fn toggle_groups(layout: &PortLayout) -> Vec<ToggleGroup> {
    TOGGLE_ORDER
        .iter()
        .map(|&native| ToggleGroup {
            native,
            candidates: candidate_speeds(native),
            ports: layout
                .ports()
                .filter(|p| p.speed == Some(native) && !p.is_lane())
                .copied()
                .collect(),
        })
        .filter(|group| !group.ports.is_empty())
        .collect()
}

/// Read speeds, successor bezel labels and model, then classify.
pub async fn read_layout<A: SwitchApi>(api: &A, switch: &str) -> Result<PortLayout, CoreError> {
    let speeds = api.port_speeds(switch).await?;
    let successors: PortSet = speeds.iter().filter_map(|ps| ps.port.checked_add(1)).collect();
    let bezels = api.bezel_ports(switch, &successors).await?;
    let model = api.switch_model(switch).await?;

    let layout = classify(&speeds, &bezels, model.as_deref());
    debug!(
        switch,
        ports = layout.len(),
        model = model.as_deref().unwrap_or("unknown"),
        "classified ports"
    );
    Ok(layout)
}
