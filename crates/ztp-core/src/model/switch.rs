use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Fabric tier of a configured switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Spine,
    Leaf,
}
