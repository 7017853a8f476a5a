//! Node type enum.

use std::fmt;

/// Type of a network node.
///
/// Sites are depots / terminals between which demand flows; stations are
/// charging locations. A station with positive cost is a *candidate* (may be
/// built by the optimizer), one with zero cost is pre-existing and always
/// usable.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeType {
    Site,
    Station,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Site => write!(f, "SITE"),
            NodeType::Station => write!(f, "STATION"),
        }
    }
}
