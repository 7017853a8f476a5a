//! Strongly typed node identifiers.
//!
//! `NodeId` is the user-assigned id from `nodes.csv`; ids are required to be
//! strictly positive (the loader enforces this). `NodeKey` is the key used
//! inside per-pair subgraphs: candidate stations are split into an *entry*
//! half and an *exit* half, and `NodeKey` carries which half is meant, so no
//! id arithmetic is needed to tell them apart.

use std::fmt;

/// User-assigned identifier of a network node. Strictly positive.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Debug,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub i32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of a node inside a per-pair subgraph.
///
/// Splitting a candidate station `u` produces the entry key `(u, exit=false)`
/// and the auxiliary exit key `(u, exit=true)`, connected by a single
/// zero-weight arc. Unsplit nodes only ever appear as entry keys.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeKey {
    pub id: NodeId,
    pub exit: bool,
}

impl NodeKey {
    /// Entry half (or the whole node when it is not split).
    #[inline]
    pub fn entry(id: NodeId) -> NodeKey {
        NodeKey { id, exit: false }
    }

    /// Auxiliary exit half of a split candidate.
    #[inline]
    pub fn exit(id: NodeId) -> NodeKey {
        NodeKey { id, exit: true }
    }

    /// `true` for the auxiliary exit half.
    #[inline]
    pub fn is_auxiliary(self) -> bool {
        self.exit
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exit {
            write!(f, "{}'", self.id)
        } else {
            write!(f, "{}", self.id)
        }
    }
}
