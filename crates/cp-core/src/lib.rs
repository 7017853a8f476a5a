//! `cp-core` — foundational types for the chargeplan placement tool.
//!
//! This crate is a dependency of every other `cp-*` crate. It intentionally
//! has no `cp-*` dependencies and minimal external ones (only `thiserror`
//! and `serde`).
//!
//! # What lives here
//!
//! | Module        | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | [`ids`]       | `NodeId`, `NodeKey` (split-half graph key)            |
//! | [`node_type`] | `NodeType` enum (`Site` / `Station`)                  |
//! | [`transit`]   | `TransitTime` — road time ↔ full time with breaks     |
//! | [`battery`]   | 3-piece charge curve, `charge_time` / `recharge_time` |
//! | [`params`]    | `InputParameters` (JSON) and derived [`Parameters`]   |
//! | [`error`]     | `CoreError`, `CoreResult`                             |

pub mod battery;
pub mod error;
pub mod ids;
pub mod node_type;
pub mod params;
pub mod transit;


// ── Numeric tolerances ────────────────────────────────────────────────────────

/// General floating-point comparison tolerance.
pub const EPS: f64 = 1e-8;

/// Integrality tolerance for solver variable values.
pub const EPS_INT: f64 = 1e-6;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{NodeId, NodeKey};
pub use node_type::NodeType;
pub use params::{InputParameters, Parameters};
pub use transit::TransitTime;
