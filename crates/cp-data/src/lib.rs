//! `cp-data` — input model and preprocessing for the chargeplan tool.
//!
//! # What lives here
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`tables`] | `Node`/`Nodes`, `Arc`, `OdPair` — the in-memory tables    |
//! | [`lookup`] | `TimeDistMap` — dense `(tail, head) → (time, distance)`   |
//! | [`load`]   | CSV/JSON readers with schema validation                   |
//! | [`prep`]   | Arc, node and OD-pair preprocessing                       |
//! | [`error`]  | `DataError`, `DataResult`                                 |

pub mod error;
pub mod load;
pub mod lookup;
pub mod prep;
pub mod tables;


pub use error::{DataError, DataResult};
pub use load::{Inputs, load_inputs};
pub use lookup::TimeDistMap;
pub use tables::{Arc, Node, Nodes, OdPair};
