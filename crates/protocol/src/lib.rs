//! Wire types for the teleop access broker.
//!
//! This crate contains the serde-serializable types exchanged between the
//! broker HTTP API, its CLI client, and paying frontends. Types here are
//! pure data: no behavior beyond serialization, header codecs, and small
//! display helpers. The engine that produces them lives in `teleop-core`.

pub mod payment;
pub mod types;

pub use payment::*;
pub use types::*;
