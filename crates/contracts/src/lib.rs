//! # Contracts
//!
//! Shared interface contracts for the pose streamer. Every other crate in the
//! workspace depends on this one; it depends on none of them.
//!
//! ## Time Model
//! - Timestamps come from the tracker driver and are never re-based
//! - Integer device ticks and floating point times are both carried verbatim

mod config;
mod error;
mod pose;
mod record;
mod sensor_id;
mod sink;
mod tracker;

pub use config::*;
pub use error::*;
pub use pose::*;
pub use record::*;
pub use sensor_id::SensorId;
pub use sink::*;
pub use tracker::TrackerDriver;
