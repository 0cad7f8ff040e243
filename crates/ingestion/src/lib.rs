//! # Ingestion
//!
//! Turns raw tracker snapshots into canonical samples.
//!
//! Responsibilities:
//! - Keep only sensors that were attached at connect time
//! - Order readings by the attached set, not by driver map order
//! - Convert the raw 7-tuple into a typed `PoseReading`
//! - Count partial samples and stray readings
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::Normalizer;
//!
//! let attached = adapter.connect()?;
//! let normalizer = Normalizer::new(attached);
//! if let Some(snapshot) = adapter.read_snapshot() {
//!     let sample = normalizer.normalize(&snapshot);
//! }
//! ```

mod normalize;
mod stats;

pub use contracts::{AttachedSensors, Sample, Snapshot};
pub use stats::{NormalizeMetrics, NormalizeStats};
pub use normalize::{normalize, Normalizer};
