//! # Dispatcher
//!
//! Fan-out of encoded records to sinks.
//!
//! Responsibilities:
//! - Hand every record to every active sink, in stream order
//! - Run each sink behind its own bounded queue and worker task
//! - Isolate failing sinks; degrade them after repeated failures
//! - Close sinks once, in reverse order, and report what each wrote

pub mod error;
pub mod handle;
pub mod manager;
pub mod metrics;
pub mod sinks;

pub use contracts::{DataSink, EncodedRecord};
pub use error::DispatcherError;
pub use handle::{SinkHandle, SinkReport};
pub use manager::{DispatcherConfig, SinkManager};
pub use self::metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{ConsoleSink, FileSink, MemoryProbe, MemorySink};
