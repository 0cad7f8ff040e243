//! DataSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for Sinks.

use crate::{ContractError, EncodedRecord};

/// Data output trait
///
/// All sink implementations must implement this trait. A sink receives
/// records strictly in stream order from a single worker task.
#[trait_variant::make(DataSink: Send)]
pub trait LocalDataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Where the data ends up ("stdout", a file path, ...)
    fn destination(&self) -> String;

    /// Write one encoded record
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, record: &EncodedRecord) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    ///
    /// Must be idempotent: closing an already closed sink is Ok.
    async fn close(&mut self) -> Result<(), ContractError>;
}
