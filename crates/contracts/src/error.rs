//! Layered error definitions
//!
//! Categorized by source: config / device / encode / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Device Errors =====
    /// Hardware not present, platform mismatch or missing permissions
    #[error("tracker device unavailable: {message}")]
    DeviceUnavailable { message: String },

    /// Driver present but initialization failed
    #[error("tracker driver '{driver}' failed to initialize: {message}")]
    DriverInit { driver: String, message: String },

    /// A single read failed (disconnect, transient I/O fault)
    #[error("tracker read fault: {message}")]
    ReadFault { message: String },

    // ===== Encode Errors =====
    /// Sample could not be encoded
    #[error("encode error ({format}): {message}")]
    Encode { format: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Write attempted after close
    #[error("sink '{sink_name}' is closed")]
    SinkClosed { sink_name: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create device unavailable error
    pub fn device_unavailable(message: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            message: message.into(),
        }
    }

    /// Create driver initialization error
    pub fn driver_init(driver: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DriverInit {
            driver: driver.into(),
            message: message.into(),
        }
    }

    /// Create read fault
    pub fn read_fault(message: impl Into<String>) -> Self {
        Self::ReadFault {
            message: message.into(),
        }
    }

    /// Create encode error
    pub fn encode(format: impl ToString, message: impl Into<String>) -> Self {
        Self::Encode {
            format: format.to_string(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create sink closed error
    pub fn sink_closed(sink_name: impl Into<String>) -> Self {
        Self::SinkClosed {
            sink_name: sink_name.into(),
        }
    }

    /// Whether this error means the device cannot be connected at all
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::DeviceUnavailable { .. } | Self::DriverInit { .. })
    }
}
