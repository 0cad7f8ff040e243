//! Controller state machine

use std::fmt;

/// Lifecycle: `Idle -> Connected -> Streaming -> ShuttingDown -> Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Connected,
    Streaming,
    ShuttingDown,
    Closed,
}

impl StreamState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connected => "connected",
            Self::Streaming => "streaming",
            Self::ShuttingDown => "shutting_down",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why streaming stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Operator interrupt (Ctrl+C / SIGTERM)
    Interrupted,
    /// Read faults crossed the fault policy
    SourceFailed,
    /// A finite source ran out of data
    SourceExhausted,
    /// `max_samples` reached
    MaxSamples,
    /// `duration` elapsed
    Duration,
}

impl ShutdownReason {
    /// Whether the stop was caused by a fault rather than a request
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::SourceFailed)
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupted => "interrupted",
            Self::SourceFailed => "source failed",
            Self::SourceExhausted => "source exhausted",
            Self::MaxSamples => "sample limit reached",
            Self::Duration => "duration elapsed",
        })
    }
}
