//! # Acquisition
//!
//! The streaming loop and its lifecycle.
//!
//! Responsibilities:
//! - Connect the source, open sinks, write the format header
//! - Poll, normalize, encode and fan out until told to stop
//! - Stop on interrupt, source failure, exhaustion or run limits
//! - Shut down in order: sinks first, then the device
//!
//! ## Usage Example
//!
//! ```ignore
//! use acquisition::Controller;
//!
//! let driver = tracker::driver_from_config(&config.source);
//! let mut controller = Controller::new(driver, config).with_standard_sinks();
//! let report = controller.run(tokio::signal::ctrl_c()).await?;
//! println!("{} samples", report.samples);
//! ```

mod controller;
mod error;
mod report;
mod session;
mod state;

pub use controller::Controller;
pub use error::{AcquisitionError, Result};
pub use report::StreamReport;
pub use session::StreamSession;
pub use state::{ShutdownReason, StreamState};
