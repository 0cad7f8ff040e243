//! Command implementations.

mod run;
mod sensors;
mod validate;

pub use run::run_stream;
pub use sensors::run_sensors;
pub use validate::run_validate;
