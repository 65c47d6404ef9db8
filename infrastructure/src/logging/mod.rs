//! Logging sinks and tracing setup.

pub mod event_log;
pub mod tracing_init;

pub use event_log::JsonlEventLog;
pub use tracing_init::init_tracing;
