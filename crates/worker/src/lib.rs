//! Runtime wiring for the Garage push worker: configuration and logging.

pub mod config;
pub mod telemetry;

pub use config::{LogFormat, WorkerConfig};
