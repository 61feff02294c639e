//! Shared types, errors and configuration for perflog.

pub mod config;
pub mod error;
pub mod types;
pub mod workload;

pub use error::{PerflogError, Result};
pub use types::Scenario;
