//! Process-level wiring shared by the lambdas: configuration, logging and
//! the AWS-backed store implementations.

pub mod attributes;
pub mod config;
pub mod dynamo;
pub mod logging;
pub mod s3;
mod state;

pub use config::{AppConfig, ConfigError, LogFormat};
pub use state::AppState;
