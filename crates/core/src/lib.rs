//! byoserve_core - Core library shared by the supervisor and the application server
//!
//! This crate provides:
//! - Server configuration resolved once from the environment
//! - Bind addresses and log levels as typed values
//! - Logging configuration templates and tracing setup
//! - The termination signal both long-running processes stop on

pub mod bind;
pub mod config;
pub mod level;
pub mod logging;
pub mod signal;

pub use bind::BindAddr;
pub use config::{ConfigError, ServerConfig, ServerPaths, UnknownWorkerClass, WorkerClass};
pub use level::LogLevel;
pub use logging::{LogFormat, LoggingConfig};
pub use signal::termination_signal;
