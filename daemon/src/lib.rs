//! byoserve_daemon - the application server behind the reverse proxy
//!
//! This crate provides the HTTP server that:
//! - Answers the `/ping` health check
//! - Runs `/invocations` requests against a pre-loaded model
//! - Listens on a Unix socket (or TCP) and shuts down gracefully

pub mod api;
pub mod server;
pub mod state;

pub use server::{run_server, shutdown_signal, ServerOptions};
pub use state::AppState;
