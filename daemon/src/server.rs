use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::Router;
use byoserve_core::BindAddr;
use std::future::Future;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::AppState;

pub use byoserve_core::termination_signal as shutdown_signal;

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub bind: BindAddr,
    /// Per-request timeout
    pub timeout: Duration,
    pub model_path: PathBuf,
    /// Load the model before accepting connections
    pub preload: bool,
}

/// The router with request tracing and the per-request timeout applied.
pub fn app(state: Arc<AppState>, timeout: Duration) -> Router {
    api::routes(state)
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(TraceLayer::new_for_http())
}

/// Serve until `shutdown` resolves.
///
/// With `preload` a model that fails to load aborts startup before anything
/// is bound. Without it the model loads in the background and `/ping` reports
/// 503 until it is ready.
pub async fn run_server<F>(options: ServerOptions, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if options.preload {
        state
            .load_model(&options.model_path)
            .await
            .with_context(|| format!("Failed to preload model from {}", options.model_path.display()))?;
    } else {
        let background = state.clone();
        let model_path = options.model_path.clone();
        tokio::spawn(async move {
            if let Err(e) = background.load_model(&model_path).await {
                tracing::error!("Failed to load model from {:?}: {:#}", model_path, e);
            }
        });
    }

    let app = app(state, options.timeout);

    match &options.bind {
        BindAddr::Tcp(addr) => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            tracing::info!("Listening on {}", options.bind);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await?;
        }
        BindAddr::Unix(path) => {
            remove_stale_socket(path)?;
            let listener = tokio::net::UnixListener::bind(path)
                .with_context(|| format!("Failed to bind {}", path.display()))?;
            tracing::info!("Listening on {}", options.bind);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await?;
            let _ = std::fs::remove_file(path);
        }
    }

    tracing::info!("Application server stopped");
    Ok(())
}

/// A socket left behind by a previous run blocks `bind`. Anything that is not
/// a socket is left alone.
fn remove_stale_socket(path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_socket() => {
            tracing::debug!("Removing stale socket {:?}", path);
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to remove stale socket {}", path.display()))
        }
        Ok(_) => anyhow::bail!("{} exists and is not a socket", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to inspect {}", path.display())),
    }
}
