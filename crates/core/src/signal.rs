use tokio::signal::unix::{signal, SignalKind};

/// Resolves on the first `SIGTERM` or `SIGINT`.
///
/// The handlers are installed when the future is first polled. If one cannot
/// be installed the error is logged and that signal is never observed.
pub async fn termination_signal() {
    let terminate = wait_for(SignalKind::terminate(), "SIGTERM");
    let interrupt = wait_for(SignalKind::interrupt(), "SIGINT");

    tokio::select! {
        _ = terminate => {}
        _ = interrupt => {}
    }
}

async fn wait_for(kind: SignalKind, name: &'static str) {
    match signal(kind) {
        Ok(mut stream) => {
            stream.recv().await;
            tracing::info!("Received {}", name);
        }
        Err(e) => {
            tracing::error!("Failed to install {} handler: {}", name, e);
            std::future::pending::<()>().await;
        }
    }
}
