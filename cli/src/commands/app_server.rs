use anyhow::{Context, Result};
use byoserve_core::{BindAddr, LogLevel, LoggingConfig, ServerConfig, WorkerClass};
use byoserve_daemon::{run_server, shutdown_signal, AppState, ServerOptions};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Args)]
pub struct AppServerArgs {
    /// `unix:/path/to.sock` or `host:port` (default: the model server socket)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<BindAddr>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 60, value_parser = positive_u64)]
    pub timeout: u64,

    #[arg(long, value_name = "CLASS", default_value = "threaded")]
    pub worker_class: WorkerClass,

    /// Async worker threads (default: number of CPUs)
    #[arg(long, value_name = "N", value_parser = positive_usize)]
    pub workers: Option<usize>,

    /// Inference threads per worker
    #[arg(long, value_name = "N", default_value_t = 2, value_parser = positive_usize)]
    pub threads: usize,

    /// Logging config file (TOML); the level below still applies
    #[arg(long, value_name = "PATH")]
    pub log_config: Option<PathBuf>,

    #[arg(long, value_name = "LEVEL", default_value = "INFO")]
    pub log_level: LogLevel,

    /// Model file or directory containing entities.json
    #[arg(long, value_name = "PATH", default_value = byoserve_core::config::DEFAULT_MODEL_PATH)]
    pub model: PathBuf,

    /// Load the model before accepting connections
    #[arg(long)]
    pub preload: bool,
}

fn positive_usize(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("expected a positive integer, got '{}'", s)),
    }
}

fn positive_u64(s: &str) -> Result<u64, String> {
    positive_usize(s).map(|n| n as u64)
}

impl AppServerArgs {
    pub fn logging(&self) -> Result<LoggingConfig> {
        let mut logging = match &self.log_config {
            Some(path) => LoggingConfig::load(path)?,
            None => LoggingConfig::with_level(self.log_level),
        };
        logging.level = self.log_level;
        Ok(logging)
    }

    pub fn options(&self) -> ServerOptions {
        ServerOptions {
            bind: self
                .bind
                .clone()
                .unwrap_or_else(|| ServerConfig::default().bind_addr()),
            timeout: Duration::from_secs(self.timeout),
            model_path: self.model.clone(),
            preload: self.preload,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers.unwrap_or_else(|| ServerConfig::default().workers)
    }

    /// Size of the blocking pool inference runs on.
    pub fn inference_threads(&self) -> usize {
        self.workers() * self.threads
    }
}

pub fn execute(args: AppServerArgs) -> Result<()> {
    args.logging()?.init()?;

    let workers = args.workers();
    let blocking_threads = args.inference_threads();
    tracing::info!(
        "Application server: {} {} workers, {} inference threads",
        workers,
        args.worker_class,
        blocking_threads
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .max_blocking_threads(blocking_threads)
        .enable_all()
        .build()
        .context("Failed to start the application server runtime")?;

    runtime.block_on(run_server(
        args.options(),
        Arc::new(AppState::new()),
        shutdown_signal(),
    ))
}
