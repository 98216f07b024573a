use anyhow::{Context, Result};
use byoserve_core::{termination_signal, LoggingConfig, ServerConfig};
use byoserve_supervisor::{LaunchPlan, Supervisor};
use clap::Args;
use std::path::PathBuf;

use super::paths::PathArgs;

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Reverse proxy executable
    #[arg(long, value_name = "PROGRAM", default_value = byoserve_supervisor::plan::PROXY_PROGRAM)]
    pub proxy_program: PathBuf,
}

pub fn execute(args: ServeArgs) -> Result<()> {
    let config = ServerConfig::from_env()?;
    let paths = args.paths.resolve(config.paths.clone());
    let config = config.with_paths(paths);

    LoggingConfig::render_template(&config.paths.log_config, config.log_level)?.init()?;

    tracing::info!("Starting the inference server with {} workers.", config.workers);
    tracing::info!(
        "Worker class: {}, threads per worker: {} ({} total), timeout: {:?}",
        config.worker_class,
        config.threads_per_worker,
        config.inference_threads(),
        config.timeout()
    );
    tracing::debug!("Resolved configuration: {:?}", config);

    let app_server = std::env::current_exe().context("Failed to locate the byoserve executable")?;
    let plan = LaunchPlan::from_config(&config, args.proxy_program, app_server);

    // Everything here is waiting on signals; one thread is plenty.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the supervisor runtime")?;

    let cause = runtime.block_on(Supervisor::new(plan).run(termination_signal()))?;
    tracing::info!("Inference server exiting ({})", cause);

    Ok(())
}
