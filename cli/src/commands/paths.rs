use std::path::PathBuf;

use byoserve_core::ServerPaths;
use clap::Args;

/// Filesystem overrides shared by `serve` and `config`.
#[derive(Debug, Clone, Default, Args)]
pub struct PathArgs {
    /// Reverse proxy configuration file
    #[arg(long, value_name = "PATH")]
    pub proxy_config: Option<PathBuf>,

    /// Logging configuration template
    #[arg(long, value_name = "PATH")]
    pub log_config: Option<PathBuf>,

    /// Unix socket between the proxy and the application server
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Proxy access log, linked to stdout
    #[arg(long, value_name = "PATH")]
    pub access_log: Option<PathBuf>,

    /// Proxy error log, linked to stderr
    #[arg(long, value_name = "PATH")]
    pub error_log: Option<PathBuf>,

    /// Model file or directory (overrides MODEL_PATH)
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,
}

impl PathArgs {
    /// Apply the flags that were given on top of `base`.
    pub fn resolve(self, base: ServerPaths) -> ServerPaths {
        ServerPaths {
            proxy_config: self.proxy_config.unwrap_or(base.proxy_config),
            log_config: self.log_config.unwrap_or(base.log_config),
            socket: self.socket.unwrap_or(base.socket),
            access_log: self.access_log.unwrap_or(base.access_log),
            error_log: self.error_log.unwrap_or(base.error_log),
            model: self.model.unwrap_or(base.model),
        }
    }
}
