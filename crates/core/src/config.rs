use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::bind::BindAddr;
use crate::level::LogLevel;

pub const ENV_TIMEOUT: &str = "MODEL_SERVER_TIMEOUT";
pub const ENV_WORKERS: &str = "MODEL_SERVER_WORKERS";
pub const ENV_THREADS_PER_WORKER: &str = "MODEL_SERVER_THREADS_PER_WORKERS";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_MODEL_PATH: &str = "MODEL_PATH";

pub const DEFAULT_PROXY_CONFIG: &str = "/opt/program/config/nginx.conf";
pub const DEFAULT_LOG_CONFIG: &str = "/opt/program/config/logging.toml";
pub const DEFAULT_SOCKET: &str = "/tmp/model-server.sock";
pub const DEFAULT_ACCESS_LOG: &str = "/var/log/nginx/access.log";
pub const DEFAULT_ERROR_LOG: &str = "/var/log/nginx/error.log";
pub const DEFAULT_MODEL_PATH: &str = "/opt/ml/model";

/// Resolved settings for one container lifetime.
///
/// Built once at startup and handed to whoever needs it; nothing reads the
/// environment after that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Per-request timeout enforced by the application server
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Worker count (defaults to the number of CPUs)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Threads each worker uses for inference calls
    #[serde(default = "default_threads_per_worker")]
    pub threads_per_worker: usize,

    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub worker_class: WorkerClass,

    #[serde(default)]
    pub paths: ServerPaths,
}

/// Filesystem locations the supervisor and the application server agree on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerPaths {
    /// Reverse proxy configuration file
    #[serde(default = "default_proxy_config")]
    pub proxy_config: PathBuf,

    /// Logging configuration template, rewritten in place at startup
    #[serde(default = "default_log_config")]
    pub log_config: PathBuf,

    /// Socket the proxy forwards requests to
    #[serde(default = "default_socket")]
    pub socket: PathBuf,

    #[serde(default = "default_access_log")]
    pub access_log: PathBuf,

    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,

    /// Model file, or a directory holding `entities.json`
    #[serde(default = "default_model_path")]
    pub model: PathBuf,
}

/// How the application server runs requests. Only a threaded model exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerClass {
    #[default]
    Threaded,
}

impl WorkerClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerClass::Threaded => "threaded",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown worker class '{0}' (expected 'threaded')")]
pub struct UnknownWorkerClass(pub String);

impl std::str::FromStr for WorkerClass {
    type Err = UnknownWorkerClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "threaded" | "gthread" => Ok(WorkerClass::Threaded),
            _ => Err(UnknownWorkerClass(s.to_string())),
        }
    }
}

impl std::fmt::Display for WorkerClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name}: {source}")]
    InvalidLogLevel {
        name: &'static str,
        source: crate::level::UnknownLogLevel,
    },
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

fn default_threads_per_worker() -> usize {
    2
}

fn default_proxy_config() -> PathBuf {
    PathBuf::from(DEFAULT_PROXY_CONFIG)
}

fn default_log_config() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_CONFIG)
}

fn default_socket() -> PathBuf {
    PathBuf::from(DEFAULT_SOCKET)
}

fn default_access_log() -> PathBuf {
    PathBuf::from(DEFAULT_ACCESS_LOG)
}

fn default_error_log() -> PathBuf {
    PathBuf::from(DEFAULT_ERROR_LOG)
}

fn default_model_path() -> PathBuf {
    PathBuf::from(DEFAULT_MODEL_PATH)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            workers: default_workers(),
            threads_per_worker: default_threads_per_worker(),
            log_level: LogLevel::default(),
            worker_class: WorkerClass::default(),
            paths: ServerPaths::default(),
        }
    }
}

impl Default for ServerPaths {
    fn default() -> Self {
        Self {
            proxy_config: default_proxy_config(),
            log_config: default_log_config(),
            socket: default_socket(),
            access_log: default_access_log(),
            error_log: default_error_log(),
            model: default_model_path(),
        }
    }
}

impl ServerConfig {
    /// Resolve the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the configuration through `lookup`, falling back to defaults
    /// for every unset variable. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = ServerConfig::default();

        if let Some(value) = get(ENV_TIMEOUT) {
            config.timeout_secs = parse_positive(ENV_TIMEOUT, &value)? as u64;
        }
        if let Some(value) = get(ENV_WORKERS) {
            config.workers = parse_positive(ENV_WORKERS, &value)?;
        }
        if let Some(value) = get(ENV_THREADS_PER_WORKER) {
            config.threads_per_worker = parse_positive(ENV_THREADS_PER_WORKER, &value)?;
        }
        if let Some(value) = get(ENV_LOG_LEVEL) {
            config.log_level = value
                .parse()
                .map_err(|source| ConfigError::InvalidLogLevel {
                    name: ENV_LOG_LEVEL,
                    source,
                })?;
        }
        if let Some(value) = get(ENV_MODEL_PATH) {
            config.paths.model = PathBuf::from(value);
        }

        Ok(config)
    }

    /// Replace the filesystem locations, keeping every tunable.
    pub fn with_paths(mut self, paths: ServerPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Address the application server binds and the proxy forwards to.
    pub fn bind_addr(&self) -> BindAddr {
        BindAddr::Unix(self.paths.socket.clone())
    }

    /// Total inference threads across all workers.
    pub fn inference_threads(&self) -> usize {
        self.workers * self.threads_per_worker
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.threads_per_worker, 2);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.worker_class, WorkerClass::Threaded);
        assert_eq!(config.workers, default_workers());
        assert!(config.workers >= 1);
        assert_eq!(config.paths, ServerPaths::default());
    }

    #[test]
    fn parses_worker_class() {
        assert_eq!("threaded".parse::<WorkerClass>().unwrap(), WorkerClass::Threaded);
        assert_eq!("gthread".parse::<WorkerClass>().unwrap(), WorkerClass::Threaded);
        assert!("sync".parse::<WorkerClass>().is_err());
    }

    #[test]
    fn reads_every_variable() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            (ENV_TIMEOUT, "120"),
            (ENV_WORKERS, "3"),
            (ENV_THREADS_PER_WORKER, "8"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_MODEL_PATH, "/models/ner"),
        ]))
        .unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.workers, 3);
        assert_eq!(config.threads_per_worker, 8);
        assert_eq!(config.inference_threads(), 24);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.paths.model, PathBuf::from("/models/ner"));
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config =
            ServerConfig::from_lookup(lookup_from(&[(ENV_TIMEOUT, ""), (ENV_LOG_LEVEL, " ")]))
                .unwrap();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn rejects_bad_numbers() {
        for bad in ["0", "-1", "sixty", "1.5"] {
            let err = ServerConfig::from_lookup(lookup_from(&[(ENV_WORKERS, bad)])).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidNumber { name: ENV_WORKERS, .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_unknown_log_level() {
        let err = ServerConfig::from_lookup(lookup_from(&[(ENV_LOG_LEVEL, "loud")])).unwrap_err();
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn bind_addr_uses_socket_path() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr().to_string(), "unix:/tmp/model-server.sock");
    }

    #[test]
    fn renders_as_toml() {
        let rendered = ServerConfig::default().to_toml().unwrap();
        assert!(rendered.contains("timeout_secs = 60"));
        assert!(rendered.contains("log_level = \"INFO\""));
        assert!(rendered.contains("[paths]"));
    }
}
