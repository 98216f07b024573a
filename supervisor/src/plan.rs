//! What the supervisor starts, and with which arguments

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::Command;

use byoserve_core::ServerConfig;

use crate::children::{ChildPid, ChildRole, TrackedChild};
use crate::error::SupervisorError;
use crate::links::LogLink;

pub const PROXY_PROGRAM: &str = "nginx";
/// Subcommand of our own binary that runs the application server.
pub const APP_SERVER_SUBCOMMAND: &str = "app-server";

/// A process to launch and the signal that stops it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSpec {
    pub role: ChildRole,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub stop_signal: libc::c_int,
}

impl ChildSpec {
    pub fn new(role: ChildRole, program: impl Into<PathBuf>, stop_signal: libc::c_int) -> Self {
        Self {
            role,
            program: program.into(),
            args: Vec::new(),
            stop_signal,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add `--name value`.
    pub fn flag(self, name: &str, value: impl AsRef<OsStr>) -> Self {
        self.arg(name).arg(value)
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    /// Start the process. It inherits our stdin, stdout and stderr.
    pub fn spawn(&self) -> Result<TrackedChild, SupervisorError> {
        let child = self
            .command()
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                role: self.role,
                program: self.program.display().to_string(),
                source,
            })?;

        let pid = ChildPid::from(child.id());
        tracing::info!("Started {} (pid {}): {:?}", self.role, pid, self.command());

        Ok(TrackedChild {
            role: self.role,
            pid,
            stop_signal: self.stop_signal,
        })
    }
}

/// Everything the supervisor does at startup, resolved ahead of time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub log_links: Vec<LogLink>,
    pub proxy: ChildSpec,
    pub app_server: ChildSpec,
}

impl LaunchPlan {
    /// The standard plan: nginx-style proxy stopped with `SIGQUIT` (graceful),
    /// application server stopped with `SIGTERM`, proxy logs on stdout/stderr.
    pub fn from_config(
        config: &ServerConfig,
        proxy_program: impl Into<PathBuf>,
        app_server_program: impl Into<PathBuf>,
    ) -> Self {
        let paths = &config.paths;

        let proxy = ChildSpec::new(ChildRole::Proxy, proxy_program, libc::SIGQUIT)
            .flag("-c", &paths.proxy_config);

        let app_server = ChildSpec::new(ChildRole::AppServer, app_server_program, libc::SIGTERM)
            .arg(APP_SERVER_SUBCOMMAND)
            .flag("--bind", config.bind_addr().to_string())
            .flag("--timeout", config.timeout_secs.to_string())
            .flag("--worker-class", config.worker_class.as_str())
            .flag("--workers", config.workers.to_string())
            .flag("--threads", config.threads_per_worker.to_string())
            .flag("--log-config", &paths.log_config)
            .flag("--log-level", config.log_level.as_str())
            .flag("--model", &paths.model)
            .arg("--preload");

        Self {
            log_links: vec![
                LogLink::stdout(&paths.access_log),
                LogLink::stderr(&paths.error_log),
            ],
            proxy,
            app_server,
        }
    }
}
