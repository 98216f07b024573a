use std::future::Future;
use std::process::ExitStatus;

use crate::children::{send_signal, ChildPid, ChildRole, ChildSet};
use crate::error::SupervisorError;
use crate::links;
use crate::plan::LaunchPlan;
use crate::reaper::{wait_for_tracked, Reaped};

/// Why the supervisor stopped. Every cause leads to the same shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCause {
    /// The termination trigger fired.
    Terminated,
    /// A supervised process exited on its own.
    ChildExited {
        role: ChildRole,
        pid: ChildPid,
        status: ExitStatus,
    },
    /// `waitpid` reported that no children are left.
    NoChildren,
}

impl std::fmt::Display for ExitCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitCause::Terminated => write!(f, "termination requested"),
            ExitCause::ChildExited { role, pid, status } => {
                write!(f, "{} (pid {}) exited with {}", role, pid, status)
            }
            ExitCause::NoChildren => write!(f, "no child processes left"),
        }
    }
}

pub struct Supervisor {
    plan: LaunchPlan,
}

impl Supervisor {
    pub fn new(plan: LaunchPlan) -> Self {
        Self { plan }
    }

    /// Link the proxy logs, then start the proxy and the application server.
    ///
    /// Log link failures abort before anything is spawned. If the application
    /// server cannot be started the proxy is stopped again.
    pub fn start(&self) -> Result<Running, SupervisorError> {
        links::install_all(&self.plan.log_links)?;

        let proxy = self.plan.proxy.spawn()?;
        let app_server = match self.plan.app_server.spawn() {
            Ok(child) => child,
            Err(e) => {
                let _ = send_signal(proxy.pid, proxy.stop_signal);
                return Err(e);
            }
        };

        Ok(Running {
            children: ChildSet::new(proxy, app_server),
        })
    }

    /// [`start`](Self::start), then [`Running::wait`].
    pub async fn run<F>(&self, terminate: F) -> Result<ExitCause, SupervisorError>
    where
        F: Future<Output = ()>,
    {
        self.start()?.wait(terminate).await
    }
}

/// Both children are up; the supervisor owns them until `wait` returns.
#[derive(Debug)]
pub struct Running {
    children: ChildSet,
}

impl Running {
    pub fn children(&self) -> &ChildSet {
        &self.children
    }

    /// Block until either child exits or `terminate` resolves, then run the
    /// shutdown cascade. Whether a child crashed or exited cleanly makes no
    /// difference.
    pub async fn wait<F>(self, terminate: F) -> Result<ExitCause, SupervisorError>
    where
        F: Future<Output = ()>,
    {
        let tracked = self.children.tracked();

        let result = tokio::select! {
            _ = terminate => Ok(ExitCause::Terminated),
            reaped = wait_for_tracked(&tracked) => match reaped {
                Ok(Reaped::Tracked { child, status }) => Ok(ExitCause::ChildExited {
                    role: child.role,
                    pid: child.pid,
                    status,
                }),
                Ok(Reaped::NoChildren) => Ok(ExitCause::NoChildren),
                Err(e) => Err(SupervisorError::Wait(e)),
            },
        };

        self.children.shutdown();

        match &result {
            Ok(cause) => tracing::info!("Supervisor stopping: {}", cause),
            Err(e) => tracing::error!("Supervisor stopping: {}", e),
        }
        result
    }
}
