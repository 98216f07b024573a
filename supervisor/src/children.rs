//! Tracked child processes and the shutdown cascade

use std::fmt;
use std::io;

/// Which of the two supervised processes a child is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildRole {
    Proxy,
    AppServer,
}

impl fmt::Display for ChildRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildRole::Proxy => write!(f, "reverse proxy"),
            ChildRole::AppServer => write!(f, "application server"),
        }
    }
}

/// Process id of a spawned child. The OS owns the process; this is only a name for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildPid(libc::pid_t);

impl ChildPid {
    pub fn from_raw(pid: libc::pid_t) -> Self {
        Self(pid)
    }

    pub fn as_raw(&self) -> libc::pid_t {
        self.0
    }
}

impl From<u32> for ChildPid {
    fn from(pid: u32) -> Self {
        Self(pid as libc::pid_t)
    }
}

impl fmt::Display for ChildPid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deliver `signal` to `pid`.
pub fn send_signal(pid: ChildPid, signal: libc::c_int) -> io::Result<()> {
    // 0 and negative pids address process groups.
    if pid.as_raw() <= 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("refusing to signal pid {}", pid),
        ));
    }
    // SAFETY: kill(2) has no memory-safety preconditions.
    if unsafe { libc::kill(pid.as_raw(), signal) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

pub fn signal_name(signal: libc::c_int) -> String {
    match signal {
        libc::SIGTERM => "SIGTERM".to_string(),
        libc::SIGQUIT => "SIGQUIT".to_string(),
        libc::SIGINT => "SIGINT".to_string(),
        libc::SIGKILL => "SIGKILL".to_string(),
        other => format!("signal {}", other),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedChild {
    pub role: ChildRole,
    pub pid: ChildPid,
    /// Signal that asks this child to stop
    pub stop_signal: libc::c_int,
}

/// The two processes one supervisor owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSet {
    proxy: TrackedChild,
    app_server: TrackedChild,
}

impl ChildSet {
    pub fn new(proxy: TrackedChild, app_server: TrackedChild) -> Self {
        Self { proxy, app_server }
    }

    pub fn proxy(&self) -> &TrackedChild {
        &self.proxy
    }

    pub fn app_server(&self) -> &TrackedChild {
        &self.app_server
    }

    pub fn tracked(&self) -> [TrackedChild; 2] {
        [self.proxy, self.app_server]
    }

    /// Ask both children to stop: the proxy first, then the application server.
    ///
    /// Safe to call any number of times. A child that is already gone cannot
    /// receive the signal, which is the outcome we wanted anyway.
    pub fn shutdown(&self) {
        for child in self.tracked() {
            match send_signal(child.pid, child.stop_signal) {
                Ok(()) => tracing::info!(
                    "Sent {} to {} (pid {})",
                    signal_name(child.stop_signal),
                    child.role,
                    child.pid
                ),
                Err(e) => tracing::debug!(
                    "{} (pid {}) not signalled, already gone: {}",
                    child.role,
                    child.pid,
                    e
                ),
            }
        }
    }
}
