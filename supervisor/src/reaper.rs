//! Waiting for child processes
//!
//! `waitpid(-1)` reaps any child of this process, including orphaned
//! descendants reparented to us when we run as the container's init. Only the
//! tracked children end the wait; everything else is reaped and logged.

use std::io;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use tokio::signal::unix::{signal, SignalKind};

use crate::children::{ChildPid, TrackedChild};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaped {
    /// One of the tracked children exited.
    Tracked {
        child: TrackedChild,
        status: ExitStatus,
    },
    /// Nothing left to wait for.
    NoChildren,
}

/// Reap every child that has already exited, stopping at the first tracked one.
/// `Ok(None)` means the remaining children are all still running.
pub fn reap_exited(tracked: &[TrackedChild]) -> io::Result<Option<Reaped>> {
    loop {
        let mut raw_status: libc::c_int = 0;
        // SAFETY: waitpid(2) writes only to the status int we pass in.
        let pid = unsafe { libc::waitpid(-1, &mut raw_status, libc::WNOHANG) };

        match pid {
            0 => return Ok(None),
            -1 => {
                let err = io::Error::last_os_error();
                match err.raw_os_error() {
                    Some(libc::EINTR) => continue,
                    Some(libc::ECHILD) => return Ok(Some(Reaped::NoChildren)),
                    _ => return Err(err),
                }
            }
            pid => {
                let pid = ChildPid::from_raw(pid);
                let status = ExitStatus::from_raw(raw_status);
                if let Some(child) = tracked.iter().find(|child| child.pid == pid) {
                    return Ok(Some(Reaped::Tracked {
                        child: *child,
                        status,
                    }));
                }
                tracing::debug!("Reaped untracked process {} ({})", pid, status);
            }
        }
    }
}

/// Wait until one of `tracked` exits. No timeout.
///
/// Woken by `SIGCHLD`; the handler is installed before the first check so an
/// exit that races startup is not missed. Dropping the future stops waiting.
pub async fn wait_for_tracked(tracked: &[TrackedChild]) -> io::Result<Reaped> {
    let mut sigchld = signal(SignalKind::child())?;

    loop {
        if let Some(reaped) = reap_exited(tracked)? {
            return Ok(reaped);
        }
        if sigchld.recv().await.is_none() {
            return Err(io::Error::other("SIGCHLD stream closed"));
        }
    }
}
