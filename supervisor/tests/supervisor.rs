//! Supervisor scenarios with real child processes.
//!
//! `sh` and `sleep` stand in for the proxy and the application server.
//! `waitpid(-1)` sees every child of the test binary, so the tests in this file
//! take a shared lock and never overlap.

use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use byoserve_supervisor::{
    ChildPid, ChildRole, ChildSpec, ExitCause, LaunchPlan, LogLink, Supervisor, SupervisorError,
};
use tokio::sync::Mutex;

static SERIAL: Mutex<()> = Mutex::const_new(());

const BOUND: Duration = Duration::from_secs(5);

fn shell(role: ChildRole, script: &str, stop_signal: libc::c_int) -> ChildSpec {
    ChildSpec::new(role, "sh", stop_signal).arg("-c").arg(script)
}

fn sleeper(role: ChildRole, stop_signal: libc::c_int) -> ChildSpec {
    ChildSpec::new(role, "sleep", stop_signal).arg("30")
}

fn plan(dir: &Path, proxy: ChildSpec, app_server: ChildSpec) -> LaunchPlan {
    LaunchPlan {
        log_links: vec![
            LogLink::stdout(dir.join("access.log")),
            LogLink::stderr(dir.join("error.log")),
        ],
        proxy,
        app_server,
    }
}

/// Reap `pid` ourselves, waiting up to `BOUND` for it to exit.
fn reap(pid: ChildPid) -> ExitStatus {
    let deadline = Instant::now() + BOUND;
    loop {
        let mut raw = 0;
        let ret = unsafe { libc::waitpid(pid.as_raw(), &mut raw, libc::WNOHANG) };
        if ret == pid.as_raw() {
            return ExitStatus::from_raw(raw);
        }
        assert_eq!(
            ret,
            0,
            "waitpid({pid}) failed: {}",
            std::io::Error::last_os_error()
        );
        assert!(Instant::now() < deadline, "pid {pid} is still running");
        std::thread::sleep(Duration::from_millis(10));
    }
}

async fn bounded<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::time::timeout(BOUND, future)
        .await
        .expect("supervisor did not return in time")
}

#[tokio::test]
async fn proxy_exit_stops_app_server() {
    let _serial = SERIAL.lock().await;
    let dir = tempfile::tempdir().unwrap();
    let supervisor = Supervisor::new(plan(
        dir.path(),
        shell(ChildRole::Proxy, "exit 3", libc::SIGQUIT),
        sleeper(ChildRole::AppServer, libc::SIGTERM),
    ));

    let running = supervisor.start().unwrap();
    let children = running.children().clone();
    let cause = bounded(running.wait(std::future::pending::<()>()))
        .await
        .unwrap();

    match cause {
        ExitCause::ChildExited { role, pid, status } => {
            assert_eq!(role, ChildRole::Proxy);
            assert_eq!(pid, children.proxy().pid);
            assert_eq!(status.code(), Some(3));
        }
        other => panic!("unexpected exit cause: {other}"),
    }

    let app_status = reap(children.app_server().pid);
    assert_eq!(app_status.signal(), Some(libc::SIGTERM));
}

#[tokio::test]
async fn app_server_exit_stops_proxy() {
    let _serial = SERIAL.lock().await;
    let dir = tempfile::tempdir().unwrap();
    let supervisor = Supervisor::new(plan(
        dir.path(),
        sleeper(ChildRole::Proxy, libc::SIGQUIT),
        shell(ChildRole::AppServer, "sleep 0.2; exit 0", libc::SIGTERM),
    ));

    let running = supervisor.start().unwrap();
    let children = running.children().clone();
    let cause = bounded(running.wait(std::future::pending::<()>()))
        .await
        .unwrap();

    assert!(
        matches!(
            cause,
            ExitCause::ChildExited {
                role: ChildRole::AppServer,
                ..
            }
        ),
        "{cause}"
    );

    let proxy_status = reap(children.proxy().pid);
    assert_eq!(proxy_status.signal(), Some(libc::SIGQUIT));
}

#[tokio::test]
async fn both_children_exiting_together_is_a_clean_stop() {
    let _serial = SERIAL.lock().await;
    let dir = tempfile::tempdir().unwrap();
    let supervisor = Supervisor::new(plan(
        dir.path(),
        shell(ChildRole::Proxy, "exit 0", libc::SIGQUIT),
        shell(ChildRole::AppServer, "exit 1", libc::SIGTERM),
    ));

    let running = supervisor.start().unwrap();
    let children = running.children().clone();
    let cause = bounded(running.wait(std::future::pending::<()>()))
        .await
        .unwrap();

    let survivor = match cause {
        ExitCause::ChildExited { role, .. } if role == ChildRole::Proxy => children.app_server().pid,
        ExitCause::ChildExited { .. } => children.proxy().pid,
        other => panic!("unexpected exit cause: {other}"),
    };
    // Exited on its own or from the cascade; either way it is gone.
    reap(survivor);
}

#[tokio::test]
async fn termination_request_stops_both_children() {
    let _serial = SERIAL.lock().await;
    let dir = tempfile::tempdir().unwrap();
    let supervisor = Supervisor::new(plan(
        dir.path(),
        sleeper(ChildRole::Proxy, libc::SIGQUIT),
        sleeper(ChildRole::AppServer, libc::SIGTERM),
    ));

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = supervisor.start().unwrap();
    let children = running.children().clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = stop_tx.send(());
    });
    let cause = bounded(running.wait(async {
        let _ = stop_rx.await;
    }))
    .await
    .unwrap();

    assert_eq!(cause, ExitCause::Terminated);
    assert_eq!(reap(children.proxy().pid).signal(), Some(libc::SIGQUIT));
    assert_eq!(reap(children.app_server().pid).signal(), Some(libc::SIGTERM));
}

#[tokio::test]
async fn run_links_proxy_logs() {
    let _serial = SERIAL.lock().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("access.log"), "stale").unwrap();
    let supervisor = Supervisor::new(plan(
        dir.path(),
        shell(ChildRole::Proxy, "exit 0", libc::SIGQUIT),
        shell(ChildRole::AppServer, "exit 0", libc::SIGTERM),
    ));

    let cause = bounded(supervisor.run(std::future::pending::<()>()))
        .await
        .unwrap();
    assert!(matches!(cause, ExitCause::ChildExited { .. }), "{cause}");

    assert_eq!(
        std::fs::read_link(dir.path().join("access.log")).unwrap(),
        Path::new("/dev/stdout")
    );
    assert_eq!(
        std::fs::read_link(dir.path().join("error.log")).unwrap(),
        Path::new("/dev/stderr")
    );

    // The second child is left as a zombie; reap it so later tests start clean.
    let mut raw = 0;
    let deadline = Instant::now() + BOUND;
    while unsafe { libc::waitpid(-1, &mut raw, libc::WNOHANG) } == 0 {
        assert!(Instant::now() < deadline, "second child never exited");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[tokio::test]
async fn log_link_failure_starts_nothing() {
    let _serial = SERIAL.lock().await;
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("started");
    let script = format!("touch {}", marker.display());

    let supervisor = Supervisor::new(plan(
        &dir.path().join("missing"),
        shell(ChildRole::Proxy, &script, libc::SIGQUIT),
        shell(ChildRole::AppServer, &script, libc::SIGTERM),
    ));

    let err = supervisor
        .run(std::future::pending::<()>())
        .await
        .unwrap_err();
    assert!(matches!(err, SupervisorError::LogLink { .. }), "{err}");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!marker.exists());
}

#[tokio::test]
async fn app_server_spawn_failure_stops_proxy() {
    let _serial = SERIAL.lock().await;
    let dir = tempfile::tempdir().unwrap();
    let supervisor = Supervisor::new(plan(
        dir.path(),
        sleeper(ChildRole::Proxy, libc::SIGQUIT),
        ChildSpec::new(ChildRole::AppServer, dir.path().join("no-such-binary"), libc::SIGTERM),
    ));

    let err = match supervisor.start() {
        Ok(_) => panic!("app server should not start"),
        Err(err) => err,
    };
    assert!(
        matches!(
            err,
            SupervisorError::Spawn {
                role: ChildRole::AppServer,
                ..
            }
        ),
        "{err}"
    );

    let mut raw = 0;
    let pid = bounded(async {
        loop {
            let pid = unsafe { libc::waitpid(-1, &mut raw, libc::WNOHANG) };
            if pid != 0 {
                break pid;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(pid > 0);
    assert_eq!(ExitStatus::from_raw(raw).signal(), Some(libc::SIGQUIT));
}
