//! Log file redirection
//!
//! The proxy writes its access and error logs to fixed paths. Replacing those
//! files with symlinks to the supervisor's standard streams lands the proxy
//! logs in the container log.

use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use crate::error::SupervisorError;

pub const STDOUT: &str = "/dev/stdout";
pub const STDERR: &str = "/dev/stderr";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLink {
    /// Path the proxy writes to
    pub link: PathBuf,
    /// Where writes should end up
    pub target: PathBuf,
}

impl LogLink {
    pub fn new(link: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            link: link.into(),
            target: target.into(),
        }
    }

    pub fn stdout(link: impl Into<PathBuf>) -> Self {
        Self::new(link, STDOUT)
    }

    pub fn stderr(link: impl Into<PathBuf>) -> Self {
        Self::new(link, STDERR)
    }

    /// Replace whatever is at `link` with a symlink to `target` (`ln -sf`).
    pub fn install(&self) -> Result<(), SupervisorError> {
        replace_with_symlink(&self.link, &self.target).map_err(|source| SupervisorError::LogLink {
            link: self.link.clone(),
            target: self.target.clone(),
            source,
        })?;
        tracing::debug!("Linked {:?} -> {:?}", self.link, self.target);
        Ok(())
    }
}

fn replace_with_symlink(link: &Path, target: &Path) -> io::Result<()> {
    match fs::remove_file(link) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    symlink(target, link)
}

/// Install every link, stopping at the first failure.
pub fn install_all(links: &[LogLink]) -> Result<(), SupervisorError> {
    links.iter().try_for_each(LogLink::install)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("access.log");
        fs::write(&log, "old contents").unwrap();

        LogLink::stdout(&log).install().unwrap();
        assert_eq!(fs::read_link(&log).unwrap(), PathBuf::from(STDOUT));

        // Installing again replaces the link rather than failing.
        LogLink::stderr(&log).install().unwrap();
        assert_eq!(fs::read_link(&log).unwrap(), PathBuf::from(STDERR));
    }

    #[test]
    fn creates_missing_link() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("error.log");

        install_all(&[LogLink::stderr(&log)]).unwrap();
        assert_eq!(fs::read_link(&log).unwrap(), PathBuf::from(STDERR));
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("nginx").join("access.log");

        let err = LogLink::stdout(&log).install().unwrap_err();
        match err {
            SupervisorError::LogLink { link, source, .. } => {
                assert_eq!(link, log);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("later.log");
        let links = [
            LogLink::stdout(dir.path().join("missing").join("access.log")),
            LogLink::stderr(&good),
        ];

        assert!(install_all(&links).is_err());
        assert!(fs::symlink_metadata(&good).is_err());
    }
}
