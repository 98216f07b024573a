use std::path::PathBuf;

use crate::children::ChildRole;

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("failed to link {} to {}: {source}", link.display(), target.display())]
    LogLink {
        link: PathBuf,
        target: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to start {role} ({program}): {source}")]
    Spawn {
        role: ChildRole,
        program: String,
        source: std::io::Error,
    },

    #[error("waiting for child processes failed: {0}")]
    Wait(std::io::Error),
}
