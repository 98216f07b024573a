//! byoserve_supervisor - keeps the reverse proxy and the application server
//! alive as one unit
//!
//! The supervisor links the proxy's log files to the container's stdout and
//! stderr, starts both processes, and waits. When either process exits, or the
//! supervisor is asked to terminate, both are signalled and the supervisor
//! returns. There is no restart policy: the container orchestrator decides
//! what happens next.

pub mod children;
pub mod error;
pub mod links;
pub mod plan;
pub mod reaper;
pub mod supervisor;

pub use children::{ChildPid, ChildRole, ChildSet};
pub use error::SupervisorError;
pub use links::LogLink;
pub use plan::{ChildSpec, LaunchPlan};
pub use supervisor::{ExitCause, Running, Supervisor};
