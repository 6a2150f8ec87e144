//! Long-running parts of the daemon.
//!
//! - `scheduler`: tick loop dispatching page checks
//! - `control`: loopback query endpoint for the client
//! - `watch`: configuration reload on file changes
//! - `daemon`: bootstrap tying them together

pub mod control;
pub mod daemon;
pub mod scheduler;
pub mod watch;

pub use control::{ControlServer, Query};
pub use daemon::{run_clean, run_daemon};
pub use scheduler::{DispatchReport, Scheduler};
pub use watch::ConfigWatcher;
