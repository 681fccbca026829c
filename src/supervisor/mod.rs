//! Preview server supervision
//!
//! This module contains everything concerning the child process that serves
//! the site during export:
//! - Bounded stdout/stderr tails for diagnostics
//! - Spawning, exit observation and termination of the server
//! - Readiness polling with early-exit detection

mod process;
mod readiness;
mod tail;

pub use process::{ExitWatch, LogTails, ProcessExit, ServerProcess};
pub use readiness::{build_probe_client, is_ready_status, wait_until_ready};
pub use tail::{capture_stream, LogTail, SharedTail};
