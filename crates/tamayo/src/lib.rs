//! # tamayo
//!
//! Keeps a single `redis-server` (or anything that speaks its startup
//! conventions) running for the duration of a host's session.
//!
//! The server is launched as `<executable> -` with a generated config on
//! stdin, daemonizes itself, and is tracked through the pidfile it writes.
//! Stopping sends SIGTERM and optionally polls until the process is gone.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tamayo::{Guard, Options, Supervisor};
//!
//! let options = Options {
//!     port: 6380,
//!     shutdown_retries: 5,
//!     shutdown_wait: 1,
//!     ..Options::default()
//! };
//! let mut redis = Supervisor::new(&options);
//!
//! if redis.start() {
//!     // ... run the test suite, the dev server, etc.
//!     redis.stop();
//! }
//! ```

pub mod config;
pub mod error;
pub mod launcher;
pub mod observer;
pub mod options;
pub mod pid;
pub mod process;
pub mod shutdown;
pub mod supervisor;
pub mod types;

#[cfg(test)]
mod fake;

pub use error::{OptionsError, StartError};
pub use observer::{Observer, RecordingObserver, TracingObserver};
pub use options::Options;
pub use process::{ProcessOps, SystemOps};
pub use supervisor::{Guard, Supervisor};
pub use types::*;
