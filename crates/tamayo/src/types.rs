use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Where the server writes its log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogTarget {
	/// Inherit standard output (the `stdout` sentinel).
	Stdout,
	File(PathBuf),
}

impl std::fmt::Display for LogTarget {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			LogTarget::Stdout => write!(f, "stdout"),
			LogTarget::File(path) => write!(f, "{}", path.display()),
		}
	}
}

/// The single server instance a supervisor owns.
#[derive(Debug, Clone)]
pub struct SupervisedProcess {
	pub executable: String,
	pub port: u16,
	pub pidfile: PathBuf,
	pub logfile: LogTarget,
	pub capture_logging: bool,
	pub pid: Option<u32>,
	pub started: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownPolicy {
	pub retries: u32,
	pub wait_secs: u64,
}

impl ShutdownPolicy {
	pub fn wait(&self) -> Duration {
		Duration::from_secs(self.wait_secs)
	}

	/// Longest time a stop may block before reporting a timeout.
	pub fn budget(&self) -> Duration {
		Duration::from_secs(self.wait_secs.saturating_mul(u64::from(self.retries)))
	}
}

/// Bounds on pidfile discovery after a spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PidPolicy {
	pub polls: u32,
	pub interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PidSource {
	Pidfile,
	Spawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Started {
	pub pid: u32,
	pub source: PidSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
	Stopped,
	AlreadyStopped,
	TimedOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct Status {
	pub executable: String,
	pub port: u16,
	pub pidfile: PathBuf,
	pub logfile: LogTarget,
	pub pid: Option<u32>,
	pub started: bool,
	pub alive: bool,
}
