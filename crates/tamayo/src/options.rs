use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::OptionsError;
use crate::types::{LogTarget, PidPolicy, ShutdownPolicy};

// ── Supervisor options (config.toml) ─────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
	#[serde(default = "default_executable")]
	pub executable: String,
	#[serde(default = "default_port")]
	pub port: u16,
	#[serde(default = "default_pidfile")]
	pub pidfile: PathBuf,
	/// Explicit log path. When unset, derived from the port if capturing.
	pub logfile: Option<PathBuf>,
	#[serde(default)]
	pub capture_logging: bool,
	#[serde(default)]
	pub reload_on_change: bool,
	#[serde(default)]
	pub shutdown_retries: u32,
	/// Seconds between liveness polls while stopping.
	#[serde(default)]
	pub shutdown_wait: u64,
	#[serde(default = "default_pidfile_polls")]
	pub pidfile_polls: u32,
	#[serde(default = "default_pidfile_poll_interval_ms")]
	pub pidfile_poll_interval_ms: u64,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			executable: default_executable(),
			port: default_port(),
			pidfile: default_pidfile(),
			logfile: None,
			capture_logging: false,
			reload_on_change: false,
			shutdown_retries: 0,
			shutdown_wait: 0,
			pidfile_polls: default_pidfile_polls(),
			pidfile_poll_interval_ms: default_pidfile_poll_interval_ms(),
		}
	}
}

fn default_executable() -> String { "redis-server".into() }
fn default_port() -> u16 { 6379 }
fn default_pidfile() -> PathBuf { PathBuf::from("/tmp/redis.pid") }
fn default_pidfile_polls() -> u32 { 10 }
fn default_pidfile_poll_interval_ms() -> u64 { 1000 }

impl Options {
	/// Resolve where the server should log.
	///
	/// An explicit `logfile` wins; otherwise capturing derives a path from the
	/// port, and not capturing means inheriting stdout.
	pub fn logfile(&self) -> LogTarget {
		match (&self.logfile, self.capture_logging) {
			(Some(path), _) => LogTarget::File(path.clone()),
			(None, true) => LogTarget::File(PathBuf::from(format!("log/redis_{}.log", self.port))),
			(None, false) => LogTarget::Stdout,
		}
	}

	pub fn shutdown_policy(&self) -> ShutdownPolicy {
		ShutdownPolicy {
			retries: self.shutdown_retries,
			wait_secs: self.shutdown_wait,
		}
	}

	pub fn pid_policy(&self) -> PidPolicy {
		PidPolicy {
			polls: self.pidfile_polls,
			interval: Duration::from_millis(self.pidfile_poll_interval_ms),
		}
	}

	pub fn from_toml(path: &Path, content: &str) -> Result<Self, OptionsError> {
		toml::from_str(content).map_err(|source| OptionsError::Parse {
			path: path.to_path_buf(),
			source,
		})
	}

	pub fn load(path: &Path) -> Result<Self, OptionsError> {
		let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml(path, &content)
	}

	/// Like [`Options::load`], but a missing file means all defaults.
	pub fn load_or_default(path: &Path) -> Result<Self, OptionsError> {
		if !path.exists() {
			return Ok(Self::default());
		}
		Self::load(path)
	}
}

/// `$XDG_CONFIG_HOME/tamayo/config.toml`, falling back to `~/.config`.
pub fn default_options_path() -> PathBuf {
	let dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
		PathBuf::from(dir).join("tamayo")
	} else if let Ok(home) = std::env::var("HOME") {
		PathBuf::from(home).join(".config").join("tamayo")
	} else {
		PathBuf::from("/tmp").join("tamayo").join("config")
	};
	dir.join("config.toml")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(content: &str) -> Options {
		Options::from_toml(Path::new("config.toml"), content).unwrap()
	}

	#[test]
	fn defaults() {
		let opts = Options::default();
		assert_eq!(opts.executable, "redis-server");
		assert_eq!(opts.port, 6379);
		assert_eq!(opts.pidfile, PathBuf::from("/tmp/redis.pid"));
		assert_eq!(opts.logfile(), LogTarget::Stdout);
		assert!(!opts.capture_logging);
		assert!(!opts.reload_on_change);
		assert_eq!(opts.shutdown_policy(), ShutdownPolicy { retries: 0, wait_secs: 0 });
	}

	#[test]
	fn empty_file_is_all_defaults() {
		let opts = parse("");
		assert_eq!(opts.port, 6379);
		assert_eq!(opts.pidfile, PathBuf::from("/tmp/redis.pid"));
		assert_eq!(opts.pid_policy().polls, 10);
		assert_eq!(opts.pid_policy().interval, Duration::from_millis(1000));
	}

	#[test]
	fn overrides() {
		let opts = parse(
			r#"
executable = "/usr/bin/redis-server"
port = 9999
pidfile = "/var/pid/redis.pid"
reload_on_change = true
shutdown_retries = 3
shutdown_wait = 5
"#,
		);
		assert_eq!(opts.executable, "/usr/bin/redis-server");
		assert_eq!(opts.port, 9999);
		assert_eq!(opts.pidfile, PathBuf::from("/var/pid/redis.pid"));
		assert!(opts.reload_on_change);
		assert_eq!(opts.shutdown_policy(), ShutdownPolicy { retries: 3, wait_secs: 5 });
	}

	#[test]
	fn capture_logging_derives_logfile_from_port() {
		let opts = parse("capture_logging = true");
		assert_eq!(opts.logfile(), LogTarget::File("log/redis_6379.log".into()));

		let opts = parse("capture_logging = true\nport = 9999");
		assert_eq!(opts.logfile(), LogTarget::File("log/redis_9999.log".into()));
	}

	#[test]
	fn explicit_logfile_wins() {
		let opts = parse("logfile = \"log/redis.log\"");
		assert_eq!(opts.logfile(), LogTarget::File("log/redis.log".into()));

		let opts = parse("logfile = \"log/redis.log\"\ncapture_logging = true\nport = 9999");
		assert_eq!(opts.logfile(), LogTarget::File("log/redis.log".into()));
	}

	#[test]
	fn invalid_toml_is_parse_error() {
		let err = Options::from_toml(Path::new("bad.toml"), "port = \"not a port\"").unwrap_err();
		assert!(matches!(err, OptionsError::Parse { .. }));
		assert!(err.to_string().contains("bad.toml"));
	}

	#[test]
	fn unknown_key_rejected() {
		let err = Options::from_toml(Path::new("c.toml"), "prot = 1").unwrap_err();
		assert!(matches!(err, OptionsError::Parse { .. }));
	}

	#[test]
	fn missing_file_falls_back_to_defaults() {
		let path = std::env::temp_dir().join("tamayo-options-does-not-exist.toml");
		let opts = Options::load_or_default(&path).unwrap();
		assert_eq!(opts.port, 6379);
		assert!(matches!(Options::load(&path), Err(OptionsError::Io { .. })));
	}
}
