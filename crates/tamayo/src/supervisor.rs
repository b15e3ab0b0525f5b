use std::path::{Path, PathBuf};

use nix::unistd::{access, AccessFlags};

use crate::config::build_config;
use crate::error::StartError;
use crate::observer::{Observer, TracingObserver};
use crate::options::Options;
use crate::pid::{read_pidfile, remove_stale_pidfile, resolve_pid};
use crate::process::{ProcessOps, SystemOps};
use crate::shutdown::shutdown;
use crate::types::*;

/// The four lifecycle callbacks a host drives.
pub trait Guard {
	/// Launch the server. Failures are reported, never propagated.
	fn start(&mut self) -> bool;
	/// Stop the server if one is running. Always succeeds.
	fn stop(&mut self) -> bool;
	/// `stop` followed by `start`, whatever either returns.
	fn reload(&mut self);
	/// Files the host watches have changed.
	fn notify_change(&mut self, paths: &[PathBuf]);
}

pub struct Supervisor<O = SystemOps, B = TracingObserver> {
	process: SupervisedProcess,
	source: Option<PidSource>,
	shutdown: ShutdownPolicy,
	pid_policy: PidPolicy,
	reload_on_change: bool,
	ops: O,
	observer: B,
}

impl Supervisor {
	pub fn new(options: &Options) -> Self {
		Self::with_parts(options, SystemOps, TracingObserver)
	}
}

impl<O: ProcessOps, B: Observer> Supervisor<O, B> {
	pub fn with_parts(options: &Options, ops: O, observer: B) -> Self {
		Self {
			process: SupervisedProcess {
				executable: options.executable.clone(),
				port: options.port,
				pidfile: options.pidfile.clone(),
				logfile: options.logfile(),
				capture_logging: options.capture_logging,
				pid: None,
				started: false,
			},
			source: None,
			shutdown: options.shutdown_policy(),
			pid_policy: options.pid_policy(),
			reload_on_change: options.reload_on_change,
			ops,
			observer,
		}
	}

	pub fn process(&self) -> &SupervisedProcess {
		&self.process
	}

	pub fn ops(&self) -> &O {
		&self.ops
	}

	pub fn observer(&self) -> &B {
		&self.observer
	}

	/// The block written to the server's stdin.
	pub fn config(&self) -> String {
		let logfile = match (&self.process.logfile, self.process.capture_logging) {
			(LogTarget::File(path), true) => Some(path.as_path()),
			_ => None,
		};
		build_config(&self.process.pidfile, self.process.port, logfile)
	}

	/// The pid a stop would target: the pidfile's, else the one we tracked.
	pub fn current_pid(&self) -> Option<u32> {
		read_pidfile(&self.process.pidfile).or(self.process.pid)
	}

	pub fn status(&self) -> Status {
		let pid = self.current_pid();
		Status {
			executable: self.process.executable.clone(),
			port: self.process.port,
			pidfile: self.process.pidfile.clone(),
			logfile: self.process.logfile.clone(),
			pid,
			started: self.process.started,
			alive: pid.map(|p| self.ops.is_alive(p)).unwrap_or(false),
		}
	}

	/// Launch the server and resolve its pid.
	pub fn try_start(&mut self) -> Result<Started, StartError> {
		if let (true, Some(pid), Some(source)) = (self.process.started, self.process.pid, self.source) {
			if self.ops.is_alive(pid) {
				self.observer.info(&format!("Redis is already running with PID {}", pid));
				return Ok(Started { pid, source });
			}
		}
		self.clear();

		self.observer.info(&format!("Starting Redis on port {}...", self.process.port));

		ensure_writable_dir(parent_dir(&self.process.pidfile))?;
		if let (LogTarget::File(path), true) = (&self.process.logfile, self.process.capture_logging) {
			ensure_writable_dir(parent_dir(path))?;
		}

		if let Some(stale) = remove_stale_pidfile(&self.process.pidfile, &self.ops) {
			self.observer.info(&format!(
				"Removed stale pidfile {} (pid {})",
				self.process.pidfile.display(),
				stale
			));
		}

		let config = self.config();
		let launched = self.ops.spawn(&self.process.executable, &config)?;
		let started = resolve_pid(&self.process.pidfile, launched.pid, self.pid_policy, &self.ops)?;

		self.process.pid = Some(started.pid);
		self.process.started = true;
		self.source = Some(started.source);
		self.observer.info(&format!("Redis is running with PID {}", started.pid));
		Ok(started)
	}

	/// Stop the server and report how it went.
	pub fn stop_with_outcome(&mut self) -> ShutdownOutcome {
		let pid = self.current_pid();
		let outcome = shutdown(pid, self.shutdown, &self.ops, &self.observer);

		if let Some(pid) = pid {
			if read_pidfile(&self.process.pidfile) == Some(pid) {
				if let Err(e) = std::fs::remove_file(&self.process.pidfile) {
					self.observer.error(&format!(
						"Failed to remove pidfile {}: {}",
						self.process.pidfile.display(),
						e
					));
				}
			}
		}

		self.clear();
		outcome
	}

	fn clear(&mut self) {
		self.process.pid = None;
		self.process.started = false;
		self.source = None;
	}
}

impl<O: ProcessOps, B: Observer> Guard for Supervisor<O, B> {
	fn start(&mut self) -> bool {
		match self.try_start() {
			Ok(_) => true,
			Err(e) => {
				self.clear();
				self.observer.error(&format!("Redis failed to start: {}", e));
				false
			}
		}
	}

	fn stop(&mut self) -> bool {
		self.stop_with_outcome();
		true
	}

	fn reload(&mut self) {
		self.observer.info("Reloading Redis...");
		self.stop();
		if self.start() {
			self.observer.info("Redis successfully restarted.");
		} else {
			self.observer.error("Redis did not come back after reload; it is now stopped");
		}
	}

	fn notify_change(&mut self, paths: &[PathBuf]) {
		if !self.reload_on_change {
			tracing::debug!("{} path(s) changed, reload_on_change is off", paths.len());
			return;
		}
		self.observer.info(&format!("{} path(s) changed", paths.len()));
		self.reload();
	}
}

fn parent_dir(path: &Path) -> &Path {
	match path.parent() {
		Some(dir) if !dir.as_os_str().is_empty() => dir,
		_ => Path::new("."),
	}
}

fn ensure_writable_dir(dir: &Path) -> Result<(), StartError> {
	std::fs::create_dir_all(dir).map_err(|e| StartError::DirectoryUnwritable {
		dir: dir.to_path_buf(),
		reason: e.to_string(),
	})?;
	access(dir, AccessFlags::W_OK).map_err(|e| StartError::DirectoryUnwritable {
		dir: dir.to_path_buf(),
		reason: e.desc().to_string(),
	})
}
