//! Scripted stand-in for the operating system, used by unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use nix::errno::Errno;

use crate::error::StartError;
use crate::launcher::Launched;
use crate::process::ProcessOps;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
	Spawn { executable: String, config: String },
	IsAlive(u32),
	Terminate(u32),
	Sleep(Duration),
}

/// What the next `spawn` does.
#[derive(Debug, Clone)]
pub enum SpawnPlan {
	/// Exit 0, optionally after the "daemon" wrote `pidfile` with `daemon_pid`.
	Ok { pid: Option<u32>, pidfile: Option<(PathBuf, u32)> },
	NotFound,
	Exit(i32),
}

/// How many liveness checks report a pid alive before it is gone.
#[derive(Debug, Clone, Copy)]
pub enum Liveness {
	Forever,
	For(u32),
}

#[derive(Default)]
pub struct FakeOps {
	calls: RefCell<Vec<Call>>,
	plans: RefCell<VecDeque<SpawnPlan>>,
	alive: RefCell<HashMap<u32, Liveness>>,
	delayed_pidfile: RefCell<Option<(usize, PathBuf, u32)>>,
}

impl FakeOps {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn plan(self, plan: SpawnPlan) -> Self {
		self.plans.borrow_mut().push_back(plan);
		self
	}

	pub fn alive(self, pid: u32, liveness: Liveness) -> Self {
		self.set_alive(pid, liveness);
		self
	}

	/// Write `pid` to `path` during the `nth` call to `sleep`.
	pub fn pidfile_on_sleep(self, nth: usize, path: &std::path::Path, pid: u32) -> Self {
		*self.delayed_pidfile.borrow_mut() = Some((nth, path.to_path_buf(), pid));
		self
	}

	pub fn set_alive(&self, pid: u32, liveness: Liveness) {
		self.alive.borrow_mut().insert(pid, liveness);
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.borrow().clone()
	}

	pub fn spawns(&self) -> usize {
		self.count(|c| matches!(c, Call::Spawn { .. }))
	}

	pub fn terminations(&self) -> Vec<u32> {
		self.calls()
			.into_iter()
			.filter_map(|c| match c {
				Call::Terminate(pid) => Some(pid),
				_ => None,
			})
			.collect()
	}

	pub fn sleeps(&self) -> Vec<Duration> {
		self.calls()
			.into_iter()
			.filter_map(|c| match c {
				Call::Sleep(d) => Some(d),
				_ => None,
			})
			.collect()
	}

	pub fn liveness_checks(&self) -> usize {
		self.count(|c| matches!(c, Call::IsAlive(_)))
	}

	fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
		self.calls.borrow().iter().filter(|c| f(c)).count()
	}
}

impl ProcessOps for FakeOps {
	fn spawn(&self, executable: &str, config: &str) -> Result<Launched, StartError> {
		self.calls.borrow_mut().push(Call::Spawn {
			executable: executable.to_string(),
			config: config.to_string(),
		});
		let plan = self
			.plans
			.borrow_mut()
			.pop_front()
			.unwrap_or(SpawnPlan::Ok { pid: None, pidfile: None });
		match plan {
			SpawnPlan::Ok { pid, pidfile } => {
				if let Some((path, daemon_pid)) = pidfile {
					std::fs::write(&path, format!("{}\n", daemon_pid)).unwrap();
					self.set_alive(daemon_pid, Liveness::Forever);
				}
				Ok(Launched { pid, status: ExitStatus::from_raw(0) })
			}
			SpawnPlan::NotFound => Err(StartError::Spawn(std::io::Error::from(
				std::io::ErrorKind::NotFound,
			))),
			SpawnPlan::Exit(code) => Err(StartError::Exited { code: Some(code) }),
		}
	}

	fn is_alive(&self, pid: u32) -> bool {
		self.calls.borrow_mut().push(Call::IsAlive(pid));
		let mut alive = self.alive.borrow_mut();
		match alive.get_mut(&pid) {
			Some(Liveness::Forever) => true,
			Some(Liveness::For(0)) | None => false,
			Some(Liveness::For(n)) => {
				*n -= 1;
				true
			}
		}
	}

	fn terminate(&self, pid: u32) -> Result<(), Errno> {
		self.calls.borrow_mut().push(Call::Terminate(pid));
		if self.alive.borrow().contains_key(&pid) {
			Ok(())
		} else {
			Err(Errno::ESRCH)
		}
	}

	fn sleep(&self, duration: Duration) {
		self.calls.borrow_mut().push(Call::Sleep(duration));
		let due = match &*self.delayed_pidfile.borrow() {
			Some((nth, path, pid)) if self.sleeps().len() == *nth => Some((path.clone(), *pid)),
			_ => None,
		};
		if let Some((path, pid)) = due {
			std::fs::write(&path, format!("{}\n", pid)).unwrap();
			self.set_alive(pid, Liveness::Forever);
		}
	}
}

/// Unique scratch directory per test.
pub fn scratch_dir(name: &str) -> PathBuf {
	use std::sync::atomic::{AtomicU32, Ordering};
	static COUNTER: AtomicU32 = AtomicU32::new(0);
	let n = COUNTER.fetch_add(1, Ordering::SeqCst);
	let dir = std::env::temp_dir().join(format!(
		"tamayo-unit-{}-{}-{}",
		std::process::id(),
		n,
		name
	));
	let _ = std::fs::remove_dir_all(&dir);
	std::fs::create_dir_all(&dir).unwrap();
	dir
}
