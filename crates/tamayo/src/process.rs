use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use crate::error::StartError;
use crate::launcher::{self, Launched};

/// Everything the supervisor asks of the operating system.
///
/// [`SystemOps`] is the real thing; tests substitute a scripted fake.
pub trait ProcessOps {
	fn spawn(&self, executable: &str, config: &str) -> Result<Launched, StartError>;
	fn is_alive(&self, pid: u32) -> bool;
	/// Send SIGTERM.
	fn terminate(&self, pid: u32) -> Result<(), Errno>;
	fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOps;

impl ProcessOps for SystemOps {
	fn spawn(&self, executable: &str, config: &str) -> Result<Launched, StartError> {
		launcher::launch(executable, config)
	}

	fn is_alive(&self, pid: u32) -> bool {
		is_alive(pid)
	}

	fn terminate(&self, pid: u32) -> Result<(), Errno> {
		kill(to_pid(pid), Signal::SIGTERM)
	}

	fn sleep(&self, duration: Duration) {
		std::thread::sleep(duration);
	}
}

fn to_pid(pid: u32) -> Pid {
	Pid::from_raw(pid as i32)
}

/// Whether the OS still has a live process with this id.
///
/// Only `ESRCH` means gone; `EPERM` means it exists but belongs to someone
/// else. A zombie has exited and just awaits reaping, so it counts as gone.
pub fn is_alive(pid: u32) -> bool {
	if pid == 0 || pid > i32::MAX as u32 {
		return false;
	}
	match kill(to_pid(pid), None::<Signal>) {
		Ok(()) => !is_zombie(pid),
		Err(Errno::EPERM) => true,
		Err(Errno::ESRCH) => false,
		Err(e) => {
			tracing::warn!("liveness check for pid {} failed: {}", pid, e);
			true
		}
	}
}

#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
	let status = match std::fs::read_to_string(format!("/proc/{}/status", pid)) {
		Ok(s) => s,
		Err(_) => return false,
	};
	status
		.lines()
		.find(|l| l.starts_with("State:"))
		.map(|l| l["State:".len()..].trim_start().starts_with('Z'))
		.unwrap_or(false)
}

#[cfg(not(target_os = "linux"))]
fn is_zombie(_pid: u32) -> bool {
	false
}
