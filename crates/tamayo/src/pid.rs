use std::path::Path;

use crate::error::StartError;
use crate::process::ProcessOps;
use crate::types::{PidPolicy, PidSource, Started};

/// Read a pidfile: a decimal pid, surrounding whitespace ignored.
///
/// Missing, unreadable or unparseable files all read as `None`.
pub fn read_pidfile(path: &Path) -> Option<u32> {
	std::fs::read_to_string(path)
		.ok()
		.and_then(|s| s.trim().parse().ok())
		.filter(|pid| *pid != 0)
}

/// Work out the pid of a freshly launched server.
///
/// The pidfile wins whenever it shows up; the daemon writes it after
/// detaching, so it is polled up to `policy.polls` times. If it never
/// appears, the pid the spawn call returned is used instead, but only while
/// that process is still alive; a launcher that already exited is no server.
pub fn resolve_pid(
	pidfile: &Path,
	immediate: Option<u32>,
	policy: PidPolicy,
	ops: &impl ProcessOps,
) -> Result<Started, StartError> {
	let polls = policy.polls.max(1);
	for attempt in 1..=polls {
		if let Some(pid) = read_pidfile(pidfile) {
			tracing::debug!("pidfile {} gave pid {} (poll {})", pidfile.display(), pid, attempt);
			return Ok(Started { pid, source: PidSource::Pidfile });
		}
		if attempt < polls {
			ops.sleep(policy.interval);
		}
	}

	match immediate {
		Some(pid) if ops.is_alive(pid) => {
			tracing::debug!(
				"pidfile {} never appeared, using spawn pid {}",
				pidfile.display(),
				pid
			);
			Ok(Started { pid, source: PidSource::Spawn })
		}
		Some(pid) => {
			tracing::debug!("spawn pid {} has already exited", pid);
			Err(StartError::PidUnavailable { pidfile: pidfile.to_path_buf(), polls })
		}
		None => Err(StartError::PidUnavailable {
			pidfile: pidfile.to_path_buf(),
			polls,
		}),
	}
}

/// Delete a pidfile left behind by a server that is no longer running.
///
/// Returns the stale pid that was removed, if any.
pub fn remove_stale_pidfile(pidfile: &Path, ops: &impl ProcessOps) -> Option<u32> {
	let pid = read_pidfile(pidfile)?;
	if ops.is_alive(pid) {
		return None;
	}
	match std::fs::remove_file(pidfile) {
		Ok(()) => Some(pid),
		Err(e) => {
			tracing::warn!("failed to remove stale pidfile {}: {}", pidfile.display(), e);
			None
		}
	}
}
