use nix::errno::Errno;

use crate::observer::Observer;
use crate::process::ProcessOps;
use crate::types::{ShutdownOutcome, ShutdownPolicy};

/// Ask a server to exit and, if the policy says so, wait until it has.
///
/// Retries of zero is fire-and-forget: SIGTERM goes out and success is
/// reported without checking again. Otherwise the pid is checked after each
/// `wait_secs` sleep, at most `retries` times. A server still alive after
/// that is reported as an error but not treated as fatal.
pub fn shutdown(
	pid: Option<u32>,
	policy: ShutdownPolicy,
	ops: &impl ProcessOps,
	observer: &impl Observer,
) -> ShutdownOutcome {
	let pid = match pid {
		Some(pid) => pid,
		None => {
			observer.info("No Redis instance to stop");
			return ShutdownOutcome::AlreadyStopped;
		}
	};

	if !ops.is_alive(pid) {
		observer.info(&format!("Redis ({}) already stopped", pid));
		return ShutdownOutcome::AlreadyStopped;
	}

	observer.info(&format!("Sending TERM signal to Redis ({})", pid));
	match ops.terminate(pid) {
		Ok(()) => {}
		Err(Errno::ESRCH) => {
			observer.info(&format!("Redis ({}) already stopped", pid));
			return ShutdownOutcome::AlreadyStopped;
		}
		Err(e) => {
			observer.error(&format!("Failed to signal Redis ({}): {}", pid, e));
			return ShutdownOutcome::TimedOut;
		}
	}

	if policy.retries == 0 {
		observer.info(&format!("Redis ({}) signaled, not waiting for exit", pid));
		return ShutdownOutcome::Stopped;
	}

	for attempt in 1..=policy.retries {
		ops.sleep(policy.wait());
		if !ops.is_alive(pid) {
			observer.info(&format!("Redis ({}) stopped", pid));
			return ShutdownOutcome::Stopped;
		}
		tracing::debug!("Redis ({}) still running after poll {}/{}", pid, attempt, policy.retries);
	}

	observer.error(&format!(
		"Redis ({}) did not stop within {}s ({} retries of {}s)",
		pid,
		policy.budget().as_secs(),
		policy.retries,
		policy.wait_secs
	));
	ShutdownOutcome::TimedOut
}
