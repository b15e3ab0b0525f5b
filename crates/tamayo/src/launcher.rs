use std::io::{ErrorKind, Write};
use std::process::{Command, ExitStatus, Stdio};

use crate::error::StartError;

/// Result of running the launching process to completion.
#[derive(Debug, Clone, Copy)]
pub struct Launched {
	/// Pid the spawn call returned, if the platform gave one.
	pub pid: Option<u32>,
	pub status: ExitStatus,
}

/// Spawn `<executable> -`, feed it `config` on stdin and wait for it to exit.
///
/// The server reads the whole block, daemonizes and the foreground process
/// exits, so this returns once the detached copy is on its own.
pub fn launch(executable: &str, config: &str) -> Result<Launched, StartError> {
	let mut child = Command::new(executable)
		.arg("-")
		.stdin(Stdio::piped())
		.spawn()
		.map_err(StartError::Spawn)?;

	let pid = Some(child.id());

	if let Some(mut stdin) = child.stdin.take() {
		match stdin.write_all(config.as_bytes()) {
			Ok(()) => {}
			// Child quit before reading; its exit status says why.
			Err(e) if e.kind() == ErrorKind::BrokenPipe => {
				tracing::warn!("{} closed stdin before reading config", executable);
			}
			Err(e) => {
				let _ = child.kill();
				let _ = child.wait();
				return Err(StartError::Spawn(e));
			}
		}
	}

	let status = child.wait()?;
	if !status.success() {
		return Err(StartError::Exited { code: status.code() });
	}

	Ok(Launched { pid, status })
}
