use std::io;
use std::path::PathBuf;

/// Why a start sequence did not produce a tracked server.
#[derive(Debug)]
pub enum StartError {
	/// The executable could not be spawned (not found, permission denied, ...).
	Spawn(io::Error),
	/// The launching process ran but exited unsuccessfully.
	Exited { code: Option<i32> },
	/// The pidfile never appeared and the spawn call gave no pid.
	PidUnavailable { pidfile: PathBuf, polls: u32 },
	/// The pidfile's directory is missing and cannot be created, or is read-only.
	DirectoryUnwritable { dir: PathBuf, reason: String },
}

impl StartError {
	/// Failures that leave the supervisor unable to tell whether a server runs.
	pub fn is_fatal(&self) -> bool {
		matches!(
			self,
			StartError::PidUnavailable { .. } | StartError::DirectoryUnwritable { .. }
		)
	}
}

impl std::fmt::Display for StartError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			StartError::Spawn(e) => write!(f, "failed to spawn: {}", e),
			StartError::Exited { code: Some(code) } => {
				write!(f, "launcher exited with status {}", code)
			}
			StartError::Exited { code: None } => write!(f, "launcher killed by signal"),
			StartError::PidUnavailable { pidfile, polls } => write!(
				f,
				"pid unavailable: {} did not appear after {} polls",
				pidfile.display(),
				polls
			),
			StartError::DirectoryUnwritable { dir, reason } => {
				write!(f, "directory {} is not writable: {}", dir.display(), reason)
			}
		}
	}
}

impl std::error::Error for StartError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			StartError::Spawn(e) => Some(e),
			_ => None,
		}
	}
}

impl From<io::Error> for StartError {
	fn from(e: io::Error) -> Self {
		StartError::Spawn(e)
	}
}

/// Errors from loading an options file.
#[derive(Debug)]
pub enum OptionsError {
	Io { path: PathBuf, source: io::Error },
	Parse { path: PathBuf, source: toml::de::Error },
}

impl std::fmt::Display for OptionsError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OptionsError::Io { path, source } => {
				write!(f, "failed to read {}: {}", path.display(), source)
			}
			OptionsError::Parse { path, source } => {
				write!(f, "failed to parse {}: {}", path.display(), source)
			}
		}
	}
}

impl std::error::Error for OptionsError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			OptionsError::Io { source, .. } => Some(source),
			OptionsError::Parse { source, .. } => Some(source),
		}
	}
}
