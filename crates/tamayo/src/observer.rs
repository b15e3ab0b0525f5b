use std::sync::Mutex;

/// Receives human-readable status messages from the supervisor.
pub trait Observer {
	fn info(&self, message: &str);
	fn error(&self, message: &str);
}

/// Forwards messages to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
	fn info(&self, message: &str) {
		tracing::info!("{}", message);
	}

	fn error(&self, message: &str) {
		tracing::error!("{}", message);
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
	Info,
	Error,
}

/// Keeps every message, for hosts that want to replay them and for tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
	messages: Mutex<Vec<(Level, String)>>,
}

impl RecordingObserver {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn messages(&self) -> Vec<(Level, String)> {
		self.messages.lock().map(|m| m.clone()).unwrap_or_default()
	}

	pub fn errors(&self) -> Vec<String> {
		self.with_level(Level::Error)
	}

	pub fn infos(&self) -> Vec<String> {
		self.with_level(Level::Info)
	}

	/// True if any message at any level contains `needle`.
	pub fn saw(&self, needle: &str) -> bool {
		self.messages().iter().any(|(_, m)| m.contains(needle))
	}

	fn with_level(&self, level: Level) -> Vec<String> {
		self.messages()
			.into_iter()
			.filter(|(l, _)| *l == level)
			.map(|(_, m)| m)
			.collect()
	}

	fn push(&self, level: Level, message: &str) {
		if let Ok(mut messages) = self.messages.lock() {
			messages.push((level, message.to_string()));
		}
	}
}

impl Observer for RecordingObserver {
	fn info(&self, message: &str) {
		self.push(Level::Info, message);
	}

	fn error(&self, message: &str) {
		self.push(Level::Error, message);
	}
}

impl<T: Observer + ?Sized> Observer for std::sync::Arc<T> {
	fn info(&self, message: &str) {
		(**self).info(message);
	}

	fn error(&self, message: &str) {
		(**self).error(message);
	}
}
