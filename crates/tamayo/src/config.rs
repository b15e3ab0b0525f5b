use std::path::Path;

/// Render the configuration block fed to the server on stdin.
///
/// `logfile` is only passed when logging capture is on; `None` leaves the
/// server logging to its inherited stdout.
pub fn build_config(pidfile: &Path, port: u16, logfile: Option<&Path>) -> String {
	let mut config = String::new();
	config.push_str("daemonize yes\n");
	config.push_str(&format!("pidfile {}\n", pidfile.display()));
	config.push_str(&format!("port {}\n", port));
	if let Some(logfile) = logfile {
		config.push_str(&format!("logfile {}\n", logfile.display()));
	}
	config
}
