use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use owo_colors::OwoColorize;
use tamayo::{Guard, Observer, Options, ProcessOps, Status, Supervisor};
use tokio::signal::unix::{signal, SignalKind};

fn main() {
	tracing_subscriber::fmt().init();

	let mut args: Vec<String> = std::env::args().skip(1).collect();
	let options_path = match take_config_flag(&mut args) {
		Ok(path) => path.unwrap_or_else(tamayo::options::default_options_path),
		Err(e) => {
			eprintln!("error: {}", e);
			std::process::exit(1);
		}
	};

	let command = args.first().map(|s| s.as_str()).unwrap_or("help");
	match command {
		"help" | "--help" | "-h" => {
			print_usage();
			return;
		}
		"version" | "--version" | "-V" => {
			println!("tamayo {}", env!("CARGO_PKG_VERSION"));
			return;
		}
		_ => {}
	}

	let options = match Options::load_or_default(&options_path) {
		Ok(o) => o,
		Err(e) => {
			eprintln!("error: {}", e);
			std::process::exit(1);
		}
	};

	let code = match command {
		"start" => cmd_start(&options),
		"stop" => cmd_stop(&options),
		"reload" | "restart" => cmd_reload(&options),
		"status" | "st" => cmd_status(&options, &args[1..]),
		"config" => {
			print!("{}", Supervisor::new(&options).config());
			0
		}
		"run" => cmd_run(options, options_path),
		other => {
			eprintln!("unknown command: {}", other);
			eprintln!("run 'tamayo help' for usage");
			1
		}
	};
	std::process::exit(code);
}

/// Pull `-c <file>` / `--config <file>` out of the argument list.
fn take_config_flag(args: &mut Vec<String>) -> Result<Option<PathBuf>, String> {
	let pos = match args.iter().position(|a| a == "-c" || a == "--config") {
		Some(p) => p,
		None => return Ok(None),
	};
	if pos + 1 >= args.len() {
		return Err(format!("{} needs a file argument", args[pos]));
	}
	let path = PathBuf::from(args.remove(pos + 1));
	args.remove(pos);
	Ok(Some(path))
}

fn print_usage() {
	eprintln!("{} {} - redis-server supervisor", "tamayo".bold(), env!("CARGO_PKG_VERSION"));
	eprintln!();
	eprintln!("usage: {} [-c config.toml] <command>", "tamayo".bold());
	eprintln!();
	eprintln!("{}", "commands".cyan().bold());
	eprintln!("  {}            Launch the server and wait for its pidfile", "start".bold());
	eprintln!("  {}             Send TERM and wait per shutdown_retries", "stop".bold());
	eprintln!("  {}           Stop, then start", "reload".bold());
	eprintln!("  {} [--json]   Show pid and liveness", "status".bold());
	eprintln!("  {}           Print the config sent to the server", "config".bold());
	eprintln!("  {}              Start and stay in the foreground", "run".bold());
	eprintln!();
	eprintln!("{}", "run".cyan().bold());
	eprintln!("  SIGHUP reloads; edits to the config file notify a change;");
	eprintln!("  ctrl-c or SIGTERM stops the server and exits.");
	eprintln!();
	eprintln!(
		"config: {}",
		tamayo::options::default_options_path().display().dimmed()
	);
}

fn cmd_start(options: &Options) -> i32 {
	let mut sup = Supervisor::new(options);
	if sup.start() { 0 } else { 1 }
}

fn cmd_stop(options: &Options) -> i32 {
	let mut sup = Supervisor::new(options);
	match sup.stop_with_outcome() {
		tamayo::ShutdownOutcome::TimedOut => 1,
		_ => 0,
	}
}

fn cmd_reload(options: &Options) -> i32 {
	reload_exit_code(&mut Supervisor::new(options))
}

fn reload_exit_code<O: ProcessOps, B: Observer>(sup: &mut Supervisor<O, B>) -> i32 {
	sup.reload();
	if sup.process().started { 0 } else { 1 }
}

fn cmd_status(options: &Options, args: &[String]) -> i32 {
	let status = Supervisor::new(options).status();
	if args.iter().any(|a| a == "--json") {
		match serde_json::to_string_pretty(&status) {
			Ok(json) => println!("{}", json),
			Err(e) => {
				eprintln!("error: {}", e);
				return 1;
			}
		}
	} else {
		render_status(&status);
	}
	if status.alive { 0 } else { 3 }
}

fn render_status(status: &Status) {
	let state = match (status.pid, status.alive) {
		(Some(pid), true) => format!("{} (pid {})", "running".green(), pid),
		(Some(pid), false) => format!("{} (stale pid {})", "stopped".red(), pid),
		(None, _) => "stopped".red().to_string(),
	};
	println!("{} {}", status.executable.bold(), state);
	println!("  {}    {}", "port".dimmed(), status.port);
	println!("  {} {}", "pidfile".dimmed(), status.pidfile.display());
	println!("  {} {}", "logfile".dimmed(), status.logfile);
}

fn cmd_run(options: Options, options_path: PathBuf) -> i32 {
	let runtime = match tokio::runtime::Runtime::new() {
		Ok(rt) => rt,
		Err(e) => {
			eprintln!("error: failed to start runtime: {}", e);
			return 1;
		}
	};
	runtime.block_on(run(options, options_path))
}

type Shared = Arc<Mutex<Supervisor>>;

async fn run(options: Options, options_path: PathBuf) -> i32 {
	let sup: Shared = Arc::new(Mutex::new(Supervisor::new(&options)));

	if !with_supervisor(&sup, |s| s.start()).await {
		return 1;
	}

	let (mut hangup, mut terminate) = match (signal(SignalKind::hangup()), signal(SignalKind::terminate())) {
		(Ok(h), Ok(t)) => (h, t),
		(Err(e), _) | (_, Err(e)) => {
			tracing::error!("failed to install signal handlers: {}", e);
			with_supervisor(&sup, |s| s.stop()).await;
			return 1;
		}
	};

	let mut tick = tokio::time::interval(Duration::from_secs(2));
	let mut last_modified = modified(&options_path);

	loop {
		tokio::select! {
			_ = tokio::signal::ctrl_c() => break,
			_ = terminate.recv() => break,
			_ = hangup.recv() => {
				with_supervisor(&sup, |s| s.reload()).await;
			}
			_ = tick.tick() => {
				let now = modified(&options_path);
				if now != last_modified {
					last_modified = now;
					let changed = vec![options_path.clone()];
					with_supervisor(&sup, move |s| s.notify_change(&changed)).await;
				}
			}
		}
	}

	tracing::info!("shutting down");
	with_supervisor(&sup, |s| s.stop()).await;
	0
}

/// Run a blocking supervisor operation off the async workers, one at a time.
async fn with_supervisor<T, F>(sup: &Shared, f: F) -> T
where
	F: FnOnce(&mut Supervisor) -> T + Send + 'static,
	T: Send + 'static,
{
	let sup = Arc::clone(sup);
	let result = tokio::task::spawn_blocking(move || {
		let mut guard = sup.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
		f(&mut guard)
	})
	.await;
	match result {
		Ok(value) => value,
		Err(e) => {
			tracing::error!("supervisor task failed: {}", e);
			std::process::exit(1);
		}
	}
}

fn modified(path: &Path) -> Option<SystemTime> {
	std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
