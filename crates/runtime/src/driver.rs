//! Local chromedriver discovery, launch and readiness probing.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use autoreg_protocol::{Envelope, StatusValue};
use tracing::{debug, warn};

use crate::error::{Result, RuntimeError};
use crate::process::{pid_is_alive, port_available};

/// Port chromedriver listens on unless told otherwise.
pub const DEFAULT_DRIVER_PORT: u16 = 9515;

/// Environment variable consulted when no explicit driver path is given.
pub const DRIVER_ENV: &str = "AUTOREG_DRIVER";

const READY_ATTEMPTS: u32 = 25;
const READY_INTERVAL: Duration = Duration::from_millis(200);

/// A chromedriver child process. The process is killed on drop.
pub struct DriverProcess {
	child: Child,
	port: u16,
	endpoint: String,
}

impl DriverProcess {
	/// Resolves the driver executable: explicit path, then `AUTOREG_DRIVER`,
	/// then `chromedriver` on `PATH`.
	pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
		if let Some(path) = explicit {
			return resolve_candidate(path);
		}
		if let Some(path) = std::env::var_os(DRIVER_ENV) {
			return resolve_candidate(Path::new(&path));
		}
		which::which("chromedriver").map_err(|_| {
			RuntimeError::DriverNotFound(format!(
				"chromedriver is not on PATH. \n\
				 Install it or pass --driver <path> (or set {DRIVER_ENV})."
			))
		})
	}

	/// Spawns the driver on `port` and waits until `/status` reports ready.
	pub async fn launch(path: &Path, port: u16) -> Result<Self> {
		if !port_available(port) {
			return Err(RuntimeError::Launch {
				path: path.display().to_string(),
				message: format!("port {port} is already in use"),
			});
		}

		let mut cmd = Command::new(path);
		cmd.arg(format!("--port={port}")).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

		#[cfg(unix)]
		std::os::unix::process::CommandExt::process_group(&mut cmd, 0);

		let child = cmd.spawn().map_err(|e| RuntimeError::Launch {
			path: path.display().to_string(),
			message: e.to_string(),
		})?;
		debug!(target = "autoreg.driver", pid = child.id(), port, "driver spawned");

		let mut process = Self {
			child,
			port,
			endpoint: format!("http://127.0.0.1:{port}"),
		};

		let mut last_error = "endpoint not reachable".to_string();
		for _ in 0..READY_ATTEMPTS {
			tokio::time::sleep(READY_INTERVAL).await;

			if let Ok(Some(status)) = process.child.try_wait() {
				return Err(RuntimeError::Launch {
					path: path.display().to_string(),
					message: format!("driver exited before becoming ready (status: {status})"),
				});
			}

			match probe_status(&process.endpoint).await {
				Ok(status) if status.ready => return Ok(process),
				Ok(status) => last_error = status.message,
				Err(e) => last_error = e.to_string(),
			}
		}

		process.shutdown();
		Err(RuntimeError::NotReady { port, message: last_error })
	}

	/// Base URL of the WebDriver HTTP endpoint.
	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	pub fn pid(&self) -> u32 {
		self.child.id()
	}

	/// Returns `true` while the child process is still running.
	pub fn is_running(&mut self) -> bool {
		matches!(self.child.try_wait(), Ok(None)) && pid_is_alive(self.pid())
	}

	/// Kills the driver together with the browsers it started. The driver
	/// leads its own process group, so the group shares its pid.
	fn shutdown(&mut self) {
		if !matches!(self.child.try_wait(), Ok(None)) {
			return;
		}

		#[cfg(unix)]
		{
			if kill_group(self.pid()) {
				let _ = self.child.wait();
				return;
			}
		}

		if let Err(e) = self.child.kill() {
			warn!(target = "autoreg.driver", pid = self.pid(), error = %e, "failed to kill driver");
		}
		let _ = self.child.wait();
	}
}

impl Drop for DriverProcess {
	fn drop(&mut self) {
		self.shutdown();
	}
}

#[cfg(unix)]
fn kill_group(pgid: u32) -> bool {
	match Command::new("kill")
		.args(["-KILL", "--", &format!("-{pgid}")])
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.status()
	{
		Ok(status) if status.success() => true,
		Ok(_) => {
			debug!(target = "autoreg.driver", pgid, "kill -KILL on process group returned non-zero");
			false
		}
		Err(e) => {
			debug!(target = "autoreg.driver", pgid, error = %e, "failed to signal process group");
			false
		}
	}
}

fn resolve_candidate(path: &Path) -> Result<PathBuf> {
	if path.components().count() > 1 || path.is_absolute() {
		if path.exists() {
			return Ok(path.to_path_buf());
		}
		return Err(RuntimeError::DriverNotFound(path.display().to_string()));
	}
	which::which(path).map_err(|_| RuntimeError::DriverNotFound(path.display().to_string()))
}

/// Fetches `GET /status` from a WebDriver endpoint.
pub async fn probe_status(endpoint: &str) -> Result<StatusValue> {
	let url = format!("{}/status", endpoint.trim_end_matches('/'));
	let client = reqwest::Client::builder()
		.timeout(Duration::from_millis(400))
		.build()
		.map_err(|e| RuntimeError::Http {
			url: url.clone(),
			message: e.to_string(),
		})?;

	let response = client.get(&url).send().await.map_err(|e| RuntimeError::Http {
		url: url.clone(),
		message: e.to_string(),
	})?;
	if !response.status().is_success() {
		return Err(RuntimeError::Http {
			message: format!("unexpected status {}", response.status()),
			url,
		});
	}

	let envelope: Envelope<StatusValue> = response
		.json()
		.await
		.map_err(|e| RuntimeError::Protocol(format!("status response: {e}")))?;
	Ok(envelope.value)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_explicit_path_is_reported() {
		let err = DriverProcess::locate(Some(Path::new("/definitely/not/here/chromedriver"))).unwrap_err();
		assert!(matches!(err, RuntimeError::DriverNotFound(p) if p.contains("/definitely/not/here")));
	}

	#[tokio::test]
	async fn launch_refuses_busy_port() {
		let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
		let port = listener.local_addr().unwrap().port();
		let err = DriverProcess::launch(Path::new("chromedriver"), port).await.err().unwrap();
		assert!(matches!(err, RuntimeError::Launch { message, .. } if message.contains("already in use")));
	}

	#[cfg(target_os = "linux")]
	#[test]
	fn drop_kills_the_whole_process_group() {
		use std::io::{BufRead, BufReader};

		// Zombies still have a /proc entry until reaped.
		fn running(pid: u32) -> bool {
			std::fs::read_to_string(format!("/proc/{pid}/stat"))
				.ok()
				.and_then(|stat| stat.rsplit(')').next().and_then(|rest| rest.trim_start().chars().next()))
				.is_some_and(|state| state != 'Z')
		}

		let mut cmd = Command::new("sh");
		cmd.args(["-c", "sleep 30 & echo $!; wait"]).stdout(Stdio::piped());
		std::os::unix::process::CommandExt::process_group(&mut cmd, 0);
		let mut child = cmd.spawn().unwrap();

		let mut line = String::new();
		BufReader::new(child.stdout.take().unwrap()).read_line(&mut line).unwrap();
		let browser: u32 = line.trim().parse().unwrap();
		assert!(running(browser));

		drop(DriverProcess {
			child,
			port: 0,
			endpoint: String::new(),
		});

		let deadline = std::time::Instant::now() + Duration::from_secs(2);
		while running(browser) && std::time::Instant::now() < deadline {
			std::thread::sleep(Duration::from_millis(20));
		}
		assert!(!running(browser), "grandchild {browser} survived driver shutdown");
	}

	#[tokio::test]
	async fn probe_reports_unreachable_endpoint() {
		let port = crate::process::first_free_port(39_500, 200).unwrap();
		let err = probe_status(&format!("http://127.0.0.1:{port}")).await.unwrap_err();
		assert!(matches!(err, RuntimeError::Http { .. }));
	}
}
