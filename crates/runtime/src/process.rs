//! Port and pid helpers for supervising the local WebDriver process.

/// Returns `true` when `port` can be bound on localhost.
pub fn port_available(port: u16) -> bool {
	std::net::TcpListener::bind(("127.0.0.1", port)).is_ok()
}

/// First bindable port in `start..start + span`, if any.
pub fn first_free_port(start: u16, span: u16) -> Option<u16> {
	(0..span).filter_map(|offset| start.checked_add(offset)).find(|port| port_available(*port))
}

/// Returns `true` when a process with `pid` appears alive.
pub fn pid_is_alive(pid: u32) -> bool {
	if pid == 0 {
		return false;
	}

	#[cfg(target_os = "linux")]
	{
		std::path::Path::new("/proc").join(pid.to_string()).exists()
	}

	#[cfg(all(unix, not(target_os = "linux")))]
	{
		std::process::Command::new("kill")
			.arg("-0")
			.arg(pid.to_string())
			.stdout(std::process::Stdio::null())
			.stderr(std::process::Stdio::null())
			.status()
			.map(|status| status.success())
			.unwrap_or(pid == std::process::id())
	}

	#[cfg(not(unix))]
	{
		let filter = format!("PID eq {pid}");
		std::process::Command::new("tasklist")
			.args(["/FI", &filter, "/FO", "CSV", "/NH"])
			.output()
			.map(|out| csv_lists_pid(&String::from_utf8_lossy(&out.stdout), pid))
			.unwrap_or(pid == std::process::id())
	}
}

#[cfg(any(test, not(unix)))]
fn csv_lists_pid(output: &str, pid: u32) -> bool {
	let wanted = pid.to_string();
	output
		.lines()
		.filter_map(|line| line.trim().strip_prefix('"'))
		.any(|line| line.split("\",\"").nth(1) == Some(wanted.as_str()))
}
