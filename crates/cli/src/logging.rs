use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
	tracing_subscriber::fmt().with_env_filter(filter).with_target(verbose > 0).init();
}

fn default_directive(verbose: u8) -> &'static str {
	match verbose {
		0 => "autoreg=info",
		1 => "autoreg=debug",
		_ => "trace",
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verbosity_widens_the_filter() {
		assert_eq!(default_directive(0), "autoreg=info");
		assert_eq!(default_directive(1), "autoreg=debug");
		assert_eq!(default_directive(2), "trace");
		assert_eq!(default_directive(7), "trace");
	}
}
