use autoreg_cli::{cli::Cli, logging, output, run};
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	match run::run(cli).await {
		Ok(state) => output::print_summary(&state),
		Err(err) => {
			error!(target = "autoreg", "{err:#}");
			std::process::exit(1);
		}
	}
}
