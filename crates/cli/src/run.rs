//! One end-to-end registration run: driver launch, login, term, loop.

use anyhow::Result;
use autoreg::{
	AppConfig, CourseRequest, Credentials, Error, PortalDriver, RegistrationLoop, ResultClassifier, RunState,
	SessionManager, TermCode, TermSelector, WebDriverPortal,
};
use autoreg_protocol::Capabilities;
use autoreg_runtime::{DriverProcess, WebDriverClient, process};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cli::Cli;

pub async fn run(cli: Cli) -> Result<RunState> {
	let config = load_config(&cli)?;
	let classifier = ResultClassifier::new(&config.phrases).map_err(Error::from)?;
	let requests = cli.course_requests();
	let credentials = cli.credentials();

	let (cancel, shutdown) = watch::channel(false);
	let interrupt = tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			warn!(target = "autoreg", "interrupt received, stopping at the next cycle boundary");
			let _ = cancel.send(true);
		}
	});

	let driver_path = DriverProcess::locate(cli.driver.as_deref()).map_err(Error::from)?;
	let port = driver_port(cli.driver_port);
	info!(target = "autoreg", driver = %driver_path.display(), port, "starting chromedriver");
	let mut driver = DriverProcess::launch(&driver_path, port).await.map_err(Error::from)?;

	let client = WebDriverClient::new_session(driver.endpoint(), Capabilities::chrome(cli.show))
		.await
		.map_err(Error::from)?;
	debug!(target = "autoreg", session = client.session_id(), headless = !cli.show, "browser session opened");
	let browser = client.clone();
	let portal = WebDriverPortal::new(client, config.portal.selectors.clone());

	let plan = Plan {
		config: &config,
		term: cli.term,
		requests: &requests,
		credentials: &credentials,
	};
	let outcome = plan.execute(portal, classifier, shutdown).await;
	interrupt.abort();

	if outcome.is_err() && !driver.is_running() {
		warn!(target = "autoreg", pid = driver.pid(), "chromedriver exited during the run");
	}
	if let Err(e) = browser.delete_session().await {
		warn!(target = "autoreg", error = %e, "failed to close browser session");
	}
	drop(driver);

	Ok(outcome?)
}

/// Everything a run needs besides the browser.
struct Plan<'a> {
	config: &'a AppConfig,
	term: Option<TermCode>,
	requests: &'a [CourseRequest],
	credentials: &'a Credentials,
}

impl Plan<'_> {
	/// Login, term selection, then the registration loop. An interrupt before
	/// the loop starts abandons setup and reports a cancelled run.
	async fn execute<D: PortalDriver>(
		&self,
		portal: D,
		classifier: ResultClassifier,
		mut shutdown: watch::Receiver<bool>,
	) -> Result<RunState, Error> {
		let config = self.config;
		let setup = async {
			let mut session = SessionManager::new(&config.portal, &config.timing)
				.login(portal, self.credentials)
				.await?;
			TermSelector::new(&config.portal, &config.timing)
				.select_term(&mut session, self.term)
				.await?;
			Ok::<_, Error>(session)
		};

		let mut session = tokio::select! {
			session = setup => session?,
			() = interrupted(shutdown.clone()) => {
				warn!(target = "autoreg", "interrupted before registration started");
				return Ok(RunState::interrupted(self.requests));
			}
		};

		let state = RegistrationLoop::new(config, classifier)
			.run(&mut session, self.requests, self.credentials, &mut shutdown)
			.await?;
		Ok(state)
	}
}

/// Resolves once `shutdown` reads `true`. A dropped sender never resolves.
async fn interrupted(mut shutdown: watch::Receiver<bool>) {
	if shutdown.wait_for(|stop| *stop).await.is_err() {
		std::future::pending::<()>().await;
	}
}

/// `requested` when free, else the next free port above it.
fn driver_port(requested: u16) -> u16 {
	if process::port_available(requested) {
		return requested;
	}
	match process::first_free_port(requested.saturating_add(1), 32) {
		Some(port) => {
			warn!(target = "autoreg", requested, port, "driver port busy, using another");
			port
		}
		None => requested,
	}
}

/// Resolves the configuration file and applies command-line overrides.
pub fn load_config(cli: &Cli) -> Result<AppConfig> {
	let mut config = AppConfig::discover(cli.config.as_deref()).map_err(Error::from)?;
	if let Some(max) = cli.max_cycles {
		config.timing.max_cycles = Some(max);
	}
	config.validate().map_err(Error::from)?;
	Ok(config)
}
