//! Authenticated portal sessions.

use tracing::{debug, info, warn};

use crate::config::{PortalConfig, TimingConfig};
use crate::error::AuthError;
use crate::portal::{Condition, Locator, PortalDriver};
use crate::term::TermCode;
use crate::types::Credentials;

/// Exclusive handle on the browser plus what the portal currently knows
/// about us. Only [`SessionManager`] flips `authenticated`; only
/// [`TermSelector`](crate::TermSelector) sets the term.
pub struct Session<D> {
	driver: D,
	authenticated: bool,
	term: Option<TermCode>,
}

impl<D: PortalDriver> Session<D> {
	fn new(driver: D) -> Self {
		Self {
			driver,
			authenticated: false,
			term: None,
		}
	}

	pub fn driver(&self) -> &D {
		&self.driver
	}

	pub fn driver_mut(&mut self) -> &mut D {
		&mut self.driver
	}

	pub fn is_authenticated(&self) -> bool {
		self.authenticated
	}

	pub fn term(&self) -> Option<TermCode> {
		self.term
	}

	/// Authenticated with a committed term: the precondition for registration.
	pub fn is_ready(&self) -> bool {
		self.authenticated && self.term.is_some()
	}

	pub(crate) fn set_term(&mut self, term: TermCode) {
		self.term = Some(term);
	}
}

/// Performs the credential login and multi-factor handshake.
pub struct SessionManager<'a> {
	portal: &'a PortalConfig,
	timing: &'a TimingConfig,
}

impl<'a> SessionManager<'a> {
	pub fn new(portal: &'a PortalConfig, timing: &'a TimingConfig) -> Self {
		Self { portal, timing }
	}

	/// Logs in on `driver` and returns an authenticated session without a term.
	/// The driver is left on the post-login landing page.
	pub async fn login<D: PortalDriver>(&self, driver: D, credentials: &Credentials) -> Result<Session<D>, AuthError> {
		let mut session = Session::new(driver);
		session.driver_mut().navigate(self.portal.login_url.as_str()).await?;
		self.handshake(&mut session, credentials).await?;
		Ok(session)
	}

	/// Re-establishes an existing session. The term is kept.
	///
	/// When the single sign-on session is still alive the login URL lands
	/// straight on the landing page, and the credentials are not re-entered.
	pub async fn reauthenticate<D: PortalDriver>(
		&self,
		session: &mut Session<D>,
		credentials: &Credentials,
	) -> Result<(), AuthError> {
		warn!(target = "autoreg.session", user = %credentials.username(), "re-authenticating");
		session.authenticated = false;

		let driver = session.driver_mut();
		driver.navigate(self.portal.login_url.as_str()).await?;
		if driver.is_present(&Locator::LandingMarker).await? {
			info!(target = "autoreg.session", user = %credentials.username(), "single sign-on still active");
			session.authenticated = true;
			return Ok(());
		}
		self.handshake(session, credentials).await
	}

	/// Credential and challenge steps. Expects the driver on the login page.
	async fn handshake<D: PortalDriver>(&self, session: &mut Session<D>, credentials: &Credentials) -> Result<(), AuthError> {
		let factor = credentials.factor();
		let driver = session.driver_mut();

		debug!(target = "autoreg.session", user = %credentials.username(), "submitting credentials");
		driver.write_field(&Locator::Username, credentials.username()).await?;
		driver.write_field(&Locator::Password, credentials.password()).await?;
		driver.click(&Locator::LoginSubmit).await?;

		let challenge = Locator::ChallengeButton(factor.position());
		let offered = driver
			.wait_until(&Condition::Present(challenge.clone()), self.timing.challenge_ready_timeout())
			.await?;
		if !offered {
			let offered = driver.count(&Locator::ChallengeButtons).await.unwrap_or(0);
			return Err(AuthError::ChallengeUnavailable { factor, offered });
		}
		driver.click(&challenge).await?;
		info!(target = "autoreg.session", %factor, "{factor} authentication requested. Please verify login attempt.");

		let landed = driver
			.wait_until(&Condition::Present(Locator::LandingMarker), self.timing.auth_timeout())
			.await?;
		if !landed {
			return Err(AuthError::Timeout {
				secs: self.timing.auth_timeout_secs,
			});
		}

		session.authenticated = true;
		info!(target = "autoreg.session", user = %credentials.username(), "Logged in.");
		Ok(())
	}
}
