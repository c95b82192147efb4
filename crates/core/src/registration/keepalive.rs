//! Idle-timer reset for the registration page.

use tracing::{debug, warn};

use crate::config::PortalConfig;
use crate::portal::{Locator, PortalDriver};
use crate::session::Session;

/// Clicks the form's reset control so the portal sees activity without a
/// registration attempt. On any other page this is a logged no-op.
pub async fn reset_idle<D: PortalDriver>(session: &mut Session<D>, portal: &PortalConfig) {
	let location = match session.driver().current_location().await {
		Ok(location) => location,
		Err(e) => {
			warn!(target = "autoreg.registration", error = %e, "keep-alive skipped: location unavailable");
			return;
		}
	};

	if !portal.is_registration_page(&location) {
		warn!(target = "autoreg.registration", %location, "trying to keep unknown page active");
		return;
	}

	match session.driver_mut().click(&Locator::RegistrationReset).await {
		Ok(()) => debug!(target = "autoreg.registration", "idle timer reset"),
		Err(e) => warn!(target = "autoreg.registration", error = %e, "keep-alive click failed"),
	}
}
