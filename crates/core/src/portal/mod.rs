//! The browser capability the core logic runs on.
//!
//! Components address page elements only through semantic [`Locator`] roles
//! ("CRN field 2", "registration submit"). Mapping those roles onto markup is
//! the driver's job, so portal markup changes stay out of the state machine.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::DriverError;
use crate::term::TermOption;
use crate::types::Crn;

pub mod webdriver;

#[cfg(test)]
pub(crate) mod fake;

/// Interval between condition checks in [`PortalDriver::wait_until`].
pub const POLL_EVERY: Duration = Duration::from_millis(250);

/// Semantic role of a page element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
	Username,
	Password,
	LoginSubmit,
	/// Every challenge option, in presentation order.
	ChallengeButtons,
	/// The challenge option at a 0-based position.
	ChallengeButton(usize),
	/// Element that only exists once the post-login landing page is reached.
	LandingMarker,
	TermDropdown,
	TermSubmit,
	/// CRN input for a 1-based request slot.
	CrnField(usize),
	RegistrationSubmit,
	RegistrationReset,
	/// Region rendered once a registration submission has been processed.
	ResultRegion,
	ErrorIndicator,
	/// Status text the portal shows for one course after a submission.
	CourseStatus(Crn),
}

impl fmt::Display for Locator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Username => f.write_str("username field"),
			Self::Password => f.write_str("password field"),
			Self::LoginSubmit => f.write_str("login submit"),
			Self::ChallengeButtons => f.write_str("challenge options"),
			Self::ChallengeButton(i) => write!(f, "challenge option {i}"),
			Self::LandingMarker => f.write_str("landing marker"),
			Self::TermDropdown => f.write_str("term dropdown"),
			Self::TermSubmit => f.write_str("term submit"),
			Self::CrnField(slot) => write!(f, "CRN field {slot}"),
			Self::RegistrationSubmit => f.write_str("registration submit"),
			Self::RegistrationReset => f.write_str("registration reset"),
			Self::ResultRegion => f.write_str("result region"),
			Self::ErrorIndicator => f.write_str("error indicator"),
			Self::CourseStatus(crn) => write!(f, "status of CRN {crn}"),
		}
	}
}

/// Something [`PortalDriver::wait_until`] can wait for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
	Present(Locator),
	LocationContains(String),
}

/// Browser-level interaction with the registration portal.
///
/// Reads take `&self`; anything that changes page state takes `&mut self`, so
/// a borrowed session can only be inspected, never driven.
#[async_trait]
pub trait PortalDriver: Send + Sync {
	async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

	async fn current_location(&self) -> Result<String, DriverError>;

	/// Value (inputs) or text (everything else) of `locator`; `None` when absent.
	async fn read_field(&self, locator: &Locator) -> Result<Option<String>, DriverError>;

	/// Replaces the value of an input. An empty `value` clears it.
	async fn write_field(&mut self, locator: &Locator, value: &str) -> Result<(), DriverError>;

	async fn click(&mut self, locator: &Locator) -> Result<(), DriverError>;

	/// Number of elements currently matching `locator`.
	async fn count(&self, locator: &Locator) -> Result<usize, DriverError>;

	async fn is_present(&self, locator: &Locator) -> Result<bool, DriverError> {
		Ok(self.count(locator).await? > 0)
	}

	/// Options of a dropdown, in document order.
	async fn options(&self, locator: &Locator) -> Result<Vec<TermOption>, DriverError>;

	async fn select_option(&mut self, locator: &Locator, value: &str) -> Result<(), DriverError>;

	async fn holds(&self, condition: &Condition) -> Result<bool, DriverError> {
		match condition {
			Condition::Present(locator) => self.is_present(locator).await,
			Condition::LocationContains(fragment) => Ok(self.current_location().await?.contains(fragment.as_str())),
		}
	}

	/// Polls `condition` until it holds or `timeout` elapses. Returns whether it held.
	async fn wait_until(&self, condition: &Condition, timeout: Duration) -> Result<bool, DriverError> {
		let deadline = Instant::now() + timeout;
		loop {
			if self.holds(condition).await? {
				return Ok(true);
			}
			let now = Instant::now();
			if now >= deadline {
				return Ok(false);
			}
			tokio::time::sleep(POLL_EVERY.min(deadline - now)).await;
		}
	}
}
