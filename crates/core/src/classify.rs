//! Maps the page state after a submission to a per-course outcome.

use regex_lite::Regex;
use tracing::{debug, trace};

use crate::config::{PhraseTable, PortalConfig};
use crate::error::ConfigError;
use crate::portal::{Locator, PortalDriver};
use crate::session::Session;
use crate::types::{AttemptOutcome, Crn};

/// Phrase matcher over a course's status text.
///
/// Precedence is fixed: invalid, registered, waitlist, closed. A status like
/// "Closed - 3 Waitlisted" therefore reads as a waitlist offer.
#[derive(Debug, Clone)]
pub struct ResultClassifier {
	rules: Vec<(AttemptOutcome, Regex)>,
}

impl ResultClassifier {
	pub fn new(phrases: &PhraseTable) -> Result<Self, ConfigError> {
		let mut rules = Vec::with_capacity(4);
		for (outcome, list) in [
			(AttemptOutcome::InvalidCrn, &phrases.invalid),
			(AttemptOutcome::Registered, &phrases.registered),
			(AttemptOutcome::Waitlisted, &phrases.waitlist),
			(AttemptOutcome::Closed, &phrases.closed),
		] {
			if let Some(regex) = compile(list)? {
				rules.push((outcome, regex));
			}
		}
		Ok(Self { rules })
	}

	/// Outcome named by `text`, if any phrase matches.
	pub fn outcome_for(&self, text: &str) -> Option<AttemptOutcome> {
		self.rules.iter().find(|(_, regex)| regex.is_match(text)).map(|(outcome, _)| *outcome)
	}

	/// Reads back the outcome for `crn` without touching the page.
	///
	/// Anything other than a recognizable status on the registration page is
	/// a [`AttemptOutcome::TransientError`]: wrong page, portal error banner,
	/// missing status, unknown phrase, or a driver failure.
	pub async fn classify<D: PortalDriver>(&self, session: &Session<D>, portal: &PortalConfig, crn: &Crn) -> AttemptOutcome {
		let driver = session.driver();

		match driver.current_location().await {
			Ok(location) if portal.is_registration_page(&location) => {}
			Ok(location) => {
				debug!(target = "autoreg.classify", %crn, %location, "not on registration page");
				return AttemptOutcome::TransientError;
			}
			Err(e) => {
				debug!(target = "autoreg.classify", %crn, error = %e, "location unavailable");
				return AttemptOutcome::TransientError;
			}
		}

		let status = match driver.read_field(&Locator::CourseStatus(crn.clone())).await {
			Ok(Some(text)) if !text.trim().is_empty() => text,
			Ok(_) => {
				if driver.is_present(&Locator::ErrorIndicator).await.unwrap_or(false) {
					debug!(target = "autoreg.classify", %crn, "portal error indicator present");
				}
				return AttemptOutcome::TransientError;
			}
			Err(e) => {
				debug!(target = "autoreg.classify", %crn, error = %e, "status unavailable");
				return AttemptOutcome::TransientError;
			}
		};

		trace!(target = "autoreg.classify", %crn, %status, "status text");
		self.outcome_for(&status).unwrap_or(AttemptOutcome::TransientError)
	}
}

fn compile(phrases: &[String]) -> Result<Option<Regex>, ConfigError> {
	let alternatives: Vec<String> = phrases
		.iter()
		.map(|p| p.trim())
		.filter(|p| !p.is_empty())
		.map(|p| {
			// Anchor at a word start so "registered" does not match "unregistered".
			let boundary = if p.starts_with(|c: char| c.is_alphanumeric()) { r"\b" } else { "" };
			format!("{boundary}{}", regex_lite::escape(p))
		})
		.collect();
	if alternatives.is_empty() {
		return Ok(None);
	}

	let pattern = format!("(?i)(?:{})", alternatives.join("|"));
	Regex::new(&pattern).map(Some).map_err(|e| ConfigError::Pattern {
		phrase: phrases.join(", "),
		message: e.to_string(),
	})
}
