//! Scripted in-memory portal for exercising the state machine without a browser.
//!
//! The fake models just enough of the portal: a login page whose submit
//! reveals the challenge options, a landing page reached once the chosen
//! option is "approved", a term dropdown, and a registration form whose
//! submit pops the next scripted [`Readback`].

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use url::Url;

use super::{Locator, PortalDriver};
use crate::config::PortalConfig;
use crate::error::DriverError;
use crate::term::TermOption;

const LANDING_URL: &str = "https://sso.sis.gatech.edu/ssomanager/c/SSB";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
	Navigate(String),
	Write(Locator, String),
	Click(Locator),
	Select(String),
}

/// What the portal shows after one registration submit.
#[derive(Debug, Clone)]
pub(crate) enum Readback {
	/// Status text per CRN on the registration page.
	Statuses(HashMap<String, String>),
	/// Redirect to the login page, as when the portal session times out.
	Expired,
}

impl Readback {
	pub(crate) fn statuses(pairs: &[(&str, &str)]) -> Self {
		Self::Statuses(pairs.iter().map(|(crn, text)| (crn.to_string(), text.to_string())).collect())
	}
}

pub(crate) struct FakePortal {
	portal: PortalConfig,
	location: String,
	challenge_buttons: usize,
	/// Remaining approvals; `None` approves every challenge.
	approvals_left: Option<usize>,
	challenge_shown: bool,
	landed: bool,
	/// Whether the login URL redirects to the landing page once approved.
	keep_sso: bool,
	sso_active: bool,
	terms: Vec<TermOption>,
	selected: Option<String>,
	fields: HashMap<Locator, String>,
	readbacks: VecDeque<Readback>,
	statuses: Option<HashMap<String, String>>,
	actions: Vec<Action>,
	submissions: Vec<Vec<String>>,
	logins: usize,
}

impl FakePortal {
	pub(crate) fn new(portal: &PortalConfig) -> Self {
		Self {
			portal: portal.clone(),
			location: "about:blank".into(),
			challenge_buttons: 3,
			approvals_left: None,
			challenge_shown: false,
			landed: false,
			keep_sso: false,
			sso_active: false,
			terms: Vec::new(),
			selected: None,
			fields: HashMap::new(),
			readbacks: VecDeque::new(),
			statuses: None,
			actions: Vec::new(),
			submissions: Vec::new(),
			logins: 0,
		}
	}

	pub(crate) fn with_challenge_buttons(mut self, count: usize) -> Self {
		self.challenge_buttons = count;
		self
	}

	/// The operator never approves the challenge.
	pub(crate) fn never_approve(self) -> Self {
		self.approve_times(0)
	}

	/// Only the first `n` challenges get approved.
	pub(crate) fn approve_times(mut self, n: usize) -> Self {
		self.approvals_left = Some(n);
		self
	}

	fn take_approval(&mut self) -> bool {
		match self.approvals_left.as_mut() {
			None => true,
			Some(0) => false,
			Some(n) => {
				*n -= 1;
				true
			}
		}
	}

	/// An approved login stays valid: revisiting the login URL lands directly
	/// until the portal session expires.
	pub(crate) fn keep_sso(mut self) -> Self {
		self.keep_sso = true;
		self
	}

	pub(crate) fn with_terms(mut self, terms: Vec<TermOption>) -> Self {
		self.terms = terms;
		self
	}

	pub(crate) fn with_readbacks(mut self, readbacks: impl IntoIterator<Item = Readback>) -> Self {
		self.readbacks.extend(readbacks);
		self
	}

	pub(crate) fn actions(&self) -> &[Action] {
		&self.actions
	}

	/// CRNs present in the form at each registration submit.
	pub(crate) fn submissions(&self) -> &[Vec<String>] {
		&self.submissions
	}

	pub(crate) fn logins(&self) -> usize {
		self.logins
	}

	fn on_login_page(&self) -> bool {
		self.location == self.portal.login_url.as_str()
	}

	fn on_registration_page(&self) -> bool {
		self.portal.is_registration_page(&self.location)
	}

	fn on_form(&self) -> bool {
		self.on_registration_page()
			&& Url::parse(&self.location).is_ok_and(|url| url.query_pairs().any(|(key, _)| key == "term_in"))
	}

	fn on_term_page(&self) -> bool {
		self.on_registration_page() && !self.on_form()
	}

	fn missing(locator: &Locator) -> DriverError {
		DriverError::NotFound {
			locator: locator.to_string(),
		}
	}

	fn submit_registration(&mut self) {
		let mut filled: Vec<(usize, String)> = self
			.fields
			.iter()
			.filter_map(|(locator, value)| match locator {
				Locator::CrnField(slot) if !value.is_empty() => Some((*slot, value.clone())),
				_ => None,
			})
			.collect();
		filled.sort();
		self.submissions.push(filled.into_iter().map(|(_, crn)| crn).collect());
		self.fields.clear();

		match self.readbacks.pop_front() {
			Some(Readback::Statuses(statuses)) => self.statuses = Some(statuses),
			Some(Readback::Expired) => {
				self.statuses = None;
				self.sso_active = false;
				self.location = self.portal.login_url.to_string();
			}
			None => self.statuses = Some(HashMap::new()),
		}
	}
}

#[async_trait]
impl PortalDriver for FakePortal {
	async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
		self.actions.push(Action::Navigate(url.to_string()));
		self.location = url.to_string();
		self.statuses = None;
		self.fields.clear();
		if self.on_login_page() {
			self.challenge_shown = false;
			self.landed = self.keep_sso && self.sso_active;
			if self.landed {
				self.location = LANDING_URL.to_string();
			}
		}
		Ok(())
	}

	async fn current_location(&self) -> Result<String, DriverError> {
		Ok(self.location.clone())
	}

	async fn read_field(&self, locator: &Locator) -> Result<Option<String>, DriverError> {
		Ok(match locator {
			Locator::CourseStatus(crn) => self.statuses.as_ref().and_then(|s| s.get(crn.as_str()).cloned()),
			other => self.fields.get(other).cloned(),
		})
	}

	async fn write_field(&mut self, locator: &Locator, value: &str) -> Result<(), DriverError> {
		let writable = match locator {
			Locator::Username | Locator::Password => self.on_login_page(),
			Locator::CrnField(_) => self.on_form(),
			_ => false,
		};
		if !writable {
			return Err(Self::missing(locator));
		}
		self.actions.push(Action::Write(locator.clone(), value.to_string()));
		self.fields.insert(locator.clone(), value.to_string());
		Ok(())
	}

	async fn click(&mut self, locator: &Locator) -> Result<(), DriverError> {
		if self.count(locator).await? == 0 {
			return Err(Self::missing(locator));
		}
		self.actions.push(Action::Click(locator.clone()));

		match locator {
			Locator::LoginSubmit => {
				self.logins += 1;
				self.challenge_shown = true;
			}
			Locator::ChallengeButton(_) if self.take_approval() => {
				self.challenge_shown = false;
				self.landed = true;
				self.sso_active = true;
				self.location = LANDING_URL.to_string();
			}
			Locator::TermSubmit => {
				let term = self.selected.clone().unwrap_or_default();
				let mut url = self.portal.registration_url.clone();
				url.query_pairs_mut().append_pair("term_in", &term);
				self.location = url.to_string();
			}
			Locator::RegistrationSubmit => self.submit_registration(),
			Locator::RegistrationReset => self.fields.clear(),
			_ => {}
		}
		Ok(())
	}

	async fn count(&self, locator: &Locator) -> Result<usize, DriverError> {
		let present = match locator {
			Locator::Username | Locator::Password | Locator::LoginSubmit => self.on_login_page(),
			Locator::ChallengeButtons => return Ok(if self.challenge_shown { self.challenge_buttons } else { 0 }),
			Locator::ChallengeButton(i) => self.challenge_shown && *i < self.challenge_buttons,
			Locator::LandingMarker => self.landed && self.location == LANDING_URL,
			Locator::TermDropdown => self.on_term_page() && !self.terms.is_empty(),
			Locator::TermSubmit => self.on_term_page(),
			Locator::CrnField(_) | Locator::RegistrationSubmit | Locator::RegistrationReset => self.on_form(),
			Locator::ResultRegion => self.on_form() && self.statuses.is_some(),
			Locator::ErrorIndicator => false,
			Locator::CourseStatus(crn) => self.statuses.as_ref().is_some_and(|s| s.contains_key(crn.as_str())),
		};
		Ok(usize::from(present))
	}

	async fn options(&self, locator: &Locator) -> Result<Vec<TermOption>, DriverError> {
		if self.count(locator).await? == 0 {
			return Err(Self::missing(locator));
		}
		Ok(self.terms.clone())
	}

	async fn select_option(&mut self, locator: &Locator, value: &str) -> Result<(), DriverError> {
		if !self.terms.iter().any(|t| t.value == value) {
			return Err(Self::missing(locator));
		}
		self.actions.push(Action::Select(value.to_string()));
		self.selected = Some(value.to_string());
		Ok(())
	}
}
