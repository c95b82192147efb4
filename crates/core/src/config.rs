//! Run configuration loaded from `config.json`.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Lookup order: `--config <file>`, then
//! `~/.config/autoreg/config.json` when it exists, then built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::portal::Locator;
use crate::term::TermCode;
use crate::types::Crn;

const LOGIN_URL: &str =
	"https://login.gatech.edu/cas/login?service=https%3A%2F%2Fsso.sis.gatech.edu%3A443%2Fssomanager%2Fc%2FSSB";
const REGISTRATION_URL: &str = "https://oscar.gatech.edu/bprod/bwskfreg.P_AltPin";
const DETAIL_URL: &str = "https://oscar.gatech.edu/bprod/bwckschd.p_disp_detail_sched?term_in={term}&crn_in={crn}";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
	pub portal: PortalConfig,
	pub timing: TimingConfig,
	pub phrases: PhraseTable,
}

impl AppConfig {
	/// Loads and validates the configuration at `path`.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})?;
		config.validate()?;
		Ok(config)
	}

	/// Resolves the configuration for a run: `explicit` wins, then the user
	/// config file if present, then defaults.
	pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
		if let Some(path) = explicit {
			return Self::load(path);
		}
		match default_path() {
			Some(path) if path.is_file() => Self::load(&path),
			_ => Ok(Self::default()),
		}
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.timing.keepalive_interval_secs == 0 {
			return Err(ConfigError::Invalid("timing.keepaliveIntervalSecs must be at least 1".into()));
		}
		if self.timing.reauth_after == 0 {
			return Err(ConfigError::Invalid("timing.reauthAfter must be at least 1".into()));
		}
		if self.timing.max_cycles == Some(0) {
			return Err(ConfigError::Invalid("timing.maxCycles must be at least 1 when set".into()));
		}
		if !self.portal.selectors.crn_field.contains("{slot}") {
			return Err(ConfigError::Invalid("portal.selectors.crnField must contain `{slot}`".into()));
		}
		if !self.portal.selectors.course_status.contains("{crn}") {
			return Err(ConfigError::Invalid("portal.selectors.courseStatus must contain `{crn}`".into()));
		}
		Ok(())
	}
}

/// `~/.config/autoreg/config.json`
pub fn default_path() -> Option<PathBuf> {
	dirs::home_dir().map(|home| home.join(".config").join("autoreg").join("config.json"))
}

/// Portal endpoints and element selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortalConfig {
	pub login_url: Url,
	/// Registration entry point; presents the term dropdown without `term_in`.
	pub registration_url: Url,
	/// Section detail page with `{term}` and `{crn}` placeholders.
	pub detail_url: String,
	pub selectors: SelectorConfig,
}

impl Default for PortalConfig {
	fn default() -> Self {
		Self {
			login_url: Url::parse(LOGIN_URL).expect("built-in login URL should parse"),
			registration_url: Url::parse(REGISTRATION_URL).expect("built-in registration URL should parse"),
			detail_url: DETAIL_URL.to_string(),
			selectors: SelectorConfig::default(),
		}
	}
}

impl PortalConfig {
	/// Registration form URL parameterized by `term`.
	pub fn registration_url_for(&self, term: TermCode) -> Url {
		let mut url = self.registration_url.clone();
		url.query_pairs_mut().append_pair("term_in", &term.to_string());
		url
	}

	/// Whether `location` is the registration page (any query string).
	pub fn is_registration_page(&self, location: &str) -> bool {
		let Ok(location) = Url::parse(location) else {
			return false;
		};
		location.host_str() == self.registration_url.host_str() && location.path() == self.registration_url.path()
	}

	/// Detail page for one section.
	pub fn detail_url(&self, term: TermCode, crn: &Crn) -> String {
		self.detail_url.replace("{term}", &term.to_string()).replace("{crn}", crn.as_str())
	}
}

/// Markup selectors behind each [`Locator`] role. Selectors starting with `/`
/// or `(` are XPath, everything else is CSS.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectorConfig {
	pub username: String,
	pub password: String,
	pub login_submit: String,
	/// Frame hosting the challenge options, when the portal embeds one.
	pub challenge_frame: Option<String>,
	pub challenge_buttons: String,
	pub landing_marker: String,
	pub term_dropdown: String,
	pub term_submit: String,
	/// Contains `{slot}`, replaced by the 1-based slot number.
	pub crn_field: String,
	pub registration_submit: String,
	pub registration_reset: String,
	pub result_region: String,
	pub error_indicator: String,
	/// Contains `{crn}`, replaced by the course's CRN.
	pub course_status: String,
}

impl Default for SelectorConfig {
	fn default() -> Self {
		Self {
			username: "#username".into(),
			password: "#password".into(),
			login_submit: "[name='submit']".into(),
			challenge_frame: Some("#duo_iframe".into()),
			challenge_buttons: "button[type='submit']".into(),
			landing_marker: "[name='StuWeb-MainMenuLink']".into(),
			term_dropdown: "#term_id".into(),
			term_submit: "form input[type='submit']".into(),
			crn_field: "#crn_id{slot}".into(),
			registration_submit: "input[type='submit'][value='Submit Changes']".into(),
			registration_reset: "input[type='reset']".into(),
			result_region: "table.datadisplaytable".into(),
			error_indicator: "span.errortext".into(),
			course_status: "//table[contains(@class,'datadisplaytable')]//tr[td[normalize-space()='{crn}']]".into(),
		}
	}
}

impl SelectorConfig {
	/// Selector text for `locator`. Positional challenge options share the
	/// list selector; the driver picks the element by index.
	pub fn selector_for(&self, locator: &Locator) -> String {
		match locator {
			Locator::Username => self.username.clone(),
			Locator::Password => self.password.clone(),
			Locator::LoginSubmit => self.login_submit.clone(),
			Locator::ChallengeButtons | Locator::ChallengeButton(_) => self.challenge_buttons.clone(),
			Locator::LandingMarker => self.landing_marker.clone(),
			Locator::TermDropdown => self.term_dropdown.clone(),
			Locator::TermSubmit => self.term_submit.clone(),
			Locator::CrnField(slot) => self.crn_field.replace("{slot}", &slot.to_string()),
			Locator::RegistrationSubmit => self.registration_submit.clone(),
			Locator::RegistrationReset => self.registration_reset.clone(),
			Locator::ResultRegion => self.result_region.clone(),
			Locator::ErrorIndicator => self.error_indicator.clone(),
			Locator::CourseStatus(crn) => self.course_status.replace("{crn}", crn.as_str()),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimingConfig {
	/// Bound on waiting for the operator to approve the challenge.
	pub auth_timeout_secs: u64,
	/// Bound on waiting for the challenge options to render after login.
	pub challenge_ready_timeout_secs: u64,
	/// Bound on waiting for the result region after a submission.
	pub settle_timeout_secs: u64,
	pub poll_interval_ms: u64,
	pub keepalive_interval_secs: u64,
	/// Consecutive all-transient cycles before re-authenticating.
	pub reauth_after: u32,
	pub max_cycles: Option<u64>,
}

impl Default for TimingConfig {
	fn default() -> Self {
		Self {
			auth_timeout_secs: 30,
			challenge_ready_timeout_secs: 10,
			settle_timeout_secs: 5,
			poll_interval_ms: 1000,
			keepalive_interval_secs: 60,
			reauth_after: 3,
			max_cycles: None,
		}
	}
}

impl TimingConfig {
	pub fn auth_timeout(&self) -> Duration {
		Duration::from_secs(self.auth_timeout_secs)
	}

	pub fn challenge_ready_timeout(&self) -> Duration {
		Duration::from_secs(self.challenge_ready_timeout_secs)
	}

	pub fn settle_timeout(&self) -> Duration {
		Duration::from_secs(self.settle_timeout_secs)
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn keepalive_interval(&self) -> Duration {
		Duration::from_secs(self.keepalive_interval_secs)
	}
}

/// Case-insensitive phrases the classifier looks for in a course's status text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhraseTable {
	pub invalid: Vec<String>,
	pub registered: Vec<String>,
	pub waitlist: Vec<String>,
	pub closed: Vec<String>,
}

impl Default for PhraseTable {
	fn default() -> Self {
		fn owned(items: &[&str]) -> Vec<String> {
			items.iter().map(|s| s.to_string()).collect()
		}
		Self {
			invalid: owned(&["invalid crn", "crn not found"]),
			registered: owned(&["web registered", "registered"]),
			waitlist: owned(&["wait list", "waitlist", "wait-list"]),
			closed: owned(&["closed", "section full", "no seats"]),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_file_yields_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.json");
		std::fs::write(&path, "{}").unwrap();

		let config = AppConfig::load(&path).unwrap();
		assert_eq!(config.timing.auth_timeout_secs, 30);
		assert_eq!(config.timing.reauth_after, 3);
		assert_eq!(config.portal.registration_url.as_str(), REGISTRATION_URL);
	}

	#[test]
	fn partial_sections_merge_with_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.json");
		std::fs::write(
			&path,
			r#"{ "timing": { "pollIntervalMs": 5000 }, "portal": { "selectors": { "challengeFrame": null } } }"#,
		)
		.unwrap();

		let config = AppConfig::load(&path).unwrap();
		assert_eq!(config.timing.poll_interval(), Duration::from_secs(5));
		assert_eq!(config.timing.settle_timeout_secs, 5);
		assert!(config.portal.selectors.challenge_frame.is_none());
		assert_eq!(config.portal.selectors.username, "#username");
	}

	#[test]
	fn zero_keepalive_is_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.json");
		std::fs::write(&path, r#"{ "timing": { "keepaliveIntervalSecs": 0 } }"#).unwrap();
		assert!(matches!(AppConfig::load(&path), Err(ConfigError::Invalid(_))));
	}

	#[test]
	fn malformed_json_names_the_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("broken.json");
		std::fs::write(&path, "{ timing").unwrap();
		let err = AppConfig::load(&path).unwrap_err();
		assert!(err.to_string().contains("broken.json"));
	}

	#[test]
	fn registration_url_carries_term() {
		let portal = PortalConfig::default();
		let term: TermCode = "202608".parse().unwrap();
		let url = portal.registration_url_for(term);
		assert_eq!(url.as_str(), "https://oscar.gatech.edu/bprod/bwskfreg.P_AltPin?term_in=202608");
		assert!(portal.is_registration_page(url.as_str()));
		assert!(!portal.is_registration_page("https://login.gatech.edu/cas/login"));
		assert!(!portal.is_registration_page("not a url"));
	}

	#[test]
	fn detail_url_fills_placeholders() {
		let portal = PortalConfig::default();
		let url = portal.detail_url("202602".parse().unwrap(), &"12345".parse().unwrap());
		assert!(url.ends_with("term_in=202602&crn_in=12345"));
	}

	#[test]
	fn slot_and_crn_selectors_expand() {
		let selectors = SelectorConfig::default();
		assert_eq!(selectors.selector_for(&Locator::CrnField(3)), "#crn_id3");
		let status = selectors.selector_for(&Locator::CourseStatus("67890".parse().unwrap()));
		assert!(status.contains("'67890'"));
		assert_eq!(
			selectors.selector_for(&Locator::ChallengeButton(2)),
			selectors.selector_for(&Locator::ChallengeButtons)
		);
	}
}
