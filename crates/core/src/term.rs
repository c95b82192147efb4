//! Term codes and term selection.

use std::fmt;
use std::str::FromStr;

use chrono::Datelike;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{PortalConfig, TimingConfig};
use crate::error::{ParseError, TermError};
use crate::portal::{Condition, Locator, PortalDriver};
use crate::session::Session;

/// Labels marking dropdown entries that cannot be registered for.
const EXCLUDED_LABELS: [&str; 2] = ["View only", "Language"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Season {
	Spring,
	Summer,
	Fall,
}

impl Season {
	/// Two-digit suffix used in term codes.
	pub fn code(self) -> &'static str {
		match self {
			Self::Spring => "02",
			Self::Summer => "05",
			Self::Fall => "08",
		}
	}

	pub fn from_code(code: &str) -> Option<Self> {
		match code {
			"02" => Some(Self::Spring),
			"05" => Some(Self::Summer),
			"08" => Some(Self::Fall),
			_ => None,
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Self::Spring => "Spring",
			Self::Summer => "Summer",
			Self::Fall => "Fall",
		}
	}
}

impl fmt::Display for Season {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Six-digit `YYYYSS` term identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct TermCode {
	year: u16,
	season: Season,
}

impl TermCode {
	pub fn new(year: u16, season: Season) -> Self {
		Self { year, season }
	}

	pub fn year(self) -> u16 {
		self.year
	}

	pub fn season(self) -> Season {
		self.season
	}

	/// Human label, e.g. `Fall 2026`.
	pub fn label(self) -> String {
		format!("{} {}", self.season, self.year)
	}
}

impl FromStr for TermCode {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
			return Err(ParseError::TermCode(s.to_string()));
		}
		let (year, suffix) = s.split_at(4);
		let season = Season::from_code(suffix).ok_or_else(|| ParseError::Season {
			code: s.to_string(),
			suffix: suffix.to_string(),
		})?;
		let year = year.parse().map_err(|_| ParseError::TermCode(s.to_string()))?;
		Ok(Self { year, season })
	}
}

impl fmt::Display for TermCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:04}{}", self.year, self.season.code())
	}
}

impl From<TermCode> for String {
	fn from(term: TermCode) -> Self {
		term.to_string()
	}
}

/// One entry of the term dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermOption {
	pub value: String,
	pub label: String,
}

impl TermOption {
	pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			value: value.into(),
			label: label.into(),
		}
	}

	fn is_excluded(&self) -> bool {
		EXCLUDED_LABELS.iter().any(|marker| self.label.contains(marker))
	}
}

/// First option, in document order, that is registrable and belongs to `year`.
pub fn pick_term(options: &[TermOption], year: i32) -> Option<(TermCode, &TermOption)> {
	options.iter().find_map(|option| {
		if option.is_excluded() {
			return None;
		}
		let term = match option.value.parse::<TermCode>() {
			Ok(term) => term,
			Err(e) => {
				debug!(target = "autoreg.term", value = %option.value, error = %e, "skipping term option");
				return None;
			}
		};
		(i32::from(term.year()) == year).then_some((term, option))
	})
}

/// Resolves and commits the registration term.
pub struct TermSelector<'a> {
	portal: &'a PortalConfig,
	timing: &'a TimingConfig,
	current_year: i32,
}

impl<'a> TermSelector<'a> {
	/// Selector that infers terms for the current calendar year.
	pub fn new(portal: &'a PortalConfig, timing: &'a TimingConfig) -> Self {
		Self::for_year(portal, timing, chrono::Local::now().year())
	}

	pub fn for_year(portal: &'a PortalConfig, timing: &'a TimingConfig, current_year: i32) -> Self {
		Self {
			portal,
			timing,
			current_year,
		}
	}

	/// Commits `explicit` as-is, or infers the term from the dropdown.
	/// On success the session's term is set.
	pub async fn select_term<D: PortalDriver>(
		&self,
		session: &mut Session<D>,
		explicit: Option<TermCode>,
	) -> Result<TermCode, TermError> {
		let term = match explicit {
			Some(term) => {
				let url = self.portal.registration_url_for(term);
				session.driver_mut().navigate(url.as_str()).await?;
				term
			}
			None => self.infer(session).await?,
		};

		self.await_form(session).await?;
		session.set_term(term);
		info!(target = "autoreg.term", term = %term, "Assuming term {}", term.label());
		Ok(term)
	}

	/// Returns to the registration form for the session's existing term.
	pub async fn recommit<D: PortalDriver>(&self, session: &mut Session<D>) -> Result<TermCode, TermError> {
		let term = session.term().ok_or(TermError::Unset)?;
		let url = self.portal.registration_url_for(term);
		session.driver_mut().navigate(url.as_str()).await?;
		self.await_form(session).await?;
		debug!(target = "autoreg.term", term = %term, "term re-committed");
		Ok(term)
	}

	async fn infer<D: PortalDriver>(&self, session: &mut Session<D>) -> Result<TermCode, TermError> {
		let driver = session.driver_mut();
		driver.navigate(self.portal.registration_url.as_str()).await?;

		let options = driver.options(&Locator::TermDropdown).await?;
		debug!(target = "autoreg.term", offered = options.len(), year = self.current_year, "term options");

		let (term, option) = pick_term(&options, self.current_year).ok_or(TermError::NotFound {
			year: self.current_year,
		})?;
		let value = option.value.clone();

		driver.select_option(&Locator::TermDropdown, &value).await?;
		driver.click(&Locator::TermSubmit).await?;
		Ok(term)
	}

	async fn await_form<D: PortalDriver>(&self, session: &Session<D>) -> Result<(), TermError> {
		let ready = session
			.driver()
			.wait_until(&Condition::Present(Locator::CrnField(1)), self.timing.settle_timeout())
			.await?;
		if !ready {
			let location = session.driver().current_location().await.unwrap_or_default();
			warn!(target = "autoreg.term", %location, "registration form not visible after committing term");
		}
		Ok(())
	}
}
