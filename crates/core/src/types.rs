//! Run inputs and per-attempt outcomes.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ParseError;

/// Out-of-band approval method offered by the multi-factor challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthFactor {
	#[default]
	Push,
	Call,
	Passcode,
}

impl AuthFactor {
	pub const ALL: [AuthFactor; 3] = [AuthFactor::Push, AuthFactor::Call, AuthFactor::Passcode];

	/// Index of this factor's button in the challenge's presentation order.
	pub fn position(self) -> usize {
		match self {
			Self::Push => 0,
			Self::Call => 1,
			Self::Passcode => 2,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::Push => "Push",
			Self::Call => "Call",
			Self::Passcode => "Passcode",
		}
	}
}

impl fmt::Display for AuthFactor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

impl FromStr for AuthFactor {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"push" => Ok(Self::Push),
			"call" => Ok(Self::Call),
			"pass" | "passcode" => Ok(Self::Passcode),
			_ => Err(ParseError::AuthFactor(s.to_string())),
		}
	}
}

/// Login secrets. Held in memory for the run only; `Debug` hides the password.
#[derive(Clone)]
pub struct Credentials {
	username: String,
	password: String,
	factor: AuthFactor,
}

impl Credentials {
	pub fn new(username: impl Into<String>, password: impl Into<String>, factor: AuthFactor) -> Self {
		Self {
			username: username.into(),
			password: password.into(),
			factor,
		}
	}

	pub fn username(&self) -> &str {
		&self.username
	}

	pub fn password(&self) -> &str {
		&self.password
	}

	pub fn factor(&self) -> AuthFactor {
		self.factor
	}
}

impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.field("factor", &self.factor)
			.finish()
	}
}

/// Five-digit Course Registration Number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Crn(String);

impl Crn {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl FromStr for Crn {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		if s.len() == 5 && s.bytes().all(|b| b.is_ascii_digit()) {
			Ok(Self(s.to_string()))
		} else {
			Err(ParseError::Crn(s.to_string()))
		}
	}
}

impl fmt::Display for Crn {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// One desired course section. Its index in the request list is its field slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
	pub crn: Crn,
	pub waitlist_allowed: bool,
}

impl CourseRequest {
	pub fn new(crn: Crn, waitlist_allowed: bool) -> Self {
		Self { crn, waitlist_allowed }
	}
}

/// Result of one registration attempt for one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptOutcome {
	Registered,
	Waitlisted,
	Closed,
	InvalidCrn,
	TransientError,
}

impl AttemptOutcome {
	/// Whether the course stops being submitted once it reaches this outcome.
	pub fn is_terminal_for(self, request: &CourseRequest) -> bool {
		match self {
			Self::Registered | Self::InvalidCrn => true,
			Self::Waitlisted => request.waitlist_allowed,
			Self::Closed | Self::TransientError => false,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Registered => "registered",
			Self::Waitlisted => "waitlisted",
			Self::Closed => "closed",
			Self::InvalidCrn => "invalid CRN",
			Self::TransientError => "transient error",
		}
	}
}

impl fmt::Display for AttemptOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn factor_positions_follow_presentation_order() {
		let positions: Vec<usize> = AuthFactor::ALL.iter().map(|f| f.position()).collect();
		assert_eq!(positions, [0, 1, 2]);
	}

	#[test]
	fn factor_parses_cli_spellings() {
		assert_eq!("push".parse::<AuthFactor>().unwrap(), AuthFactor::Push);
		assert_eq!("CALL".parse::<AuthFactor>().unwrap(), AuthFactor::Call);
		assert_eq!("pass".parse::<AuthFactor>().unwrap(), AuthFactor::Passcode);
		assert!("sms".parse::<AuthFactor>().is_err());
	}

	#[test]
	fn crn_requires_five_digits() {
		assert_eq!("12345".parse::<Crn>().unwrap().as_str(), "12345");
		assert!("1234".parse::<Crn>().is_err());
		assert!("123456".parse::<Crn>().is_err());
		assert!("12a45".parse::<Crn>().is_err());
	}

	#[test]
	fn debug_never_prints_password() {
		let creds = Credentials::new("gburdell3", "hunter2", AuthFactor::Push);
		let rendered = format!("{creds:?}");
		assert!(rendered.contains("gburdell3"));
		assert!(!rendered.contains("hunter2"));
	}

	#[test]
	fn waitlist_is_terminal_only_when_allowed() {
		let crn: Crn = "12345".parse().unwrap();
		let strict = CourseRequest::new(crn.clone(), false);
		let lenient = CourseRequest::new(crn, true);
		assert!(!AttemptOutcome::Waitlisted.is_terminal_for(&strict));
		assert!(AttemptOutcome::Waitlisted.is_terminal_for(&lenient));
		assert!(AttemptOutcome::InvalidCrn.is_terminal_for(&strict));
		assert!(AttemptOutcome::Registered.is_terminal_for(&strict));
		assert!(!AttemptOutcome::Closed.is_terminal_for(&lenient));
		assert!(!AttemptOutcome::TransientError.is_terminal_for(&lenient));
	}
}
