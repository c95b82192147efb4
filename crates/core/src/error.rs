use std::path::PathBuf;

use thiserror::Error;

use crate::types::AuthFactor;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level failure of a run. The variant names the phase that failed.
#[derive(Debug, Error)]
pub enum Error {
	#[error("login failed: {0}")]
	Login(#[from] AuthError),

	#[error("term selection failed: {0}")]
	TermSelection(#[from] TermError),

	#[error("registration failed: {0}")]
	Registration(#[from] RegistrationError),

	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("browser driver failed: {0}")]
	Driver(#[from] autoreg_runtime::RuntimeError),
}

/// Rejected user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
	#[error("CRN must be exactly five digits, got `{0}`")]
	Crn(String),

	#[error("term code must be six digits YYYYSS, got `{0}`")]
	TermCode(String),

	#[error("unknown season `{suffix}` in term code `{code}` (expected 02, 05 or 08)")]
	Season { code: String, suffix: String },

	#[error("unknown authentication factor `{0}` (expected push, call or pass)")]
	AuthFactor(String),
}

/// Failure reported by a [`PortalDriver`](crate::PortalDriver).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
	#[error("{locator} not found on the current page")]
	NotFound { locator: String },

	#[error("navigation to {url} failed: {message}")]
	Navigation { url: String, message: String },

	#[error("interaction with {locator} failed: {message}")]
	Interaction { locator: String, message: String },

	#[error("driver transport failed: {0}")]
	Transport(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
	#[error(transparent)]
	Driver(#[from] DriverError),

	#[error("{factor} challenge not offered ({offered} challenge options found); check username and password")]
	ChallengeUnavailable { factor: AuthFactor, offered: usize },

	#[error("multi-factor approval not observed within {secs}s")]
	Timeout { secs: u64 },
}

#[derive(Debug, Error)]
pub enum TermError {
	#[error(transparent)]
	Driver(#[from] DriverError),

	#[error("no selectable term for {year} (view-only and language terms are skipped)")]
	NotFound { year: i32 },

	#[error("session has no term to re-commit")]
	Unset,
}

#[derive(Debug, Error)]
pub enum RegistrationError {
	#[error("session not ready (authenticated: {authenticated}, term set: {term_set})")]
	SessionNotReady { authenticated: bool, term_set: bool },

	#[error("no courses requested")]
	NoCourses,

	#[error("re-authentication failed: {0}")]
	Reauthentication(#[source] AuthError),

	#[error("re-committing term failed: {0}")]
	TermRecommit(#[source] TermError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid phrase pattern `{phrase}`: {message}")]
	Pattern { phrase: String, message: String },

	#[error("{0}")]
	Invalid(String),
}
