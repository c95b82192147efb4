use thiserror::Error;

use autoreg_protocol::ErrorValue;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Failures while launching or talking to a WebDriver server.
#[derive(Debug, Error)]
pub enum RuntimeError {
	#[error("WebDriver executable not found: {0}")]
	DriverNotFound(String),

	#[error("Failed to launch {path}: {message}")]
	Launch { path: String, message: String },

	#[error("WebDriver not ready on port {port}: {message}")]
	NotReady { port: u16, message: String },

	#[error("HTTP request to {url} failed: {message}")]
	Http { url: String, message: String },

	#[error("WebDriver error `{error}`: {message}")]
	WebDriver { error: String, message: String },

	#[error("Malformed WebDriver response: {0}")]
	Protocol(String),
}

impl RuntimeError {
	/// Returns `true` when the server reported that a lookup matched nothing.
	pub fn is_no_such_element(&self) -> bool {
		matches!(self, Self::WebDriver { error, .. } if error == ErrorValue::NO_SUCH_ELEMENT)
	}

	/// Returns `true` when an element handle went stale between lookup and use.
	pub fn is_stale_element(&self) -> bool {
		matches!(self, Self::WebDriver { error, .. } if error == ErrorValue::STALE_ELEMENT)
	}
}

impl From<ErrorValue> for RuntimeError {
	fn from(value: ErrorValue) -> Self {
		Self::WebDriver {
			error: value.error,
			message: value.message,
		}
	}
}
