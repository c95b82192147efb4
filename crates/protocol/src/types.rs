//! Envelope, error and command body types.

use serde::{Deserialize, Serialize};

/// Every WebDriver response wraps its payload in `value`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
	pub value: T,
}

/// `value` of a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorValue {
	pub error: String,
	#[serde(default)]
	pub message: String,
}

impl ErrorValue {
	/// W3C error code for a missing element.
	pub const NO_SUCH_ELEMENT: &'static str = "no such element";
	/// W3C error code for an element that went away after lookup.
	pub const STALE_ELEMENT: &'static str = "stale element reference";
}

/// `value` of `GET /status`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusValue {
	pub ready: bool,
	#[serde(default)]
	pub message: String,
}

/// Body of `POST /session/{id}/url`.
#[derive(Debug, Clone, Serialize)]
pub struct Navigate {
	pub url: String,
}

/// Body of `POST /session/{id}/element/{eid}/value`.
#[derive(Debug, Clone, Serialize)]
pub struct SendKeys {
	pub text: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn error_envelope_parses() {
		let raw = r#"{"value":{"error":"no such element","message":"Unable to locate","stacktrace":""}}"#;
		let env: Envelope<ErrorValue> = serde_json::from_str(raw).unwrap();
		assert_eq!(env.value.error, ErrorValue::NO_SUCH_ELEMENT);
		assert_eq!(env.value.message, "Unable to locate");
	}

	#[test]
	fn status_message_is_optional() {
		let env: Envelope<StatusValue> = serde_json::from_str(r#"{"value":{"ready":true}}"#).unwrap();
		assert!(env.value.ready);
		assert!(env.value.message.is_empty());
	}
}
