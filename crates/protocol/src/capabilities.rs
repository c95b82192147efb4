//! Session capability negotiation payloads.

use serde::{Deserialize, Serialize};

/// Body of `POST /session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSessionRequest {
	pub capabilities: CapabilitiesRequest,
}

impl NewSessionRequest {
	/// Wraps `capabilities` as the `alwaysMatch` set.
	pub fn always_match(capabilities: Capabilities) -> Self {
		Self {
			capabilities: CapabilitiesRequest {
				always_match: capabilities,
			},
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesRequest {
	pub always_match: Capabilities,
}

/// Requested browser capabilities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub browser_name: Option<String>,
	#[serde(rename = "goog:chromeOptions", skip_serializing_if = "Option::is_none")]
	pub chrome_options: Option<ChromeOptions>,
}

impl Capabilities {
	/// Chrome capabilities, headless unless `show` is set.
	pub fn chrome(show: bool) -> Self {
		let flag = if show { "--start-maximized" } else { "--headless=new" };
		Self {
			browser_name: Some("chrome".into()),
			chrome_options: Some(ChromeOptions {
				args: vec![flag.to_string()],
				binary: None,
			}),
		}
	}
}

/// Vendor block understood by chromedriver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChromeOptions {
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub args: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub binary: Option<String>,
}

/// `value` of a successful `POST /session`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionValue {
	pub session_id: String,
	#[serde(default)]
	pub capabilities: serde_json::Value,
}
