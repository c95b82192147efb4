//! Element references and lookup payloads.

use serde::{Deserialize, Serialize};

/// Key under which the W3C protocol serializes a web element reference.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4f735466cecf";

/// Opaque handle to a remote DOM element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
	#[serde(rename = "element-6066-11e4-a52f-4f735466cecf")]
	pub id: String,
}

/// Element location strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
	#[serde(rename = "css selector")]
	Css,
	#[serde(rename = "xpath")]
	XPath,
}

/// Body of `POST /session/{id}/element(s)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindElement {
	pub using: Strategy,
	pub value: String,
}

impl FindElement {
	/// Infers the strategy from the selector text: XPath expressions start
	/// with `/` or `(`, everything else is CSS.
	pub fn infer(selector: &str) -> Self {
		let trimmed = selector.trim_start();
		let using = if trimmed.starts_with('/') || trimmed.starts_with('(') {
			Strategy::XPath
		} else {
			Strategy::Css
		};
		Self {
			using,
			value: selector.to_string(),
		}
	}
}

/// Body of `POST /session/{id}/frame`. `None` selects the top-level context.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchFrame {
	pub id: Option<ElementRef>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn element_ref_uses_w3c_key() {
		let json = serde_json::json!({ ELEMENT_KEY: "abc" });
		let element: ElementRef = serde_json::from_value(json).unwrap();
		assert_eq!(element.id, "abc");
	}

	#[test]
	fn infer_strategy_from_selector() {
		assert_eq!(FindElement::infer("#crn_id1").using, Strategy::Css);
		assert_eq!(FindElement::infer("//tr[td='12345']").using, Strategy::XPath);
		assert_eq!(FindElement::infer("(//button)[2]").using, Strategy::XPath);
	}

	#[test]
	fn top_level_frame_serializes_null() {
		let body = serde_json::to_value(SwitchFrame { id: None }).unwrap();
		assert!(body["id"].is_null());
	}
}
