//! Minimal W3C WebDriver HTTP client.
//!
//! Covers the command subset needed to drive a form-based portal: navigation,
//! element lookup, reads, typing, clicks and frame switching. Every command
//! is a single awaited request against one session, so callers get strictly
//! serialized interaction with the browser.

use std::time::Duration;

use autoreg_protocol::{
	Capabilities, ElementRef, Envelope, ErrorValue, FindElement, Navigate, NewSessionRequest, NewSessionValue, SendKeys,
	SwitchFrame,
};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Result, RuntimeError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A live WebDriver session.
#[derive(Debug, Clone)]
pub struct WebDriverClient {
	http: reqwest::Client,
	base: String,
	session_id: String,
}

impl WebDriverClient {
	/// Opens a new browser session on `endpoint` (e.g. `http://127.0.0.1:9515`).
	pub async fn new_session(endpoint: &str, capabilities: Capabilities) -> Result<Self> {
		let base = endpoint.trim_end_matches('/').to_string();
		let http = reqwest::Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(|e| RuntimeError::Http {
				url: base.clone(),
				message: format!("Failed to create HTTP client: {e}"),
			})?;

		let body = NewSessionRequest::always_match(capabilities);
		let created: NewSessionValue = send(&http, Method::POST, format!("{base}/session"), Some(&body)).await?;
		debug!(target = "autoreg.driver", session = %created.session_id, "webdriver session created");

		Ok(Self {
			http,
			base,
			session_id: created.session_id,
		})
	}

	pub fn session_id(&self) -> &str {
		&self.session_id
	}

	pub async fn navigate(&self, url: &str) -> Result<()> {
		self.post("/url", &Navigate { url: url.to_string() }).await
	}

	pub async fn current_url(&self) -> Result<String> {
		self.get("/url").await
	}

	/// Finds the first element matching `query` in the current browsing context.
	pub async fn find_element(&self, query: &FindElement) -> Result<ElementRef> {
		self.post("/element", query).await
	}

	/// Finds all elements matching `query`; an empty list is not an error.
	pub async fn find_elements(&self, query: &FindElement) -> Result<Vec<ElementRef>> {
		self.post("/elements", query).await
	}

	/// Finds all descendants of `parent` matching `query`.
	pub async fn find_elements_from(&self, parent: &ElementRef, query: &FindElement) -> Result<Vec<ElementRef>> {
		self.post(&format!("/element/{}/elements", parent.id), query).await
	}

	pub async fn element_text(&self, element: &ElementRef) -> Result<String> {
		self.get(&format!("/element/{}/text", element.id)).await
	}

	/// Reads a DOM property; non-string values are rendered as JSON text.
	pub async fn element_property(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
		let value: Value = self.get(&format!("/element/{}/property/{name}", element.id)).await?;
		Ok(match value {
			Value::Null => None,
			Value::String(s) => Some(s),
			other => Some(other.to_string()),
		})
	}

	pub async fn element_clear(&self, element: &ElementRef) -> Result<()> {
		self.post(&format!("/element/{}/clear", element.id), &serde_json::json!({})).await
	}

	pub async fn element_send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
		self.post(&format!("/element/{}/value", element.id), &SendKeys { text: text.to_string() })
			.await
	}

	pub async fn element_click(&self, element: &ElementRef) -> Result<()> {
		self.post(&format!("/element/{}/click", element.id), &serde_json::json!({})).await
	}

	/// Switches into `frame`, or back to the top-level context when `None`.
	pub async fn switch_to_frame(&self, frame: Option<&ElementRef>) -> Result<()> {
		self.post("/frame", &SwitchFrame { id: frame.cloned() }).await
	}

	/// Ends the session and closes the browser window.
	pub async fn delete_session(self) -> Result<()> {
		let url = format!("{}/session/{}", self.base, self.session_id);
		send::<(), Value>(&self.http, Method::DELETE, url, None).await
	}

	async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
		send::<T, Value>(&self.http, Method::GET, self.session_url(path), None).await
	}

	async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
		send(&self.http, Method::POST, self.session_url(path), Some(body)).await
	}

	fn session_url(&self, path: &str) -> String {
		format!("{}/session/{}{}", self.base, self.session_id, path)
	}
}

async fn send<T: DeserializeOwned, B: Serialize>(
	http: &reqwest::Client,
	method: Method,
	url: String,
	body: Option<&B>,
) -> Result<T> {
	trace!(target = "autoreg.driver", %method, %url, "webdriver command");

	let mut request = http.request(method, &url);
	if let Some(body) = body {
		request = request.json(body);
	}

	let response = request.send().await.map_err(|e| RuntimeError::Http {
		url: url.clone(),
		message: e.to_string(),
	})?;
	let status = response.status();
	let text = response.text().await.map_err(|e| RuntimeError::Http {
		url: url.clone(),
		message: e.to_string(),
	})?;

	if !status.is_success() {
		return Err(match serde_json::from_str::<Envelope<ErrorValue>>(&text) {
			Ok(envelope) => envelope.value.into(),
			Err(_) => RuntimeError::Http {
				url,
				message: format!("unexpected status {status}"),
			},
		});
	}

	let envelope: Envelope<T> =
		serde_json::from_str(&text).map_err(|e| RuntimeError::Protocol(format!("{url}: {e}")))?;
	Ok(envelope.value)
}
