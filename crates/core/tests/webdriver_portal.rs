//! WebDriverPortal against an in-process fake WebDriver server: challenge
//! positions, frame switching and the missing-frame rule.

use std::sync::{Arc, Mutex};

use autoreg::{AuthFactor, Locator, PortalDriver, SelectorConfig, WebDriverPortal};
use autoreg_protocol::{Capabilities, ELEMENT_KEY};
use autoreg_runtime::WebDriverClient;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

const BUTTONS: usize = 3;

#[derive(Clone)]
struct FakeServer {
	selectors: Arc<SelectorConfig>,
	frame_rendered: bool,
	log: Arc<Mutex<Vec<String>>>,
}

impl FakeServer {
	fn new(frame_rendered: bool) -> Self {
		Self {
			selectors: Arc::new(SelectorConfig::default()),
			frame_rendered,
			log: Arc::default(),
		}
	}

	fn record(&self, entry: String) {
		self.log.lock().unwrap().push(entry);
	}

	/// Frame switches and clicks, in order.
	fn interactions(&self) -> Vec<String> {
		self.log
			.lock()
			.unwrap()
			.iter()
			.filter(|e| e.starts_with("frame ") || e.starts_with("click "))
			.cloned()
			.collect()
	}
}

async fn new_session() -> Json<Value> {
	Json(json!({ "value": { "sessionId": "s1", "capabilities": {} } }))
}

async fn find_all(State(state): State<FakeServer>, Json(body): Json<Value>) -> Json<Value> {
	let selector = body["value"].as_str().unwrap_or_default().to_string();
	state.record(format!("find {selector}"));

	let value = if Some(selector.as_str()) == state.selectors.challenge_frame.as_deref() {
		if state.frame_rendered {
			json!([{ ELEMENT_KEY: "frame1" }])
		} else {
			json!([])
		}
	} else if selector == state.selectors.challenge_buttons {
		Value::Array((0..BUTTONS).map(|i| json!({ ELEMENT_KEY: format!("b{i}") })).collect())
	} else {
		json!([])
	};
	Json(json!({ "value": value }))
}

async fn switch_frame(State(state): State<FakeServer>, Json(body): Json<Value>) -> Json<Value> {
	let target = body["id"][ELEMENT_KEY].as_str().unwrap_or("null").to_string();
	state.record(format!("frame {target}"));
	Json(json!({ "value": null }))
}

async fn click(State(state): State<FakeServer>, Path((_, element)): Path<(String, String)>) -> Json<Value> {
	state.record(format!("click {element}"));
	Json(json!({ "value": null }))
}

async fn portal(state: FakeServer) -> WebDriverPortal {
	let app = Router::new()
		.route("/session", post(new_session))
		.route("/session/{id}/elements", post(find_all))
		.route("/session/{id}/frame", post(switch_frame))
		.route("/session/{id}/element/{eid}/click", post(click))
		.with_state(state);

	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});

	let client = WebDriverClient::new_session(&format!("http://{addr}"), Capabilities::chrome(false))
		.await
		.unwrap();
	WebDriverPortal::new(client, SelectorConfig::default())
}

#[tokio::test]
async fn each_factor_clicks_its_button_inside_the_frame() {
	for factor in AuthFactor::ALL {
		let server = FakeServer::new(true);
		let mut portal = portal(server.clone()).await;

		portal.click(&Locator::ChallengeButton(factor.position())).await.unwrap();

		assert_eq!(
			server.interactions(),
			[
				"frame frame1".to_string(),
				format!("click b{}", factor.position()),
				"frame null".to_string(),
			],
			"{factor}"
		);
	}
}

#[tokio::test]
async fn passcode_is_the_third_button() {
	let server = FakeServer::new(true);
	let mut portal = portal(server.clone()).await;

	portal.click(&Locator::ChallengeButton(AuthFactor::Passcode.position())).await.unwrap();

	assert!(server.interactions().contains(&"click b2".to_string()));
}

#[tokio::test]
async fn challenge_counts_are_zero_until_the_frame_renders() {
	let server = FakeServer::new(false);
	let portal = portal(server.clone()).await;

	assert_eq!(portal.count(&Locator::ChallengeButtons).await.unwrap(), 0);
	assert_eq!(portal.count(&Locator::ChallengeButton(0)).await.unwrap(), 0);
	assert!(server.interactions().is_empty(), "switched into a frame that is not there");
}

#[tokio::test]
async fn challenge_counts_come_from_inside_the_frame() {
	let server = FakeServer::new(true);
	let portal = portal(server.clone()).await;

	assert_eq!(portal.count(&Locator::ChallengeButtons).await.unwrap(), BUTTONS);
	assert_eq!(portal.count(&Locator::ChallengeButton(2)).await.unwrap(), 1);
	assert_eq!(portal.count(&Locator::ChallengeButton(BUTTONS)).await.unwrap(), 0);
	assert_eq!(
		server.interactions(),
		["frame frame1", "frame null", "frame frame1", "frame null", "frame frame1", "frame null"]
	);
}

#[tokio::test]
async fn missing_frame_fails_a_click() {
	let server = FakeServer::new(false);
	let mut portal = portal(server.clone()).await;

	assert!(portal.click(&Locator::ChallengeButton(0)).await.is_err());
	assert!(server.interactions().is_empty());
}
