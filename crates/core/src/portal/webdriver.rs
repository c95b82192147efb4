//! [`PortalDriver`] backed by a WebDriver session.

use async_trait::async_trait;
use autoreg_protocol::{ElementRef, FindElement};
use autoreg_runtime::{RuntimeError, WebDriverClient};
use tracing::{debug, warn};

use super::{Locator, PortalDriver};
use crate::config::SelectorConfig;
use crate::error::DriverError;
use crate::term::TermOption;

/// Drives the portal through chromedriver, resolving [`Locator`] roles with
/// the configured [`SelectorConfig`].
pub struct WebDriverPortal {
	client: WebDriverClient,
	selectors: SelectorConfig,
}

impl WebDriverPortal {
	pub fn new(client: WebDriverClient, selectors: SelectorConfig) -> Self {
		Self { client, selectors }
	}

	fn query(&self, locator: &Locator) -> FindElement {
		FindElement::infer(&self.selectors.selector_for(locator))
	}

	/// Switches into the challenge frame for challenge locators. Returns
	/// whether a switch happened so the caller can switch back.
	async fn enter(&self, locator: &Locator) -> Result<bool, DriverError> {
		let framed = matches!(locator, Locator::ChallengeButtons | Locator::ChallengeButton(_));
		let Some(selector) = self.selectors.challenge_frame.as_deref().filter(|_| framed) else {
			return Ok(false);
		};

		let frames = self.client.find_elements(&FindElement::infer(selector)).await.map_err(transport)?;
		let Some(frame) = frames.first() else {
			// Frame not rendered yet: nothing inside it can match.
			return Err(DriverError::NotFound {
				locator: format!("challenge frame `{selector}`"),
			});
		};
		self.client.switch_to_frame(Some(frame)).await.map_err(transport)?;
		Ok(true)
	}

	async fn leave(&self, entered: bool) {
		if !entered {
			return;
		}
		if let Err(e) = self.client.switch_to_frame(None).await {
			warn!(target = "autoreg.driver", error = %e, "failed to leave challenge frame");
		}
	}

	async fn matches(&self, locator: &Locator) -> Result<Vec<ElementRef>, DriverError> {
		let mut elements = self.client.find_elements(&self.query(locator)).await.map_err(transport)?;
		if let Locator::ChallengeButton(index) = locator {
			elements = elements.into_iter().skip(*index).take(1).collect();
		}
		Ok(elements)
	}

	async fn first(&self, locator: &Locator) -> Result<ElementRef, DriverError> {
		self.matches(locator)
			.await?
			.into_iter()
			.next()
			.ok_or_else(|| DriverError::NotFound {
				locator: locator.to_string(),
			})
	}

	async fn read(&self, locator: &Locator) -> Result<Option<String>, DriverError> {
		let elements = self.matches(locator).await?;
		if elements.is_empty() {
			return Ok(None);
		}

		if is_input(locator) {
			return self.client.element_property(&elements[0], "value").await.map_err(|e| interaction(locator, e));
		}

		let mut texts = Vec::with_capacity(elements.len());
		for element in &elements {
			let text = self.client.element_text(element).await.map_err(|e| interaction(locator, e))?;
			let text = text.trim();
			if !text.is_empty() {
				texts.push(text.to_string());
			}
		}
		Ok(Some(texts.join(" | ")))
	}
}

#[async_trait]
impl PortalDriver for WebDriverPortal {
	async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
		debug!(target = "autoreg.driver", %url, "navigate");
		self.client.navigate(url).await.map_err(|e| DriverError::Navigation {
			url: url.to_string(),
			message: e.to_string(),
		})
	}

	async fn current_location(&self) -> Result<String, DriverError> {
		self.client.current_url().await.map_err(transport)
	}

	async fn read_field(&self, locator: &Locator) -> Result<Option<String>, DriverError> {
		let entered = self.enter(locator).await?;
		let result = self.read(locator).await;
		self.leave(entered).await;
		result
	}

	async fn write_field(&mut self, locator: &Locator, value: &str) -> Result<(), DriverError> {
		let element = self.first(locator).await?;
		self.client.element_clear(&element).await.map_err(|e| interaction(locator, e))?;
		if !value.is_empty() {
			self.client
				.element_send_keys(&element, value)
				.await
				.map_err(|e| interaction(locator, e))?;
		}
		Ok(())
	}

	async fn click(&mut self, locator: &Locator) -> Result<(), DriverError> {
		debug!(target = "autoreg.driver", %locator, "click");
		let entered = self.enter(locator).await?;
		let result = match self.first(locator).await {
			Ok(element) => self.client.element_click(&element).await.map_err(|e| interaction(locator, e)),
			Err(e) => Err(e),
		};
		self.leave(entered).await;
		result
	}

	async fn count(&self, locator: &Locator) -> Result<usize, DriverError> {
		let entered = match self.enter(locator).await {
			Ok(entered) => entered,
			Err(DriverError::NotFound { .. }) => return Ok(0),
			Err(e) => return Err(e),
		};
		let result = self.matches(locator).await.map(|elements| elements.len());
		self.leave(entered).await;
		result
	}

	async fn options(&self, locator: &Locator) -> Result<Vec<TermOption>, DriverError> {
		let dropdown = self.first(locator).await?;
		let elements = self
			.client
			.find_elements_from(&dropdown, &FindElement::infer("option"))
			.await
			.map_err(|e| interaction(locator, e))?;

		let mut options = Vec::with_capacity(elements.len());
		for element in &elements {
			let value = self
				.client
				.element_property(element, "value")
				.await
				.map_err(|e| interaction(locator, e))?
				.unwrap_or_default();
			let label = self.client.element_text(element).await.map_err(|e| interaction(locator, e))?;
			options.push(TermOption::new(value, label.trim()));
		}
		Ok(options)
	}

	async fn select_option(&mut self, locator: &Locator, value: &str) -> Result<(), DriverError> {
		let dropdown = self.first(locator).await?;
		let elements = self
			.client
			.find_elements_from(&dropdown, &FindElement::infer("option"))
			.await
			.map_err(|e| interaction(locator, e))?;

		for element in &elements {
			let candidate = self
				.client
				.element_property(element, "value")
				.await
				.map_err(|e| interaction(locator, e))?;
			if candidate.as_deref() == Some(value) {
				return self.client.element_click(element).await.map_err(|e| interaction(locator, e));
			}
		}

		Err(DriverError::NotFound {
			locator: format!("{locator} option `{value}`"),
		})
	}
}

fn is_input(locator: &Locator) -> bool {
	matches!(locator, Locator::Username | Locator::Password | Locator::CrnField(_))
}

fn interaction(locator: &Locator, err: RuntimeError) -> DriverError {
	if err.is_no_such_element() || err.is_stale_element() {
		return DriverError::NotFound {
			locator: locator.to_string(),
		};
	}
	match err {
		RuntimeError::WebDriver { error, message } => DriverError::Interaction {
			locator: locator.to_string(),
			message: format!("{error}: {message}"),
		},
		other => transport(other),
	}
}

fn transport(err: RuntimeError) -> DriverError {
	DriverError::Transport(err.to_string())
}
