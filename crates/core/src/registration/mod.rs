//! The polling loop that submits pending CRNs until every request settles.
//!
//! Each cycle fills one CRN field per request slot (terminal slots are left
//! blank), submits, waits for the result region, and classifies every pending
//! course. A run of all-transient cycles is treated as an expired session and
//! escalates to re-authentication before anything else is submitted.

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::classify::ResultClassifier;
use crate::config::AppConfig;
use crate::error::{DriverError, RegistrationError};
use crate::portal::{Condition, Locator, PortalDriver};
use crate::session::{Session, SessionManager};
use crate::term::TermSelector;
use crate::types::{AttemptOutcome, CourseRequest, Credentials};

mod keepalive;
mod state;


pub use keepalive::reset_idle;
pub use state::{CourseState, RunState};

pub struct RegistrationLoop<'a> {
	config: &'a AppConfig,
	classifier: ResultClassifier,
}

impl<'a> RegistrationLoop<'a> {
	pub fn new(config: &'a AppConfig, classifier: ResultClassifier) -> Self {
		Self { config, classifier }
	}

	/// Runs until every request is terminal, `shutdown` flips to `true`, the
	/// configured cycle limit is hit, or re-authentication fails.
	///
	/// Cancellation is only observed between cycles, so the form is never
	/// left half-filled.
	pub async fn run<D: PortalDriver>(
		&self,
		session: &mut Session<D>,
		requests: &[CourseRequest],
		credentials: &Credentials,
		shutdown: &mut watch::Receiver<bool>,
	) -> Result<RunState, RegistrationError> {
		if !session.is_ready() {
			return Err(RegistrationError::SessionNotReady {
				authenticated: session.is_authenticated(),
				term_set: session.term().is_some(),
			});
		}
		if requests.is_empty() {
			return Err(RegistrationError::NoCourses);
		}

		let timing = &self.config.timing;
		let mut state = RunState::new(requests);
		let mut transient_streak = 0u32;

		loop {
			if *shutdown.borrow() {
				info!(target = "autoreg.registration", cycles = state.cycles(), "cancelled");
				state.mark_cancelled();
				return Ok(state);
			}
			if timing.max_cycles.is_some_and(|max| state.cycles() >= max) {
				info!(target = "autoreg.registration", cycles = state.cycles(), "cycle limit reached");
				return Ok(state);
			}

			state.begin_cycle();
			let outcomes = match self.attempt(session, &state).await {
				Ok(outcomes) => outcomes,
				Err(e) => {
					warn!(target = "autoreg.registration", cycle = state.cycles(), error = %e, "submission failed");
					state.pending().map(|i| (i, AttemptOutcome::TransientError)).collect()
				}
			};
			let mut last_activity = Instant::now();

			let all_transient = outcomes.iter().all(|(_, o)| *o == AttemptOutcome::TransientError);
			for (index, outcome) in outcomes {
				let recorded = state.record(index, outcome);
				let course = &state.courses()[index];
				info!(
					target = "autoreg.registration",
					cycle = state.cycles(),
					crn = %course.request.crn,
					outcome = %recorded,
					done = course.is_terminal(),
					"attempt"
				);
			}

			if state.is_complete() {
				info!(target = "autoreg.registration", cycles = state.cycles(), "all requests settled");
				return Ok(state);
			}

			transient_streak = if all_transient { transient_streak + 1 } else { 0 };
			if transient_streak >= timing.reauth_after {
				warn!(
					target = "autoreg.registration",
					cycles = transient_streak,
					"every course failed transiently; session presumed expired"
				);
				self.recover(session, credentials).await?;
				state.note_reauthentication();
				transient_streak = 0;
				last_activity = Instant::now();
			}

			if !self.idle(session, shutdown, &mut last_activity).await {
				info!(target = "autoreg.registration", cycles = state.cycles(), "cancelled while idle");
				state.mark_cancelled();
				return Ok(state);
			}
		}
	}

	/// One fill-submit-classify pass. Driver failures abort the pass; the
	/// caller treats that as a transient cycle.
	async fn attempt<D: PortalDriver>(
		&self,
		session: &mut Session<D>,
		state: &RunState,
	) -> Result<Vec<(usize, AttemptOutcome)>, DriverError> {
		let driver = session.driver_mut();
		for (index, course) in state.courses().iter().enumerate() {
			let value = if course.is_terminal() { "" } else { course.request.crn.as_str() };
			driver.write_field(&Locator::CrnField(index + 1), value).await?;
		}
		driver.click(&Locator::RegistrationSubmit).await?;

		let settled = driver
			.wait_until(&Condition::Present(Locator::ResultRegion), self.config.timing.settle_timeout())
			.await?;
		if !settled {
			debug!(target = "autoreg.registration", "result region did not render");
		}

		let mut outcomes = Vec::new();
		for index in state.pending() {
			let crn = &state.courses()[index].request.crn;
			outcomes.push((index, self.classifier.classify(session, &self.config.portal, crn).await));
		}
		Ok(outcomes)
	}

	async fn recover<D: PortalDriver>(
		&self,
		session: &mut Session<D>,
		credentials: &Credentials,
	) -> Result<(), RegistrationError> {
		SessionManager::new(&self.config.portal, &self.config.timing)
			.reauthenticate(session, credentials)
			.await
			.map_err(RegistrationError::Reauthentication)?;
		TermSelector::new(&self.config.portal, &self.config.timing)
			.recommit(session)
			.await
			.map_err(RegistrationError::TermRecommit)?;
		Ok(())
	}

	/// Waits out the poll interval, resetting the portal's idle timer whenever
	/// the keep-alive interval passes without activity. Returns `false` when
	/// cancelled.
	async fn idle<D: PortalDriver>(
		&self,
		session: &mut Session<D>,
		shutdown: &mut watch::Receiver<bool>,
		last_activity: &mut Instant,
	) -> bool {
		let timing = &self.config.timing;
		let deadline = Instant::now() + timing.poll_interval();

		loop {
			let keepalive_due = *last_activity + timing.keepalive_interval();
			let wake = deadline.min(keepalive_due);

			tokio::select! {
				_ = sleep_until(wake) => {}
				_ = cancelled(shutdown) => return false,
			}

			let now = Instant::now();
			if now >= keepalive_due {
				reset_idle(session, &self.config.portal).await;
				*last_activity = Instant::now();
			}
			if now >= deadline {
				return true;
			}
		}
	}
}

/// Resolves once `shutdown` reads `true`. A dropped sender never cancels.
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
	loop {
		if *shutdown.borrow_and_update() {
			return;
		}
		if shutdown.changed().await.is_err() {
			std::future::pending::<()>().await;
		}
	}
}
