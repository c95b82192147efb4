use serde::Serialize;

use crate::types::{AttemptOutcome, CourseRequest, Crn};

/// Latest known outcome for one requested course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseState {
	pub request: CourseRequest,
	pub outcome: Option<AttemptOutcome>,
	pub attempts: u32,
}

impl CourseState {
	/// Terminal courses are never submitted again.
	pub fn is_terminal(&self) -> bool {
		self.outcome.is_some_and(|outcome| outcome.is_terminal_for(&self.request))
	}
}

/// Outcomes accumulated across cycles, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
	courses: Vec<CourseState>,
	cycles: u64,
	reauthentications: u32,
	cancelled: bool,
}

impl RunState {
	pub fn new(requests: &[CourseRequest]) -> Self {
		Self {
			courses: requests
				.iter()
				.cloned()
				.map(|request| CourseState {
					request,
					outcome: None,
					attempts: 0,
				})
				.collect(),
			..Self::default()
		}
	}

	/// State for a run stopped by the operator before its first cycle.
	pub fn interrupted(requests: &[CourseRequest]) -> Self {
		let mut state = Self::new(requests);
		state.cancelled = true;
		state
	}

	pub fn courses(&self) -> &[CourseState] {
		&self.courses
	}

	pub fn outcome(&self, crn: &Crn) -> Option<AttemptOutcome> {
		self.courses.iter().find(|c| &c.request.crn == crn).and_then(|c| c.outcome)
	}

	/// Indices of courses still being submitted.
	pub fn pending(&self) -> impl Iterator<Item = usize> + '_ {
		self.courses.iter().enumerate().filter(|(_, c)| !c.is_terminal()).map(|(i, _)| i)
	}

	pub fn is_complete(&self) -> bool {
		self.courses.iter().all(CourseState::is_terminal)
	}

	pub fn cycles(&self) -> u64 {
		self.cycles
	}

	pub fn reauthentications(&self) -> u32 {
		self.reauthentications
	}

	/// Whether the run stopped on operator cancellation.
	pub fn is_cancelled(&self) -> bool {
		self.cancelled
	}

	pub(crate) fn begin_cycle(&mut self) {
		self.cycles += 1;
	}

	pub(crate) fn mark_cancelled(&mut self) {
		self.cancelled = true;
	}

	pub(crate) fn note_reauthentication(&mut self) {
		self.reauthentications += 1;
	}

	/// Stores `outcome` for course `index` and returns what was stored. A
	/// waitlist offer the request may not take is kept as `Closed`.
	pub(crate) fn record(&mut self, index: usize, outcome: AttemptOutcome) -> AttemptOutcome {
		let course = &mut self.courses[index];
		let effective = match outcome {
			AttemptOutcome::Waitlisted if !course.request.waitlist_allowed => AttemptOutcome::Closed,
			other => other,
		};
		course.outcome = Some(effective);
		course.attempts += 1;
		effective
	}
}
