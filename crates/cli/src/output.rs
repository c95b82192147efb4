use autoreg::{AttemptOutcome, CourseState, RunState};
use colored::Colorize;

pub fn print_summary(state: &RunState) {
	println!("{}", headline(state).bold());
	for course in state.courses() {
		let line = course_line(course);
		let line = match course.outcome {
			Some(AttemptOutcome::Registered) => line.as_str().green(),
			Some(AttemptOutcome::Waitlisted) if course.is_terminal() => line.as_str().yellow(),
			Some(AttemptOutcome::InvalidCrn) => line.as_str().red(),
			_ => line.as_str().normal(),
		};
		println!("  {line}");
	}
}

pub fn headline(state: &RunState) -> String {
	let settled = state.courses().iter().filter(|c| c.is_terminal()).count();
	let total = state.courses().len();
	let how = if state.is_cancelled() {
		"Cancelled"
	} else if state.is_complete() {
		"Done"
	} else {
		"Stopped"
	};
	let mut line = format!("{how} after {} cycle(s): {settled}/{total} settled", state.cycles());
	if state.reauthentications() > 0 {
		line.push_str(&format!(", {} re-login(s)", state.reauthentications()));
	}
	line
}

pub fn course_line(course: &CourseState) -> String {
	let outcome = course.outcome.map_or("not attempted", AttemptOutcome::as_str);
	let status = if course.is_terminal() { "settled" } else { "pending" };
	format!("{}  {outcome:<16} {status} ({} attempts)", course.request.crn, course.attempts)
}
