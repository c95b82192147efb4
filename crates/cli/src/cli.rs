use std::path::PathBuf;

use autoreg::{AuthFactor, CourseRequest, Credentials, Crn, TermCode};
use autoreg_runtime::DEFAULT_DRIVER_PORT;
use clap::{Parser, ValueEnum};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "autoreg")]
#[command(about = "Register for courses unattended, retrying until every CRN settles")]
#[command(version)]
pub struct Cli {
	/// CRNs to register for (five digits each)
	#[arg(required = true, value_name = "CRN")]
	pub crns: Vec<Crn>,

	/// Portal username
	#[arg(long, visible_alias = "user")]
	pub username: String,

	/// Portal password
	#[arg(long, visible_alias = "pass")]
	pub password: String,

	/// Second factor to request during login
	#[arg(long, visible_alias = "auth", value_enum, default_value = "push")]
	pub authentication: AuthArg,

	/// Accept a waitlist seat when the section is full
	#[arg(short, long)]
	pub waitlist: bool,

	/// Show the browser window instead of running headless
	#[arg(short, long)]
	pub show: bool,

	/// Term code (YYYYSS, e.g. 202608); inferred from the portal when omitted
	#[arg(short, long, value_name = "TERM")]
	pub term: Option<TermCode>,

	/// Path to chromedriver (defaults to AUTOREG_DRIVER, then PATH)
	#[arg(long, value_name = "PATH")]
	pub driver: Option<PathBuf>,

	/// Port for the spawned chromedriver
	#[arg(long, default_value_t = DEFAULT_DRIVER_PORT)]
	pub driver_port: u16,

	/// Configuration file (defaults to ~/.config/autoreg/config.json)
	#[arg(long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Stop after this many registration cycles
	#[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
	pub max_cycles: Option<u64>,

	/// Increase verbosity (-v debug, -vv trace)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AuthArg {
	/// Push notification to the enrolled device
	Push,
	/// Phone call
	Call,
	/// One-time passcode
	#[value(alias = "passcode")]
	Pass,
}

impl From<AuthArg> for AuthFactor {
	fn from(arg: AuthArg) -> Self {
		match arg {
			AuthArg::Push => AuthFactor::Push,
			AuthArg::Call => AuthFactor::Call,
			AuthArg::Pass => AuthFactor::Passcode,
		}
	}
}

impl Cli {
	pub fn credentials(&self) -> Credentials {
		Credentials::new(&self.username, &self.password, self.authentication.into())
	}

	/// One request per distinct CRN, in command-line order.
	pub fn course_requests(&self) -> Vec<CourseRequest> {
		let mut requests: Vec<CourseRequest> = Vec::with_capacity(self.crns.len());
		for crn in &self.crns {
			if requests.iter().any(|r| &r.crn == crn) {
				warn!(target = "autoreg", %crn, "duplicate CRN ignored");
				continue;
			}
			requests.push(CourseRequest::new(crn.clone(), self.waitlist));
		}
		requests
	}
}
