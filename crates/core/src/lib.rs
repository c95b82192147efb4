//! Unattended course registration against a Banner-style portal.
//!
//! The pipeline is `SessionManager -> TermSelector -> RegistrationLoop`:
//!
//! 1. [`SessionManager`] logs in and completes the multi-factor challenge,
//!    producing an authenticated [`Session`].
//! 2. [`TermSelector`] resolves the registration term and commits it.
//! 3. [`RegistrationLoop`] submits the pending CRNs every cycle, reads the
//!    outcome of each through [`ResultClassifier`], and keeps the session
//!    alive while idle.
//!
//! All browser interaction goes through the [`PortalDriver`] trait, addressed
//! by semantic [`Locator`] roles. [`WebDriverPortal`] maps those roles onto
//! markup and drives a real browser over WebDriver.

pub mod classify;
pub mod config;
pub mod error;
pub mod portal;
pub mod registration;
pub mod session;
pub mod term;
pub mod types;

pub use classify::ResultClassifier;
pub use config::{AppConfig, PhraseTable, PortalConfig, SelectorConfig, TimingConfig};
pub use error::{AuthError, ConfigError, DriverError, Error, ParseError, RegistrationError, Result, TermError};
pub use portal::webdriver::WebDriverPortal;
pub use portal::{Condition, Locator, PortalDriver};
pub use registration::{CourseState, RegistrationLoop, RunState};
pub use session::{Session, SessionManager};
pub use term::{Season, TermCode, TermOption, TermSelector};
pub use types::{AttemptOutcome, AuthFactor, CourseRequest, Credentials, Crn};
