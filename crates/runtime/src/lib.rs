//! WebDriver process lifecycle and connection.
//!
//! * [`DriverProcess`] spawns and supervises a local chromedriver.
//! * [`WebDriverClient`] speaks the W3C WebDriver HTTP protocol to it.
//! * [`process`] holds small pid/port helpers shared with the CLI.

pub mod client;
pub mod driver;
pub mod error;
pub mod process;

pub use client::WebDriverClient;
pub use driver::{DEFAULT_DRIVER_PORT, DriverProcess, probe_status};
pub use error::{Result, RuntimeError};
