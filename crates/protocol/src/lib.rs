//! Wire types for the W3C WebDriver protocol.
//!
//! This crate contains the serde-serializable types exchanged with a
//! WebDriver server (chromedriver) over HTTP. These types represent the
//! "protocol layer" - the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * 1:1 with protocol: Match the W3C WebDriver endpoint payloads
//! * Stable: Changes only when the wire protocol changes
//!
//! The HTTP client built on top of these types lives in `autoreg-runtime`.

pub mod capabilities;
pub mod element;
pub mod types;

pub use capabilities::*;
pub use element::*;
pub use types::*;
