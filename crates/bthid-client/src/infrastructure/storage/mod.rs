//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the optional TOML file, fills in defaults
//! for anything it leaves out, and turns the result into the settings the
//! application layer consumes ([`SessionConfig`](crate::application::session::SessionConfig),
//! the SDP service record).

pub mod config;
