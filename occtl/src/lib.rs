//! Client for the ocserv control interface.
//!
//! This crate queries a running ocserv through `occtl --json` and decodes the
//! answers into typed records:
//!
//! - [`command`] - Commands understood by the control interface
//! - [`transport`] - Command execution (`CommandTransport`, `OcctlCommander`)
//! - [`mock`] - Canned-output transport for tests
//! - [`parser`] - Decoding of raw output
//! - [`types`] - `ServerStatus` and `SessionRecord`
//! - [`client`] - `Client` combining a transport with the parser
//! - [`error`] - Error types
//!
//! Transport failures ([`TransportError`]) and malformed output
//! ([`DecodeError`]) are reported separately so callers can tell an
//! unreachable server from an unexpected answer.

pub mod client;
pub mod command;
pub mod error;
pub mod mock;
pub mod parser;
pub mod transport;
pub mod types;

// Re-export commonly used types at the crate root
pub use client::Client;
pub use command::Command;
pub use error::{DecodeError, Error, Result, TransportError};
pub use mock::{MockResponse, MockTransport};
pub use parser::{parse_sessions, parse_status};
pub use transport::{CommandTransport, DEFAULT_BINARY, DEFAULT_SOCKET, OcctlCommander};
pub use types::{ServerStatus, SessionRecord};
