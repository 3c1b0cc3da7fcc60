//! Canned-output transport for tests.
//!
//! [`MockTransport`] answers each [`Command`] with whatever response was last
//! configured for it, so decoding and refresh logic can be exercised without
//! a running ocserv.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::command::Command;
use crate::error::TransportError;
use crate::transport::CommandTransport;
use crate::types::{ServerStatus, SessionRecord};

/// Response returned by the mock for a command.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Command succeeds with this standard output.
    Output(Vec<u8>),
    /// Control socket cannot be reached.
    Unreachable,
    /// Command exits with a failure status.
    Exit { status: String, stderr: String },
}

#[derive(Debug, Default)]
struct MockState {
    responses: HashMap<Command, MockResponse>,
    calls: HashMap<Command, usize>,
}

/// Transport returning configurable canned responses.
///
/// Clones share the same state, so a test can keep a handle and change the
/// responses while a client owns another clone.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response for a command.
    pub fn respond(&self, command: Command, response: MockResponse) {
        self.state.lock().responses.insert(command, response);
    }

    /// Respond to a command with raw output.
    pub fn respond_raw(&self, command: Command, output: impl Into<Vec<u8>>) {
        self.respond(command, MockResponse::Output(output.into()));
    }

    /// Respond to `show status` with the JSON form of `status`.
    pub fn respond_status(&self, status: &ServerStatus) {
        self.respond_raw(Command::ShowStatus, to_json(status));
    }

    /// Respond to `show users` with the JSON form of `sessions`.
    pub fn respond_sessions(&self, sessions: &[SessionRecord]) {
        self.respond_raw(Command::ShowUsers, to_json(sessions));
    }

    /// Make a command fail as if the control socket were down.
    pub fn fail(&self, command: Command) {
        self.respond(command, MockResponse::Unreachable);
    }

    /// Number of times a command was executed.
    pub fn calls(&self, command: Command) -> usize {
        self.state.lock().calls.get(&command).copied().unwrap_or(0)
    }
}

impl CommandTransport for MockTransport {
    async fn execute(&self, command: Command) -> Result<Vec<u8>, TransportError> {
        let response = {
            let mut state = self.state.lock();
            *state.calls.entry(command).or_default() += 1;
            state.responses.get(&command).cloned()
        };

        match response.unwrap_or(MockResponse::Unreachable) {
            MockResponse::Output(output) => Ok(output),
            MockResponse::Unreachable => Err(TransportError::Spawn {
                command,
                source: io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "cannot connect to control socket",
                ),
            }),
            MockResponse::Exit { status, stderr } => Err(TransportError::Exit {
                command,
                status,
                stderr,
            }),
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Vec<u8> {
    // Plain structs of strings and integers always serialize
    serde_json::to_vec_pretty(value).unwrap_or_default()
}

/// A session record with every field filled in.
pub fn session(username: &str, remote_ip: &str) -> SessionRecord {
    SessionRecord {
        username: username.to_string(),
        remote_ip: remote_ip.to_string(),
        mtu: "1434".to_string(),
        ipv4: "10.10.0.2".to_string(),
        ipv6: "fd00::2".to_string(),
        device: "vpns0".to_string(),
        user_agent: "AnyConnect Linux_64 4.10.07061".to_string(),
        connected_at: 1_709_370_900,
        tx_bytes: 4096,
        rx_bytes: 2048,
    }
}

/// A server status with distinct values in every field.
pub fn status(active_sessions: u64, handled_sessions: u64) -> ServerStatus {
    ServerStatus {
        start_time: 1_709_280_000,
        active_sessions,
        handled_sessions,
        ips_banned: 2,
        total_authentication_failures: 7,
        sessions_handled: 40,
        timed_out_sessions: 4,
        timed_out_idle_sessions: 5,
        closed_error_sessions: 1,
        authentication_failures: 6,
        average_auth_time: 2,
        max_auth_time: 11,
        average_session_time: 4200,
        max_session_time: 18000,
        tx_bytes: 3_650_722_201,
        rx_bytes: 1_288_490_188,
    }
}
