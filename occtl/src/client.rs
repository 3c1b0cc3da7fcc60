//! Control client composing a transport with the response parser.

use tracing::trace;

use crate::command::Command;
use crate::error::Result;
use crate::parser::{parse_sessions, parse_status};
use crate::transport::CommandTransport;
use crate::types::{ServerStatus, SessionRecord};

/// Client for the ocserv control interface.
///
/// Each fetch runs one command and decodes its output. Nothing is cached:
/// callers decide what to do with the result.
#[derive(Debug, Clone)]
pub struct Client<T> {
    transport: T,
}

impl<T: CommandTransport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the aggregate server status.
    pub async fn fetch_status(&self) -> Result<ServerStatus> {
        let raw = self.transport.execute(Command::ShowStatus).await?;
        let status = parse_status(&raw)?;
        trace!(active_sessions = status.active_sessions, "Decoded server status");
        Ok(status)
    }

    /// Fetch the currently connected sessions.
    ///
    /// Zero sessions is a successful, empty result.
    pub async fn fetch_sessions(&self) -> Result<Vec<SessionRecord>> {
        let raw = self.transport.execute(Command::ShowUsers).await?;
        let sessions = parse_sessions(&raw)?;
        trace!(count = sessions.len(), "Decoded sessions");
        Ok(sessions)
    }
}
