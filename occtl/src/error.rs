use std::time::Duration;

use thiserror::Error;

use crate::command::Command;

/// The control command could not be run to completion.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: Command,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {timeout:?}")]
    Timeout { command: Command, timeout: Duration },

    #[error("`{command}` exited with {status}: {stderr}")]
    Exit {
        command: Command,
        status: String,
        stderr: String,
    },
}

/// Output was received but does not have the expected structure.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Empty output")]
    Empty,

    #[error("Malformed JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("Truncated output: {0}")]
    Truncated(#[source] serde_json::Error),

    #[error("Unexpected structure: {0}")]
    Schema(#[source] serde_json::Error),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Eof => DecodeError::Truncated(err),
            Category::Data => DecodeError::Schema(err),
            Category::Syntax | Category::Io => DecodeError::Syntax(err),
        }
    }
}

/// Error returned by the control client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl Error {
    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Transport(_) => "transport",
            Error::Decode(_) => "decode",
        }
    }
}

/// Result type alias using the client's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
