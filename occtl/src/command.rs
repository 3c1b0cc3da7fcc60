//! Administrative commands understood by the control interface.

use std::fmt;

/// A query issued against the control endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Aggregate server status.
    ShowStatus,
    /// Currently connected sessions.
    ShowUsers,
}

impl Command {
    /// Arguments passed to `occtl` after the global options.
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            Command::ShowStatus => &["show", "status"],
            Command::ShowUsers => &["show", "users"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::ShowStatus => "show status",
            Command::ShowUsers => "show users",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
