//! Execution of control commands.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command as Process;
use tracing::{debug, trace};

use crate::command::Command;
use crate::error::TransportError;

/// Runs a control command and returns its raw standard output.
///
/// Implementations must bound the time spent in [`execute`](Self::execute)
/// themselves; callers never cancel an invocation.
pub trait CommandTransport: Send + Sync {
    fn execute(
        &self,
        command: Command,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// Default path of the occtl binary.
pub const DEFAULT_BINARY: &str = "occtl";

/// Default ocserv control socket.
pub const DEFAULT_SOCKET: &str = "/var/run/occtl.socket";

/// Transport that spawns the `occtl` binary.
#[derive(Debug, Clone)]
pub struct OcctlCommander {
    binary: PathBuf,
    socket: PathBuf,
    timeout: Duration,
}

impl OcctlCommander {
    /// Create a commander talking to the given control socket.
    pub fn new(binary: impl Into<PathBuf>, socket: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            socket: socket.into(),
            timeout,
        }
    }

    fn build(&self, command: Command) -> Process {
        let mut process = Process::new(&self.binary);
        process
            .arg("--json")
            .arg("-s")
            .arg(&self.socket)
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        process
    }
}

impl Default for OcctlCommander {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY, DEFAULT_SOCKET, Duration::from_secs(10))
    }
}

impl CommandTransport for OcctlCommander {
    async fn execute(&self, command: Command) -> Result<Vec<u8>, TransportError> {
        debug!(
            binary = %self.binary.display(),
            socket = %self.socket.display(),
            %command,
            "Running occtl"
        );

        // kill_on_drop reaps the child when the timeout drops the future
        let output = tokio::time::timeout(self.timeout, self.build(command).output())
            .await
            .map_err(|_| TransportError::Timeout {
                command,
                timeout: self.timeout,
            })?
            .map_err(|source| TransportError::Spawn { command, source })?;

        if !output.status.success() {
            return Err(TransportError::Exit {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        trace!(%command, bytes = output.stdout.len(), "occtl returned");
        Ok(output.stdout)
    }
}
