//! Periodic refresh of the snapshot store from occtl.

use std::time::Duration;

use occtl::{Client, CommandTransport};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::store::SharedStore;

/// Result of one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Whether the status fetch succeeded.
    pub status: bool,
    /// Number of sessions fetched, `None` if the fetch failed.
    pub sessions: Option<usize>,
}

/// Fetches status and sessions and commits them to the store.
///
/// Fetch errors never leave this type: they become scrape error counter
/// increments and log lines, and the next tick is the retry.
pub struct Refresher<T> {
    client: Client<T>,
    store: SharedStore,
    interval: Duration,
}

impl<T: CommandTransport> Refresher<T> {
    pub fn new(client: Client<T>, store: SharedStore, interval: Duration) -> Self {
        Self {
            client,
            store,
            interval,
        }
    }

    /// Run one refresh cycle: status first, then sessions.
    ///
    /// The two categories are independent; a failure in one does not skip
    /// or affect the other. The store reports the cycle as refreshing
    /// until both have been committed.
    pub async fn refresh(&mut self) -> RefreshOutcome {
        self.store.begin_refresh();

        let status = self.refresh_status().await;
        let sessions = self.refresh_sessions().await;

        self.store.end_refresh();

        debug!(status_ok = status, sessions = ?sessions, "Refresh cycle complete");
        RefreshOutcome { status, sessions }
    }

    async fn refresh_status(&self) -> bool {
        match self.client.fetch_status().await {
            Ok(status) => {
                self.store.commit_status(status);
                true
            }
            Err(e) => {
                error!(kind = e.kind(), "Failed to get server status: {}", e);
                self.store.fail_status();
                false
            }
        }
    }

    async fn refresh_sessions(&self) -> Option<usize> {
        match self.client.fetch_sessions().await {
            Ok(sessions) => {
                let count = sessions.len();
                self.store.commit_sessions(sessions);
                Some(count)
            }
            Err(e) => {
                error!(kind = e.kind(), "Failed to get users details: {}", e);
                self.store.fail_sessions();
                None
            }
        }
    }

    /// Refresh once per interval until shutdown is signalled.
    ///
    /// The first tick fires one interval from now; callers perform the
    /// startup refresh themselves with [`refresh`](Self::refresh).
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(interval = ?self.interval, "Starting refresh loop");

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Refresh loop stopped");
    }
}
