//! Snapshot store shared by the refresh loop and the HTTP handlers.
//!
//! One mutex guards both the latest decoded data and the exported metric
//! state. Every write below is its own critical section, so a refresh cycle
//! commits status and sessions separately and a concurrent reader may see the
//! new status next to the previous session list. No reader sees a partially
//! applied write.

use std::sync::Arc;

use occtl::{ServerStatus, SessionRecord};
use parking_lot::Mutex;
use tracing::trace;

use crate::metrics::ExporterMetrics;

/// Whether a refresh cycle is in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshState {
    #[default]
    Idle,
    Refreshing,
}

/// Per-category refresh counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub status_fetched: u64,
    pub status_failed: u64,
    pub sessions_fetched: u64,
    pub sessions_failed: u64,
}

/// Latest known data for each category.
///
/// Each category keeps its last successfully fetched value; a failed fetch
/// leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub status: Option<ServerStatus>,
    pub sessions: Option<Vec<SessionRecord>>,
    pub stats: RefreshStats,
    pub state: RefreshState,
}

struct Inner {
    snapshot: Snapshot,
    metrics: ExporterMetrics,
}

/// Thread-safe holder of the current snapshot and its metrics.
pub struct SnapshotStore {
    inner: Mutex<Inner>,
}

/// Create a shareable store handle.
pub type SharedStore = Arc<SnapshotStore>;

impl SnapshotStore {
    pub fn new(metrics: ExporterMetrics) -> Self {
        Self {
            inner: Mutex::new(Inner {
                snapshot: Snapshot::default(),
                metrics,
            }),
        }
    }

    /// Mark the start of a refresh cycle.
    pub fn begin_refresh(&self) {
        self.inner.lock().snapshot.state = RefreshState::Refreshing;
    }

    /// Mark the end of a refresh cycle, whatever its outcome.
    pub fn end_refresh(&self) {
        self.inner.lock().snapshot.state = RefreshState::Idle;
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.inner.lock().snapshot.state
    }

    /// Replace the server status and set every status gauge.
    pub fn commit_status(&self, status: ServerStatus) {
        let mut inner = self.inner.lock();
        inner.metrics.set_status(&status);
        inner.snapshot.status = Some(status);
        inner.snapshot.stats.status_fetched += 1;
    }

    /// Record a failed status fetch and zero the status gauges.
    pub fn fail_status(&self) {
        let mut inner = self.inner.lock();
        inner.metrics.inc_status_scrape_errors();
        inner.metrics.reset_status();
        inner.snapshot.stats.status_failed += 1;
    }

    /// Replace the session list and all per-session series.
    pub fn commit_sessions(&self, sessions: Vec<SessionRecord>) {
        let mut inner = self.inner.lock();
        inner.metrics.set_sessions(&sessions);
        trace!(count = sessions.len(), "Committed sessions");
        inner.snapshot.sessions = Some(sessions);
        inner.snapshot.stats.sessions_fetched += 1;
    }

    /// Record a failed session fetch and drop every per-session series.
    pub fn fail_sessions(&self) {
        let mut inner = self.inner.lock();
        inner.metrics.inc_users_scrape_errors();
        inner.metrics.clear_sessions();
        inner.snapshot.stats.sessions_failed += 1;
    }

    /// Render the current metrics in the text exposition format.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        self.inner.lock().metrics.encode()
    }

    /// Copy of the current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.lock().snapshot.clone()
    }

    /// Refresh counts without cloning the data.
    pub fn stats(&self) -> RefreshStats {
        self.inner.lock().snapshot.stats
    }

    /// Whether a status fetch has ever succeeded.
    pub fn has_status(&self) -> bool {
        self.inner.lock().snapshot.status.is_some()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(ExporterMetrics::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occtl::mock;

    fn sample(output: &str, name: &str) -> Option<f64> {
        let prefix = format!("{} ", name);
        output
            .lines()
            .find_map(|l| l.strip_prefix(prefix.as_str()))
            .and_then(|v| v.trim().parse().ok())
    }

    fn count_series(output: &str, name: &str) -> usize {
        let prefix = format!("{}{{", name);
        output.lines().filter(|l| l.starts_with(&prefix)).count()
    }

    #[test]
    fn test_empty_store() {
        let store = SnapshotStore::default();
        let snapshot = store.snapshot();

        assert!(snapshot.status.is_none());
        assert!(snapshot.sessions.is_none());
        assert_eq!(snapshot.stats, RefreshStats::default());
        assert_eq!(snapshot.state, RefreshState::Idle);
        assert!(!store.has_status());
        assert!(store.render().is_ok());
    }

    #[test]
    fn test_refresh_state_transitions() {
        let store = SnapshotStore::default();

        store.begin_refresh();
        assert_eq!(store.refresh_state(), RefreshState::Refreshing);
        assert_eq!(store.snapshot().state, RefreshState::Refreshing);

        store.end_refresh();
        assert_eq!(store.refresh_state(), RefreshState::Idle);
    }

    #[test]
    fn test_failed_status_keeps_last_known_good() {
        let store = SnapshotStore::default();
        store.commit_status(mock::status(3, 120));
        store.fail_status();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.status, Some(mock::status(3, 120)));
        assert_eq!(snapshot.stats.status_fetched, 1);
        assert_eq!(snapshot.stats.status_failed, 1);

        // Exported gauges do not keep the stale value
        let output = store.render().unwrap();
        assert_eq!(sample(&output, "ocserv_active_sessions"), Some(0.0));
    }

    #[test]
    fn test_failed_sessions_clear_series_only() {
        let store = SnapshotStore::default();
        store.commit_status(mock::status(3, 120));
        store.commit_sessions(vec![mock::session("alice", "203.0.113.10")]);
        store.fail_sessions();

        let output = store.render().unwrap();
        assert_eq!(count_series(&output, "ocserv_user_tx_bytes"), 0);
        assert_eq!(sample(&output, "ocserv_active_sessions"), Some(3.0));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.sessions.map(|s| s.len()), Some(1));
        assert_eq!(snapshot.stats.sessions_failed, 1);
        assert_eq!(snapshot.stats.status_failed, 0);
    }

    #[test]
    fn test_commit_sessions_replaces_wholesale() {
        let store = SnapshotStore::default();
        store.commit_sessions(vec![
            mock::session("alice", "203.0.113.10"),
            mock::session("bob", "192.0.2.44"),
        ]);
        store.commit_sessions(vec![]);

        let output = store.render().unwrap();
        assert_eq!(count_series(&output, "ocserv_user_tx_bytes"), 0);
        assert_eq!(store.snapshot().sessions, Some(vec![]));
        assert_eq!(store.stats().sessions_fetched, 2);
    }

    #[test]
    fn test_concurrent_readers_see_whole_records() {
        let store = Arc::new(SnapshotStore::default());

        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..200u64 {
                    store.commit_status(mock::status(i, i));
                    let sessions = (0..(i % 5))
                        .map(|n| mock::session(&format!("user{}", n), "192.0.2.1"))
                        .collect();
                    store.commit_sessions(sessions);
                }
            })
        };

        for _ in 0..200 {
            let snapshot = store.snapshot();
            if let Some(status) = snapshot.status {
                // Both fields come from the same write
                assert_eq!(status.active_sessions, status.handled_sessions);
            }

            let output = store.render().unwrap();
            assert_eq!(
                sample(&output, "ocserv_active_sessions"),
                sample(&output, "ocserv_handled_sessions")
            );
        }

        writer.join().unwrap();
    }
}
