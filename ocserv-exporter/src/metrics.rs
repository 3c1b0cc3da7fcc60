//! Prometheus metrics exported for ocserv.
//!
//! All metric handles live in one [`ExporterMetrics`] value built at startup.
//! Metric names are a compatibility surface shared with existing dashboards
//! and must not change.

use std::sync::atomic::AtomicU64;

use occtl::{ServerStatus, SessionRecord};
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

/// Gauge holding a floating point value.
pub type FloatGauge = Gauge<f64, AtomicU64>;

/// Content type of the text exposition produced by [`ExporterMetrics::encode`].
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// A server-scoped gauge fed from one [`ServerStatus`] field.
pub struct StatusMetric {
    pub name: &'static str,
    pub help: &'static str,
    pub value: fn(&ServerStatus) -> f64,
}

/// Server-scoped gauges, in registration order.
pub const STATUS_METRICS: &[StatusMetric] = &[
    StatusMetric {
        name: "ocserv_start_time_seconds",
        help: "Start time of ocserv since unix epoch in seconds",
        value: |s| s.start_time as f64,
    },
    StatusMetric {
        name: "ocserv_active_sessions",
        help: "Current number of users connected",
        value: |s| s.active_sessions as f64,
    },
    StatusMetric {
        name: "ocserv_handled_sessions",
        help: "Total number of sessions handled since server is up",
        value: |s| s.handled_sessions as f64,
    },
    StatusMetric {
        name: "ocserv_ips_banned",
        help: "Total number of IPs banned",
        value: |s| s.ips_banned as f64,
    },
    StatusMetric {
        name: "ocserv_total_authentication_failures",
        help: "Total number of authentication failures since server is up",
        value: |s| s.total_authentication_failures as f64,
    },
    StatusMetric {
        name: "ocserv_sessions_handled",
        help: "Total number of sessions handled since last stats reset",
        value: |s| s.sessions_handled as f64,
    },
    StatusMetric {
        name: "ocserv_timed_out_sessions",
        help: "Total number of timed out sessions since last stats reset",
        value: |s| s.timed_out_sessions as f64,
    },
    StatusMetric {
        name: "ocserv_timed_out_idle_sessions",
        help: "Total number of sessions timed out (idle) since last stats reset",
        value: |s| s.timed_out_idle_sessions as f64,
    },
    StatusMetric {
        name: "ocserv_closed_error_sessions",
        help: "Total number of sessions closed due to error since last stats reset",
        value: |s| s.closed_error_sessions as f64,
    },
    StatusMetric {
        name: "ocserv_authentication_failures",
        help: "Total number of authentication failures since last stats reset",
        value: |s| s.authentication_failures as f64,
    },
    StatusMetric {
        name: "ocserv_average_auth_time_seconds",
        help: "Average time in seconds spent to authenticate users since last stats reset",
        value: |s| s.average_auth_time as f64,
    },
    StatusMetric {
        name: "ocserv_max_auth_time_seconds",
        help: "Maximum time in seconds spent to authenticate users since last stats reset",
        value: |s| s.max_auth_time as f64,
    },
    StatusMetric {
        name: "ocserv_average_session_time_seconds",
        help: "Average session time in seconds since last stats reset",
        value: |s| s.average_session_time as f64,
    },
    StatusMetric {
        name: "ocserv_max_session_time_seconds",
        help: "Max session time in seconds since last stats reset",
        value: |s| s.max_session_time as f64,
    },
    StatusMetric {
        name: "ocserv_tx_bytes",
        help: "Total TX usage in bytes since last stats reset",
        value: |s| s.tx_bytes as f64,
    },
    StatusMetric {
        name: "ocserv_rx_bytes",
        help: "Total RX usage in bytes since last stats reset",
        value: |s| s.rx_bytes as f64,
    },
];

/// Labels identifying one connected session.
#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct SessionLabels {
    pub username: String,
    pub remote_ip: String,
    pub mtu: String,
    pub ocserv_ipv4: String,
    pub ocserv_ipv6: String,
    pub device: String,
    pub user_agent: String,
}

impl From<&SessionRecord> for SessionLabels {
    fn from(record: &SessionRecord) -> Self {
        Self {
            username: record.username.clone(),
            remote_ip: record.remote_ip.clone(),
            mtu: record.mtu.clone(),
            ocserv_ipv4: record.ipv4.clone(),
            ocserv_ipv6: record.ipv6.clone(),
            device: record.device.clone(),
            user_agent: record.user_agent.clone(),
        }
    }
}

/// Registry and handles for every exported metric.
pub struct ExporterMetrics {
    registry: Registry,
    status: Vec<(&'static StatusMetric, FloatGauge)>,
    user_tx: Family<SessionLabels, FloatGauge>,
    user_rx: Family<SessionLabels, FloatGauge>,
    user_start_time: Family<SessionLabels, FloatGauge>,
    status_scrape_errors: Counter,
    users_scrape_errors: Counter,
}

impl ExporterMetrics {
    /// Create and register all metrics.
    pub fn new() -> Self {
        let mut registry = Registry::default();

        // Counters get the `_total` suffix from the encoder
        let status_scrape_errors = Counter::default();
        registry.register(
            "occtl_status_scrape_error",
            "Total number of errors that occurred when calling occtl show status",
            status_scrape_errors.clone(),
        );
        let users_scrape_errors = Counter::default();
        registry.register(
            "occtl_users_scrape_error",
            "Total number of errors that occurred when calling occtl show users",
            users_scrape_errors.clone(),
        );

        let status = STATUS_METRICS
            .iter()
            .map(|metric| {
                let gauge = FloatGauge::default();
                registry.register(metric.name, metric.help, gauge.clone());
                (metric, gauge)
            })
            .collect();

        let user_tx = Family::<SessionLabels, FloatGauge>::default();
        registry.register(
            "ocserv_user_tx_bytes",
            "Total TX usage in bytes of a user",
            user_tx.clone(),
        );
        let user_rx = Family::<SessionLabels, FloatGauge>::default();
        registry.register(
            "ocserv_user_rx_bytes",
            "Total RX usage in bytes of a user",
            user_rx.clone(),
        );
        let user_start_time = Family::<SessionLabels, FloatGauge>::default();
        registry.register(
            "ocserv_user_start_time_seconds",
            "Start time of user session since unix epoch in seconds",
            user_start_time.clone(),
        );

        Self {
            registry,
            status,
            user_tx,
            user_rx,
            user_start_time,
            status_scrape_errors,
            users_scrape_errors,
        }
    }

    /// Set every server-scoped gauge from a decoded status.
    pub fn set_status(&self, status: &ServerStatus) {
        for (metric, gauge) in &self.status {
            gauge.set((metric.value)(status));
        }
    }

    /// Zero every server-scoped gauge.
    pub fn reset_status(&self) {
        for (_, gauge) in &self.status {
            gauge.set(0.0);
        }
    }

    /// Replace all per-session series with one group per record.
    ///
    /// Records sharing an identical label tuple collapse into one series;
    /// the last one wins.
    pub fn set_sessions(&self, sessions: &[SessionRecord]) {
        self.clear_sessions();

        for record in sessions {
            let labels = SessionLabels::from(record);
            self.user_tx
                .get_or_create(&labels)
                .set(record.tx_bytes as f64);
            self.user_rx
                .get_or_create(&labels)
                .set(record.rx_bytes as f64);
            self.user_start_time
                .get_or_create(&labels)
                .set(record.connected_at as f64);
        }
    }

    /// Remove every per-session series.
    pub fn clear_sessions(&self) {
        self.user_tx.clear();
        self.user_rx.clear();
        self.user_start_time.clear();
    }

    pub fn inc_status_scrape_errors(&self) {
        self.status_scrape_errors.inc();
    }

    pub fn inc_users_scrape_errors(&self) {
        self.users_scrape_errors.inc();
    }

    pub fn status_scrape_errors(&self) -> u64 {
        self.status_scrape_errors.get()
    }

    pub fn users_scrape_errors(&self) -> u64 {
        self.users_scrape_errors.get()
    }

    /// Encode the registry in the text exposition format.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut output = String::new();
        encode(&mut output, &self.registry)?;
        Ok(output)
    }
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}
