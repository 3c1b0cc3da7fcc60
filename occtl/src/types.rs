//! Typed records decoded from `occtl --json` output.
//!
//! Field names follow the keys printed by `occtl`. Counters and timestamps
//! keep their raw integer form; occtl quotes some of them, so numeric fields
//! accept both JSON numbers and decimal strings.

use serde::{Deserialize, Serialize};

/// Aggregate server status as reported by `occtl show status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    /// Server start time, unix epoch seconds.
    #[serde(rename = "raw_up_since", deserialize_with = "lenient::i64")]
    pub start_time: i64,

    /// Currently connected sessions.
    #[serde(rename = "Active sessions", deserialize_with = "lenient::u64")]
    pub active_sessions: u64,

    /// Sessions handled since the server started.
    #[serde(rename = "Total sessions", deserialize_with = "lenient::u64")]
    pub handled_sessions: u64,

    #[serde(rename = "IPs in ban list", deserialize_with = "lenient::u64")]
    pub ips_banned: u64,

    /// Authentication failures since the server started.
    #[serde(
        rename = "Total authentication failures",
        deserialize_with = "lenient::u64"
    )]
    pub total_authentication_failures: u64,

    /// Sessions handled since the last stats reset.
    #[serde(rename = "Sessions handled", deserialize_with = "lenient::u64")]
    pub sessions_handled: u64,

    #[serde(rename = "Timed out sessions", deserialize_with = "lenient::u64")]
    pub timed_out_sessions: u64,

    #[serde(
        rename = "Timed out (idle) sessions",
        deserialize_with = "lenient::u64"
    )]
    pub timed_out_idle_sessions: u64,

    #[serde(
        rename = "Closed due to error sessions",
        deserialize_with = "lenient::u64"
    )]
    pub closed_error_sessions: u64,

    /// Authentication failures since the last stats reset.
    #[serde(rename = "Authentication failures", deserialize_with = "lenient::u64")]
    pub authentication_failures: u64,

    /// Average authentication time in seconds.
    #[serde(rename = "raw_avg_auth_time", deserialize_with = "lenient::u64")]
    pub average_auth_time: u64,

    #[serde(rename = "raw_max_auth_time", deserialize_with = "lenient::u64")]
    pub max_auth_time: u64,

    /// Average session duration in seconds.
    #[serde(rename = "raw_avg_session_time", deserialize_with = "lenient::u64")]
    pub average_session_time: u64,

    #[serde(rename = "raw_max_session_time", deserialize_with = "lenient::u64")]
    pub max_session_time: u64,

    /// Bytes sent since the last stats reset.
    #[serde(rename = "raw_tx", deserialize_with = "lenient::u64")]
    pub tx_bytes: u64,

    /// Bytes received since the last stats reset.
    #[serde(rename = "raw_rx", deserialize_with = "lenient::u64")]
    pub rx_bytes: u64,
}

/// One connected client as reported by `occtl show users`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(rename = "Username")]
    pub username: String,

    #[serde(rename = "Remote IP")]
    pub remote_ip: String,

    /// Negotiated MTU, kept as text since it is only used as a label.
    #[serde(rename = "MTU", deserialize_with = "lenient::label")]
    pub mtu: String,

    /// Address assigned inside the tunnel.
    #[serde(rename = "IPv4")]
    pub ipv4: String,

    /// Empty when the key is absent (IPv4-only deployments).
    #[serde(rename = "IPv6", default)]
    pub ipv6: String,

    /// Server-side tunnel device (e.g. `vpns0`).
    #[serde(rename = "Device")]
    pub device: String,

    #[serde(rename = "User-Agent")]
    pub user_agent: String,

    /// Connection start, unix epoch seconds.
    #[serde(rename = "raw_connected_at", deserialize_with = "lenient::i64")]
    pub connected_at: i64,

    #[serde(rename = "TX", deserialize_with = "lenient::u64")]
    pub tx_bytes: u64,

    #[serde(rename = "RX", deserialize_with = "lenient::u64")]
    pub rx_bytes: u64,
}

mod lenient {
    use std::fmt;

    use serde::Deserializer;
    use serde::de::{Error, Unexpected, Visitor};

    pub fn u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        deserializer.deserialize_any(U64Visitor)
    }

    pub fn i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        deserializer.deserialize_any(I64Visitor)
    }

    pub fn label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        deserializer.deserialize_any(LabelVisitor)
    }

    struct U64Visitor;

    impl Visitor<'_> for U64Visitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative integer or a string containing one")
        }

        fn visit_u64<E: Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
        }

        fn visit_f64<E: Error>(self, v: f64) -> Result<u64, E> {
            if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
                Ok(v as u64)
            } else {
                Err(E::invalid_value(Unexpected::Float(v), &self))
            }
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<u64, E> {
            v.trim()
                .parse()
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }
    }

    struct I64Visitor;

    impl Visitor<'_> for I64Visitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer or a string containing one")
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<i64, E> {
            v.trim()
                .parse()
                .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
        }
    }

    struct LabelVisitor;

    impl Visitor<'_> for LabelVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or an integer")
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }
}
