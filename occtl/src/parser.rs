//! Decoding of raw `occtl --json` output.

use crate::error::DecodeError;
use crate::types::{ServerStatus, SessionRecord};

/// Decode the output of `occtl --json show status`.
pub fn parse_status(raw: &[u8]) -> Result<ServerStatus, DecodeError> {
    if is_blank(raw) {
        return Err(DecodeError::Empty);
    }

    Ok(serde_json::from_slice(raw)?)
}

/// Decode the output of `occtl --json show users`.
///
/// occtl prints nothing at all when no client is connected, so blank output
/// is an empty list rather than an error.
pub fn parse_sessions(raw: &[u8]) -> Result<Vec<SessionRecord>, DecodeError> {
    if is_blank(raw) {
        return Ok(Vec::new());
    }

    Ok(serde_json::from_slice(raw)?)
}

fn is_blank(raw: &[u8]) -> bool {
    raw.iter().all(|b| b.is_ascii_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = r#"{
        "Status":  "online",
        "Server PID":  1042,
        "Sec-mod PID":  1051,
        "Up since":  "2024-03-01 08:00",
        "raw_up_since":  1709280000,
        "uptime":  86400,
        "Active sessions":  3,
        "Total sessions":  120,
        "Total authentication failures":  7,
        "IPs in ban list":  2,
        "Last stats reset":  "2024-03-02 08:00",
        "raw_last_stats_reset":  1709366400,
        "Sessions handled":  40,
        "Timed out sessions":  4,
        "Timed out (idle) sessions":  5,
        "Closed due to error sessions":  1,
        "Authentication failures":  6,
        "Average auth time":  "    2s",
        "raw_avg_auth_time":  2,
        "Max auth time":  "   11s",
        "raw_max_auth_time":  11,
        "Average session time":  "01:10",
        "raw_avg_session_time":  4200,
        "Max session time":  "05:00",
        "raw_max_session_time":  18000,
        "RX":  "1.2 GB",
        "raw_rx":  1288490188,
        "TX":  "3.4 GB",
        "raw_tx":  "3650722201"
    }"#;

    const USERS: &str = r#"[
        {
            "ID":  3411,
            "Username":  "alice",
            "Groupname":  "(none)",
            "State":  "connected",
            "vhost":  "default",
            "Device":  "vpns0",
            "MTU":  "1434",
            "Remote IP":  "203.0.113.10",
            "Location":  "unknown",
            "Local Device IP":  "198.51.100.1",
            "IPv4":  "10.10.0.2",
            "P-t-P IPv4":  "10.10.0.1",
            "IPv6":  "fd00::2",
            "User-Agent":  "AnyConnect Linux_64 4.10.07061",
            "RX":  "20480",
            "TX":  "40960",
            "_RX":  "20.0 KB",
            "_TX":  "40.0 KB",
            "Connected at":  "2024-03-02 09:15",
            "_Connected at":  " 1h:02m",
            "raw_connected_at":  1709370900
        },
        {
            "Username":  "bob",
            "Device":  "vpns1",
            "MTU":  1400,
            "Remote IP":  "192.0.2.44",
            "IPv4":  "10.10.0.3",
            "IPv6":  "",
            "User-Agent":  "OpenConnect-GUI 1.5.3",
            "RX":  512,
            "TX":  1024,
            "raw_connected_at":  "1709371000"
        }
    ]"#;

    #[test]
    fn test_parse_status() {
        let status = parse_status(STATUS.as_bytes()).unwrap();

        assert_eq!(status.start_time, 1709280000);
        assert_eq!(status.active_sessions, 3);
        assert_eq!(status.handled_sessions, 120);
        assert_eq!(status.ips_banned, 2);
        assert_eq!(status.total_authentication_failures, 7);
        assert_eq!(status.sessions_handled, 40);
        assert_eq!(status.timed_out_sessions, 4);
        assert_eq!(status.timed_out_idle_sessions, 5);
        assert_eq!(status.closed_error_sessions, 1);
        assert_eq!(status.authentication_failures, 6);
        assert_eq!(status.average_auth_time, 2);
        assert_eq!(status.max_auth_time, 11);
        assert_eq!(status.average_session_time, 4200);
        assert_eq!(status.max_session_time, 18000);
        assert_eq!(status.rx_bytes, 1288490188);
        // Quoted counters are accepted
        assert_eq!(status.tx_bytes, 3650722201);
    }

    #[test]
    fn test_parse_status_empty() {
        assert!(matches!(parse_status(b""), Err(DecodeError::Empty)));
        assert!(matches!(parse_status(b" \n"), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_parse_status_missing_field() {
        let json = STATUS.replace("\"Active sessions\":  3,", "");
        let err = parse_status(json.as_bytes()).unwrap_err();

        assert!(matches!(err, DecodeError::Schema(_)));
        assert!(err.to_string().contains("Active sessions"));
    }

    #[test]
    fn test_parse_status_non_numeric() {
        let json = STATUS.replace("\"raw_avg_auth_time\":  2", "\"raw_avg_auth_time\":  \"2s\"");
        let err = parse_status(json.as_bytes()).unwrap_err();

        assert!(matches!(err, DecodeError::Schema(_)));
    }

    #[test]
    fn test_parse_status_negative_counter() {
        let json = STATUS.replace("\"IPs in ban list\":  2", "\"IPs in ban list\":  -2");
        assert!(matches!(
            parse_status(json.as_bytes()),
            Err(DecodeError::Schema(_))
        ));
    }

    #[test]
    fn test_parse_status_truncated() {
        let truncated = &STATUS.as_bytes()[..STATUS.len() / 2];
        assert!(matches!(
            parse_status(truncated),
            Err(DecodeError::Truncated(_))
        ));
    }

    #[test]
    fn test_parse_status_error_text() {
        let err = parse_status(b"could not connect to ocserv\n").unwrap_err();
        assert!(matches!(err, DecodeError::Syntax(_)));
    }

    #[test]
    fn test_parse_sessions() {
        let sessions = parse_sessions(USERS.as_bytes()).unwrap();
        assert_eq!(sessions.len(), 2);

        let alice = &sessions[0];
        assert_eq!(alice.username, "alice");
        assert_eq!(alice.remote_ip, "203.0.113.10");
        assert_eq!(alice.mtu, "1434");
        assert_eq!(alice.ipv4, "10.10.0.2");
        assert_eq!(alice.ipv6, "fd00::2");
        assert_eq!(alice.device, "vpns0");
        assert_eq!(alice.user_agent, "AnyConnect Linux_64 4.10.07061");
        assert_eq!(alice.connected_at, 1709370900);
        assert_eq!(alice.rx_bytes, 20480);
        assert_eq!(alice.tx_bytes, 40960);

        let bob = &sessions[1];
        assert_eq!(bob.mtu, "1400");
        assert_eq!(bob.ipv6, "");
        assert_eq!(bob.connected_at, 1709371000);
        assert_eq!(bob.tx_bytes, 1024);
    }

    #[test]
    fn test_parse_sessions_no_connections() {
        assert!(parse_sessions(b"").unwrap().is_empty());
        assert!(parse_sessions(b"\n").unwrap().is_empty());
        assert!(parse_sessions(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_sessions_missing_field() {
        let json = USERS.replace("\"User-Agent\":  \"OpenConnect-GUI 1.5.3\",", "");
        let err = parse_sessions(json.as_bytes()).unwrap_err();

        assert!(matches!(err, DecodeError::Schema(_)));
        assert!(err.to_string().contains("User-Agent"));
    }

    #[test]
    fn test_parse_sessions_without_ipv6() {
        let json = USERS.replace("\"IPv6\":  \"\",", "");
        let sessions = parse_sessions(json.as_bytes()).unwrap();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[1].username, "bob");
        assert_eq!(sessions[1].ipv6, "");
        assert_eq!(sessions[1].ipv4, "10.10.0.3");
    }

    #[test]
    fn test_parse_sessions_bad_byte_count() {
        let json = USERS.replace("\"RX\":  \"20480\"", "\"RX\":  \"20.0 KB\"");
        assert!(matches!(
            parse_sessions(json.as_bytes()),
            Err(DecodeError::Schema(_))
        ));
    }

    #[test]
    fn test_parse_sessions_not_a_list() {
        assert!(matches!(
            parse_sessions(STATUS.as_bytes()),
            Err(DecodeError::Schema(_))
        ));
    }
}
