//! Prometheus exporter for the ocserv OpenConnect VPN server.
//!
//! This crate periodically queries ocserv through `occtl`, keeps the latest
//! answer in a snapshot store and exposes it via an HTTP `/metrics` endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   occtl client  │────>│    Refresher    │────>│  Snapshot store │
//! │ (status, users) │     │ (fixed interval)│     │  (one mutex)    │
//! └─────────────────┘     └─────────────────┘     └────────┬────────┘
//!                                                          │
//!                                                 ┌────────▼────────┐
//!                                                 │   HTTP Server   │
//!                                                 │   (/metrics)    │
//!                                                 └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! ocserv-exporter --socket /var/run/occtl.socket --listen 127.0.0.1:8000
//! ocserv-exporter --config config.json5
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod config;
pub mod http;
pub mod metrics;
pub mod refresher;
pub mod store;

pub use config::ExporterConfig;
pub use http::HttpServer;
pub use metrics::ExporterMetrics;
pub use refresher::{RefreshOutcome, Refresher};
pub use store::{RefreshState, RefreshStats, SharedStore, Snapshot, SnapshotStore};
