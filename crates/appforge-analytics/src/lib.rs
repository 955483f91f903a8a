//! appforge-analytics — aggregate reporting over AppForge deployments.
//!
//! Counts every created deployment by provider and by generation method,
//! keeps total and average generation time, and provides
//! Prometheus-compatible text exposition.
//!
//! # Architecture
//!
//! ```text
//! AnalyticsAggregator
//!   ├── record_event() ← called once per created deployment
//!   └── summary()      → AnalyticsSummary for GET /analytics
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```
//!
//! The summary lives in the state store under `analytics:summary`. Each
//! event is a read-modify-write inside one redb write transaction.

pub mod aggregator;
pub mod prometheus;

pub use aggregator::AnalyticsAggregator;
pub use prometheus::render_prometheus;
