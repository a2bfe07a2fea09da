//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! HttpClient / SessionRefresher / SessionPoller produce:
//!     → logging.rs (structured tracing events, request ID as a field)
//!     → metrics.rs (counters)
//! ```
//!
//! # Design Decisions
//! - Request ID flows into every request log line
//! - Cookie values never appear in logs
//! - Metrics are cheap and exporter-agnostic

pub mod logging;
pub mod metrics;
