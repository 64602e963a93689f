//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every subsystem produces:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (dispatch and upstream-failure counters)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape, opt-in)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached to every request and logged
//! - Metrics are cheap counters; recording is a no-op without an exporter

pub mod logging;
pub mod metrics;
