//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Parser and dispatch tasks produce:
//!     → logging.rs (structured log events, one result line per replayed request)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout via the fmt layer
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Result lines are tracing events, so each is written in a single write
//! - Metrics go through the `metrics` facade and are no-ops without an exporter

pub mod logging;
pub mod metrics;
