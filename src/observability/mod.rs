//! Observability module providing logging and metrics.
//!
//! - Structured logging with configurable formats (pretty, compact, JSON)
//! - Prometheus counters and histograms for admission and lookup outcomes

pub mod metrics;
mod tracing_init;

pub use tracing_init::*;
