//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! middleware + backend produce:
//!     → logging.rs (structured log events, transaction spans)
//!     → metrics.rs (transaction counters and latency histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
