//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Channels, transport and API client produce:
//!     → tracing events (structured fields: poll_id, connection_id, attempt)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr, pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
