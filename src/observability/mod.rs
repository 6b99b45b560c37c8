//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! connector operations
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (operation counters, latency, endpoint liveness)
//! ```
//!
//! Metrics go through the `metrics` facade; whichever recorder the host
//! installs receives them, and they are no-ops otherwise.

pub mod logging;
pub mod metrics;
