//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router / Dispatcher / LocalGateway produce:
//!     → logging.rs (structured log events, one span per invocation)
//!     → metrics.rs (counters and latency histograms)
//!
//! Consumers:
//!     → stdout (JSON lines, collected by the FaaS host)
//!     → whatever metrics recorder the host installs
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every log line of an invocation
//! - The library never installs a metrics recorder itself

pub mod logging;
pub mod metrics;
