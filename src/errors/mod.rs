//! Error taxonomy.
//!
//! # Data Flow
//! ```text
//! failure detected (matcher, registration, callback, middleware, builder)
//!     → HttpError (taxonomy, trusted when operational)
//!     → or any other error (untrusted, wrapped in anyhow::Error)
//!     → propagated unchanged up the pipeline
//!     → Dispatcher::error() classifies via is_trusted()
//!     → report.rs renders the client-safe body
//! ```
//!
//! # Design Decisions
//! - Callbacks speak `anyhow::Error` so `?` works on any error type
//! - Trust is decided by downcasting, never by inspecting messages
//! - Builder misuse (`ValidationError`) is a programmer error and is masked

pub mod kinds;
pub mod report;

pub use kinds::{ErrorKind, HttpError, ValidationError};
pub use report::{is_trusted, ErrorReport, MASKED_MESSAGE};
