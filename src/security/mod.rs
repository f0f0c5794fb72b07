//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher construction:
//!     → cors.rs (resolve Access-Control-Allow-Origin for this request)
//!     → per-request copy of the default headers
//!     → Response builder
//! ```
//!
//! # Design Decisions
//! - Fail closed: CORS mode with no Origin to negotiate is an error
//! - Configuration is shared, the resolved header never is

pub mod cors;

pub use cors::{AllowOrigin, ALLOW_ORIGIN};
