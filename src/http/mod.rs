//! HTTP event handling subsystem.
//!
//! # Data Flow
//! ```text
//! FaaS event (or local HTTP request via server.rs)
//!     → request.rs (Event, Request descriptor, request ID)
//!     → [pipeline runs the matched chain]
//!     → response.rs (status, headers, cookies via cookie.rs, JSON body)
//!     → ApiResponse { statusCode, body, headers }
//! ```

pub mod cookie;
pub mod request;
pub mod response;
pub mod server;

pub use cookie::{CookieOptions, SameSite};
pub use request::{Event, Request, RouterFlow};
pub use response::{ApiResponse, HeaderScalar, Response};
pub use server::LocalGateway;
