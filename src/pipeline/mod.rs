//! Request pipeline.
//!
//! # Data Flow
//! ```text
//! Event
//!     → Router::dispatcher() (CORS, per-request headers, Response, Storage)
//!     → Dispatcher::handle()
//!         → RouteTable::resolve() (exactly one route + path parameters)
//!         → before middleware (optional)
//!         → chain callbacks, strictly sequential
//!         → terminal callback must hand back the Response
//!         → after middleware (optional)
//!         → Response::send()
//!     → on failure: Dispatcher::error() (classify, mask, render)
//! ```
//!
//! # Design Decisions
//! - One Router per process, one Dispatcher per invocation
//! - Any failure aborts the rest of the pipeline; nothing is swallowed
//! - Callbacks receive handles, never copies, of the request state

pub mod dispatcher;
pub mod handler;

pub use dispatcher::{DispatchState, Dispatcher, Router};
pub use handler::{handler, middleware, Handler, HandlerResult, Middleware, MiddlewareResult, Storage};
