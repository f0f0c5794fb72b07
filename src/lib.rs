//! HTTP event router for function-as-a-service handlers.

pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod pipeline;
pub mod routing;
pub mod security;

pub use config::schema::{RouterConfig, RouterOptions};
pub use errors::{ErrorKind, HttpError, ValidationError};
pub use http::{ApiResponse, CookieOptions, Event, LocalGateway, Request, Response, SameSite};
pub use pipeline::{handler, middleware, Dispatcher, Handler, HandlerResult, Middleware, MiddlewareResult, Router, Storage};
pub use routing::HttpMethod;
