//! Shared utilities for integration tests.
#![allow(dead_code)]

use event_router::config::{HeaderConfig, RouterOptions};
use event_router::{handler, ApiResponse, Handler, Response, Router};
use serde_json::Value;

/// Parse the rendered body as JSON.
pub fn body_json(response: &ApiResponse) -> Value {
    serde_json::from_str(&response.body).expect("response body is JSON")
}

/// Terminal callback answering `status` with `body`.
pub fn reply(status: u16, body: Value) -> Handler {
    handler(move |_, response: Response, _| {
        let body = body.clone();
        async move { Ok(Some(response.status(status)?.json(&body)?)) }
    })
}

/// Router with the given options and default headers.
pub fn router_with(options: RouterOptions, headers: HeaderConfig) -> Router {
    Router::new(options).with_headers(headers)
}

/// Pull `DebugErrorMessage` out of an error body.
pub fn debug_details(response: &ApiResponse) -> Option<Value> {
    body_json(response).get("DebugErrorMessage").cloned()
}
