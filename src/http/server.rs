//! Local HTTP gateway.
//!
//! # Responsibilities
//! - Serve a `Router` over plain HTTP for local development
//! - Translate each HTTP request into an `Event` the way a FaaS gateway would
//! - Translate the `ApiResponse` back into an HTTP response
//!
//! # Design Decisions
//! - Every path and method goes to one fallback handler; route matching
//!   belongs to the `Router`, not to axum
//! - Header values that are not valid HTTP are dropped with a warning

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::http::request::Event;
use crate::http::response::ApiResponse;
use crate::pipeline::Router;

#[derive(Clone)]
struct GatewayState {
    router: Arc<Router>,
    max_body_bytes: usize,
}

/// HTTP front end for a `Router`.
pub struct LocalGateway {
    app: axum::Router,
}

impl LocalGateway {
    pub fn new(router: Arc<Router>, config: &ServerConfig) -> Self {
        let state = GatewayState {
            router,
            max_body_bytes: config.max_body_bytes,
        };

        Self {
            app: Self::build_router(state),
        }
    }

    fn build_router(state: GatewayState) -> axum::Router {
        axum::Router::new()
            .fallback(gateway_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The axum application, for embedding or in-process testing.
    pub fn into_router(self) -> axum::Router {
        self.app
    }

    /// Serve until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Local gateway starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Local gateway stopped");
        Ok(())
    }
}

async fn gateway_handler(State(state): State<GatewayState>, request: Request) -> Response {
    let event = match to_event(request, state.max_body_bytes).await {
        Ok(event) => event,
        Err(rejection) => return rejection,
    };

    let api = state.router.respond(event).await;
    from_api_response(api)
}

/// Build the event a FaaS gateway would deliver for this request.
async fn to_event(request: Request, max_body_bytes: usize) -> Result<Event, Response> {
    let (parts, body) = request.into_parts();

    let mut event = Event::new(parts.method.as_str(), parts.uri.path());
    event.resource = Some(parts.uri.path().to_string());

    let (headers, multi_value_headers) = collect_headers(&parts.headers);
    event.headers = Some(headers);
    event.multi_value_headers = Some(multi_value_headers);

    if parts.uri.query().is_some() {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|rejection| (StatusCode::BAD_REQUEST, rejection.body_text()).into_response())?;

        let mut single = HashMap::new();
        let mut multi: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in pairs {
            multi.entry(name.clone()).or_default().push(value.clone());
            single.insert(name, value);
        }
        event.query_string_parameters = Some(single);
        event.multi_value_query_string_parameters = Some(multi);
    }

    let bytes = axum::body::to_bytes(body, max_body_bytes)
        .await
        .map_err(|_| (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response())?;
    if !bytes.is_empty() {
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| (StatusCode::BAD_REQUEST, "Request body must be UTF-8").into_response())?;
        event.body = Some(text);
    }

    event.request_context = Some(json!({
        "requestId": Uuid::new_v4().to_string(),
        "stage": "local",
        "httpMethod": parts.method.as_str(),
    }));

    Ok(event)
}

fn collect_headers(map: &HeaderMap) -> (HashMap<String, String>, HashMap<String, Vec<String>>) {
    let mut single = HashMap::new();
    let mut multi: HashMap<String, Vec<String>> = HashMap::new();

    for (name, value) in map {
        let Ok(value) = value.to_str() else {
            tracing::warn!(header = %name, "Skipping non-ASCII request header");
            continue;
        };
        multi
            .entry(name.as_str().to_string())
            .or_default()
            .push(value.to_string());
        single.insert(name.as_str().to_string(), value.to_string());
    }

    (single, multi)
}

/// Convert a rendered response into HTTP. Case-variant `Set-Cookie` keys
/// collapse into repeated `set-cookie` headers.
fn from_api_response(api: ApiResponse) -> Response {
    let status = StatusCode::from_u16(api.status_code).unwrap_or_else(|_| {
        tracing::warn!(status = api.status_code, "Status code not representable over HTTP");
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut headers = HeaderMap::new();
    for (name, value) in &api.headers {
        match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::warn!(header = %name, "Dropping invalid response header"),
        }
    }

    let mut response = Response::new(Body::from(api.body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
