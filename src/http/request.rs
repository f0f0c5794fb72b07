//! Inbound event and per-request descriptor.
//!
//! # Responsibilities
//! - Deserialize the API-Gateway-style proxy event
//! - Resolve the path to match (`path`, falling back to `resource`)
//! - Case-insensitive header lookup across single and multi-value headers
//! - Carry resolved path parameters (`routerFlow.pathParameters`) to callbacks
//!
//! # Design Decisions
//! - Unknown transport fields are kept verbatim (`extra`) and never inspected
//! - `Request` is a cheap-clone handle; callbacks all see the same descriptor
//! - Path parameters are attached exactly once, before any callback runs

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::HttpError;

/// A single function-as-a-service HTTP event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub http_method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    #[serde(default)]
    pub multi_value_headers: Option<HashMap<String, Vec<String>>>,

    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,

    #[serde(default)]
    pub multi_value_query_string_parameters: Option<HashMap<String, Vec<String>>>,

    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,

    #[serde(default)]
    pub stage_variables: Option<HashMap<String, String>>,

    #[serde(default)]
    pub request_context: Option<Value>,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub is_base64_encoded: bool,

    /// Transport-specific fields the router does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    /// Create a bare event for the given method and path.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            http_method: method.into(),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Add a single-value header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Add a query string parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Set a raw body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Path the router matches against.
    pub fn route_path(&self) -> &str {
        self.path
            .as_deref()
            .or(self.resource.as_deref())
            .unwrap_or_default()
    }

    /// Case-insensitive header lookup. Single-value headers win over the
    /// first entry of a multi-value header.
    pub fn header(&self, name: &str) -> Option<&str> {
        let single = self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        });

        single.or_else(|| {
            self.multi_value_headers.as_ref().and_then(|headers| {
                headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .and_then(|(_, values)| values.first())
                    .map(String::as_str)
            })
        })
    }

    /// True when any header map was supplied at all.
    pub fn has_headers(&self) -> bool {
        self.headers.is_some() || self.multi_value_headers.is_some()
    }

    /// The request's `Origin` header.
    pub fn origin(&self) -> Option<&str> {
        self.header("origin")
    }

    /// `requestContext.requestId`, when the transport supplied one.
    pub fn context_request_id(&self) -> Option<&str> {
        self.request_context
            .as_ref()
            .and_then(|ctx| ctx.get("requestId"))
            .and_then(Value::as_str)
    }
}

/// Routing results attached to the request before callbacks run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterFlow {
    pub path_parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
struct RequestInner {
    event: Event,
    router_flow: RouterFlow,
    request_id: String,
}

/// Per-invocation request descriptor shared with every callback.
#[derive(Debug, Clone)]
pub struct Request {
    inner: Arc<RequestInner>,
}

impl Request {
    /// Wrap an event. A request ID is taken from the event or generated.
    pub fn new(event: Event) -> Self {
        let request_id = event
            .context_request_id()
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            inner: Arc::new(RequestInner {
                event,
                router_flow: RouterFlow::default(),
                request_id,
            }),
        }
    }

    pub(crate) fn attach_path_parameters(&mut self, params: BTreeMap<String, String>) {
        Arc::make_mut(&mut self.inner).router_flow.path_parameters = params;
    }

    pub fn event(&self) -> &Event {
        &self.inner.event
    }

    pub fn method(&self) -> &str {
        &self.inner.event.http_method
    }

    pub fn path(&self) -> &str {
        self.inner.event.route_path()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.event.header(name)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.inner
            .event
            .query_string_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .map(String::as_str)
    }

    pub fn router_flow(&self) -> &RouterFlow {
        &self.inner.router_flow
    }

    /// Value bound to a `{name+}` segment of the matched template.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.inner
            .router_flow
            .path_parameters
            .get(name)
            .map(String::as_str)
    }

    pub fn body(&self) -> Option<&str> {
        self.inner.event.body.as_deref()
    }

    pub fn request_id(&self) -> &str {
        &self.inner.request_id
    }

    /// Deserialize the JSON body.
    ///
    /// Missing, base64-encoded and malformed bodies are client errors.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        let event = &self.inner.event;
        if event.is_base64_encoded {
            return Err(HttpError::bad_request("Binary bodies are not accepted").with_origin("Request"));
        }
        let raw = event
            .body
            .as_deref()
            .ok_or_else(|| HttpError::bad_request("Request body is missing").with_origin("Request"))?;

        serde_json::from_str(raw).map_err(|e| {
            HttpError::bad_request("Request body is not valid JSON")
                .with_origin("Request")
                .with_debug(serde_json::json!({ "parseError": e.to_string() }))
        })
    }
}
