//! Response accumulation and rendering.
//!
//! # Responsibilities
//! - Accumulate status, headers, cookies and a JSON body
//! - Reject malformed input at the call site (`ValidationError`)
//! - Render the final `{ statusCode, body, headers }` triple
//!
//! # Design Decisions
//! - `Response` is a handle: clones address the same accumulator, so every
//!   callback of a request mutates one response
//! - Builder methods return a fresh handle so calls chain with `?`
//! - The status starts at 500; a chain that never sets one reports failure
//! - An unset body renders as the literal `undefined`

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ValidationError;
use crate::http::cookie::{self, CookieOptions};

/// Body text sent when no body was ever set.
pub const UNSET_BODY: &str = "undefined";

const CONTENT_TYPE: &str = "Content-Type";

/// Scalar header value as accepted by [`Response::set`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderScalar {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl HeaderScalar {
    /// Empty strings, zero and `false` are not accepted as header values.
    pub fn is_falsy(&self) -> bool {
        match self {
            HeaderScalar::Bool(b) => !b,
            HeaderScalar::Int(i) => *i == 0,
            HeaderScalar::Str(s) => s.is_empty(),
        }
    }
}

impl std::fmt::Display for HeaderScalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaderScalar::Bool(b) => write!(f, "{}", b),
            HeaderScalar::Int(i) => write!(f, "{}", i),
            HeaderScalar::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for HeaderScalar {
    fn from(value: &str) -> Self {
        HeaderScalar::Str(value.to_owned())
    }
}

impl From<String> for HeaderScalar {
    fn from(value: String) -> Self {
        HeaderScalar::Str(value)
    }
}

impl From<bool> for HeaderScalar {
    fn from(value: bool) -> Self {
        HeaderScalar::Bool(value)
    }
}

impl From<i64> for HeaderScalar {
    fn from(value: i64) -> Self {
        HeaderScalar::Int(value)
    }
}

impl From<i32> for HeaderScalar {
    fn from(value: i32) -> Self {
        HeaderScalar::Int(value.into())
    }
}

impl From<u32> for HeaderScalar {
    fn from(value: u32) -> Self {
        HeaderScalar::Int(value.into())
    }
}

impl From<u16> for HeaderScalar {
    fn from(value: u16) -> Self {
        HeaderScalar::Int(value.into())
    }
}

/// Rendered response in the proxy-integration shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: String,
    pub headers: BTreeMap<String, String>,
}

impl ApiResponse {
    /// Header lookup by exact key.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// All cookie headers, whatever their key casing.
    pub fn cookies(&self) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(cookie::SET_COOKIE))
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

#[derive(Debug)]
struct ResponseState {
    status: u16,
    headers: BTreeMap<String, HeaderScalar>,
    body: Option<Value>,
}

/// Shared, mutable response builder.
#[derive(Debug, Clone)]
pub struct Response {
    state: Arc<Mutex<ResponseState>>,
}

impl Response {
    /// Create a builder seeded with default headers.
    pub fn new(headers: BTreeMap<String, HeaderScalar>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ResponseState {
                status: 500,
                headers,
                body: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ResponseState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True when both handles address the same accumulator.
    pub fn same_as(&self, other: &Response) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Store a header.
    pub fn set(&self, key: &str, value: impl Into<HeaderScalar>) -> Result<Response, ValidationError> {
        let value = value.into();
        if key.is_empty() || value.is_falsy() {
            return Err(ValidationError::InvalidHeader);
        }
        self.lock().headers.insert(key.to_owned(), value);
        Ok(self.clone())
    }

    /// Store the HTTP status.
    pub fn status(&self, code: u16) -> Result<Response, ValidationError> {
        if !(100..=999).contains(&code) {
            return Err(ValidationError::InvalidStatus(code));
        }
        self.lock().status = code;
        Ok(self.clone())
    }

    /// Add a cookie under a header key no earlier header uses.
    pub fn cookie(
        &self,
        name: &str,
        value: &str,
        options: CookieOptions,
    ) -> Result<Response, ValidationError> {
        let rendered = cookie::render(name, value, &options, Utc::now())?;

        let mut state = self.lock();
        let slot = cookie::header_slots()
            .find(|key| !state.headers.contains_key(key))
            .ok_or(ValidationError::CookieSlotsExhausted)?;
        state.headers.insert(slot, HeaderScalar::Str(rendered));
        drop(state);

        Ok(self.clone())
    }

    /// Store the body. Only values serializing to a JSON object or array are
    /// accepted.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<Response, ValidationError> {
        let value = serde_json::to_value(value).map_err(|_| ValidationError::InvalidJson)?;
        if !(value.is_object() || value.is_array()) {
            return Err(ValidationError::InvalidJson);
        }
        self.lock().body = Some(value);
        Ok(self.clone())
    }

    pub(crate) fn overwrite(&self, status: u16, body: Value) {
        let mut state = self.lock();
        state.status = status;
        state.body = Some(body);
    }

    pub fn status_code(&self) -> u16 {
        self.lock().status
    }

    pub fn header(&self, key: &str) -> Option<HeaderScalar> {
        self.lock().headers.get(key).cloned()
    }

    /// Snapshot of the accumulated headers, `Content-Type` excluded.
    pub fn headers(&self) -> BTreeMap<String, HeaderScalar> {
        self.lock().headers.clone()
    }

    pub fn body(&self) -> Option<Value> {
        self.lock().body.clone()
    }

    /// Render the response.
    pub fn send(&self) -> ApiResponse {
        let state = self.lock();

        let mut headers = BTreeMap::new();
        if !state.headers.keys().any(|key| key.eq_ignore_ascii_case(CONTENT_TYPE)) {
            headers.insert(CONTENT_TYPE.to_string(), "application/json".to_string());
        }
        for (key, value) in &state.headers {
            headers.insert(key.clone(), value.to_string());
        }

        let body = match &state.body {
            Some(value) => value.to_string(),
            None => UNSET_BODY.to_string(),
        };

        ApiResponse {
            status_code: state.status,
            body,
            headers,
        }
    }
}
