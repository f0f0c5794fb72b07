//! Translation of failures into client-safe response bodies.

use std::backtrace::{Backtrace, BacktraceStatus};

use serde_json::{Map, Value};

use crate::errors::kinds::{HttpError, ValidationError};

/// Message returned for every failure that is not trusted.
pub const MASKED_MESSAGE: &str = "Something went wrong try again later...";

/// Key under which debug details are attached to error bodies.
pub const DEBUG_KEY: &str = "DebugErrorMessage";

/// True iff the error is a taxonomy error flagged operational.
pub fn is_trusted(err: &anyhow::Error) -> bool {
    err.downcast_ref::<HttpError>()
        .is_some_and(HttpError::is_operational)
}

/// Status and body to send for a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub status: u16,
    pub body: Value,
    pub trusted: bool,
    /// Taxonomy kind, or a coarse class for foreign errors.
    pub kind: &'static str,
}

impl ErrorReport {
    /// Classify `err` and build the body, exposing internals only in debug mode.
    pub fn from_error(err: &anyhow::Error, debug: bool) -> Self {
        let taxonomy = err.downcast_ref::<HttpError>();
        match taxonomy {
            Some(http) if http.is_operational() => Self::trusted(err, http, debug),
            _ => Self::masked(err, debug),
        }
    }

    fn masked(err: &anyhow::Error, debug: bool) -> Self {
        let mut body = Map::new();
        body.insert("message".into(), Value::String(MASKED_MESSAGE.into()));

        let source = err.to_string();
        if debug && !source.is_empty() {
            let mut details = Map::new();
            details.insert("errorSource".into(), Value::String(source));
            details.insert("stack".into(), stack_of(err));
            body.insert(DEBUG_KEY.into(), Value::Object(details));
        }

        Self {
            status: 500,
            body: Value::Object(body),
            trusted: false,
            kind: foreign_kind(err),
        }
    }

    fn trusted(err: &anyhow::Error, http: &HttpError, debug: bool) -> Self {
        // 200 is never a valid error status.
        let status = if http.status() == 200 { 500 } else { http.status() };

        let mut body = Map::new();
        body.insert("message".into(), Value::String(http.message().to_owned()));

        if debug {
            let mut details = http.debug_payload().cloned().unwrap_or_default();
            details.insert("methodName".into(), Value::String(http.origin().to_owned()));
            details.insert("stack".into(), stack_of(err));
            body.insert(DEBUG_KEY.into(), Value::Object(details));
        }

        Self {
            status,
            body: Value::Object(body),
            trusted: true,
            kind: http.kind().as_str(),
        }
    }
}

/// Backtrace attached to the error when `RUST_BACKTRACE` enabled capture,
/// otherwise one taken here at the reporting site.
fn stack_of(err: &anyhow::Error) -> Value {
    let backtrace = err.backtrace();
    match backtrace.status() {
        BacktraceStatus::Captured => Value::String(backtrace.to_string()),
        _ => Value::String(Backtrace::force_capture().to_string()),
    }
}

fn foreign_kind(err: &anyhow::Error) -> &'static str {
    if let Some(http) = err.downcast_ref::<HttpError>() {
        http.kind().as_str()
    } else if err.downcast_ref::<ValidationError>().is_some() {
        "ValidationError"
    } else {
        "Unexpected"
    }
}
