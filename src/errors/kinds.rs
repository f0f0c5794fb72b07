//! Taxonomy error types.

use serde_json::{Map, Value};
use thiserror::Error;

/// Named members of the taxonomy, each bound to a default status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The base error with no specialization.
    Base,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    TooManyRequests,
    InternalServerError,
    ServiceError,
    ApiError,
    NotImplemented,
    ServiceUnavailable,
}

impl ErrorKind {
    /// Default HTTP status for this kind.
    pub fn default_status(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::NotImplemented => 501,
            ErrorKind::ServiceUnavailable => 503,
            ErrorKind::Base
            | ErrorKind::InternalServerError
            | ErrorKind::ServiceError
            | ErrorKind::ApiError => 500,
        }
    }

    /// Stable name used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Base => "BaseError",
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::TooManyRequests => "TooManyRequests",
            ErrorKind::InternalServerError => "InternalServerError",
            ErrorKind::ServiceError => "ServiceError",
            ErrorKind::ApiError => "APIError",
            ErrorKind::NotImplemented => "NotImplemented",
            ErrorKind::ServiceUnavailable => "ServiceUnavailable",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A taxonomy-issued failure.
///
/// Errors built through the constructors below are operational (trusted) by
/// default: their message and status are safe to hand to the client. Call
/// [`HttpError::untrusted`] to opt out.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HttpError {
    kind: ErrorKind,
    message: String,
    origin: String,
    debug: Option<Map<String, Value>>,
    status: u16,
    operational: bool,
}

impl HttpError {
    /// Create an error of the given kind with its default status.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            origin: String::new(),
            debug: None,
            status: kind.default_status(),
            operational: true,
        }
    }

    pub fn base(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Base, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TooManyRequests, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalServerError, message)
    }

    pub fn service_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceError, message)
    }

    pub fn api_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ApiError, message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Tag the error with the component or function that raised it.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Attach a debug payload. Anything other than a non-empty JSON object is
    /// discarded.
    pub fn with_debug(mut self, payload: Value) -> Self {
        self.debug = match payload {
            Value::Object(map) if !map.is_empty() => Some(map),
            _ => None,
        };
        self
    }

    /// Override the default status code of the kind.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Mark the error as not safe to describe to clients.
    pub fn untrusted(mut self) -> Self {
        self.operational = false;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Tag of the component that raised the error (empty when unset).
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn debug_payload(&self) -> Option<&Map<String, Value>> {
        self.debug.as_ref()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }
}

/// Misuse of the response builder.
///
/// These are programmer errors: they are never operational and reach clients
/// only as the masked 500 response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid property or value")]
    InvalidHeader,

    #[error("Invalid statusCode: {0}")]
    InvalidStatus(u16),

    #[error("Invalid cookie name or value")]
    InvalidCookie,

    #[error("Invalid cookie duration: {0}")]
    InvalidDuration(String),

    #[error("No free Set-Cookie header slot left")]
    CookieSlotsExhausted,

    #[error("Invalid JSON format")]
    InvalidJson,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_status_per_kind() {
        assert_eq!(HttpError::bad_request("x").status(), 400);
        assert_eq!(HttpError::unauthorized("x").status(), 401);
        assert_eq!(HttpError::forbidden("x").status(), 403);
        assert_eq!(HttpError::not_found("x").status(), 404);
        assert_eq!(HttpError::too_many_requests("x").status(), 429);
        assert_eq!(HttpError::internal("x").status(), 500);
        assert_eq!(HttpError::service_error("x").status(), 500);
        assert_eq!(HttpError::api_error("x").status(), 500);
        assert_eq!(HttpError::not_implemented("x").status(), 501);
        assert_eq!(HttpError::service_unavailable("x").status(), 503);
        assert_eq!(HttpError::base("x").status(), 500);
    }

    #[test]
    fn test_operational_by_default() {
        let err = HttpError::forbidden("nope");
        assert!(err.is_operational());
        assert!(!err.clone().untrusted().is_operational());
        assert_eq!(err.origin(), "");
    }

    #[test]
    fn test_debug_payload_kept_only_when_non_empty_object() {
        let kept = HttpError::internal("x").with_debug(json!({ "table": "users" }));
        assert_eq!(kept.debug_payload().unwrap()["table"], "users");

        let empty = HttpError::internal("x").with_debug(json!({}));
        assert!(empty.debug_payload().is_none());

        let scalar = HttpError::internal("x").with_debug(json!("detail"));
        assert!(scalar.debug_payload().is_none());
    }

    #[test]
    fn test_display_is_message() {
        let err = HttpError::not_found("Requested path is not available").with_origin("Router");
        assert_eq!(err.to_string(), "Requested path is not available");
        assert_eq!(err.kind().to_string(), "NotFound");
    }
}
