//! CORS origin negotiation.
//!
//! # Responsibilities
//! - Decide the outbound `Access-Control-Allow-Origin` value per request
//! - Echo the request origin when the allow-list grants it
//! - Drop the header when a list-based allow-list does not
//!
//! # Design Decisions
//! - Resolution is a pure function of configuration and request; the caller
//!   applies it to its own copy of the headers
//! - A single configured origin is a prefix, a list is exact membership

use serde::{Deserialize, Serialize};

use crate::errors::HttpError;
use crate::http::request::Event;

/// Response header carrying the CORS grant.
pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";

/// Configured allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AllowOrigin {
    One(String),
    List(Vec<String>),
}

impl From<&str> for AllowOrigin {
    fn from(origin: &str) -> Self {
        AllowOrigin::One(origin.to_owned())
    }
}

impl From<Vec<&str>> for AllowOrigin {
    fn from(origins: Vec<&str>) -> Self {
        AllowOrigin::List(origins.into_iter().map(str::to_owned).collect())
    }
}

/// Resolve the header value for `event` with CORS mode enabled.
///
/// `Ok(None)` means the header must not be sent.
pub fn resolve(configured: Option<&AllowOrigin>, event: &Event) -> Result<Option<String>, HttpError> {
    let origin = match (event.has_headers(), event.origin()) {
        (true, Some(origin)) => origin,
        _ => {
            return Err(HttpError::internal("CORS is enabled but the request carries no Origin header")
                .with_origin("Cors"));
        }
    };

    let resolved = match configured {
        None => Some("*".to_string()),
        Some(AllowOrigin::List(candidates)) => candidates
            .iter()
            .any(|candidate| candidate == origin)
            .then(|| origin.to_string()),
        Some(AllowOrigin::One(allowed)) => {
            if origin.starts_with(allowed.as_str()) {
                Some(origin.to_string())
            } else {
                Some(allowed.clone())
            }
        }
    };

    tracing::debug!(origin = %origin, allow_origin = ?resolved, "CORS origin resolved");
    Ok(resolved)
}

/// Header value with CORS mode disabled: a single origin is sent verbatim,
/// a list cannot be expressed and is omitted.
pub fn passthrough(configured: Option<&AllowOrigin>) -> Option<String> {
    match configured {
        Some(AllowOrigin::One(origin)) => Some(origin.clone()),
        Some(AllowOrigin::List(_)) => {
            tracing::warn!("Allow-origin list configured without CORS mode; header omitted");
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from(origin: &str) -> Event {
        Event::new("GET", "/users").with_header("origin", origin)
    }

    fn list() -> AllowOrigin {
        AllowOrigin::from(vec![
            "http://localhost:3001",
            "http://localhost:3002",
            "http://localhost:4002",
        ])
    }

    #[test]
    fn test_unconfigured_is_wildcard() {
        let resolved = resolve(None, &from("http://localhost:4173")).unwrap();
        assert_eq!(resolved.as_deref(), Some("*"));
    }

    #[test]
    fn test_list_member_is_echoed() {
        let resolved = resolve(Some(&list()), &from("http://localhost:4002")).unwrap();
        assert_eq!(resolved.as_deref(), Some("http://localhost:4002"));
    }

    #[test]
    fn test_list_non_member_drops_header() {
        assert_eq!(resolve(Some(&list()), &from("http://localhost:8800")).unwrap(), None);
    }

    #[test]
    fn test_single_origin_prefix() {
        let configured = AllowOrigin::from("http://localhost:3001");

        let same = resolve(Some(&configured), &from("http://localhost:3001")).unwrap();
        assert_eq!(same.as_deref(), Some("http://localhost:3001"));

        let other = resolve(Some(&configured), &from("http://localhost:4173")).unwrap();
        assert_eq!(other.as_deref(), Some("http://localhost:3001"));

        let prefixed = AllowOrigin::from("https://app.");
        let echoed = resolve(Some(&prefixed), &from("https://app.example.com")).unwrap();
        assert_eq!(echoed.as_deref(), Some("https://app.example.com"));
    }

    #[test]
    fn test_missing_origin_fails() {
        let no_headers = Event::new("GET", "/users");
        let err = resolve(None, &no_headers).unwrap_err();
        assert_eq!(err.status(), 500);

        let no_origin = Event::new("GET", "/users").with_header("Host", "api.test");
        assert!(resolve(Some(&list()), &no_origin).is_err());
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(passthrough(Some(&AllowOrigin::from("*"))).as_deref(), Some("*"));
        assert_eq!(passthrough(Some(&list())), None);
        assert_eq!(passthrough(None), None);
    }

    #[test]
    fn test_deserialize_string_or_list() {
        let one: AllowOrigin = serde_json::from_str(r#""http://a.test""#).unwrap();
        assert_eq!(one, AllowOrigin::One("http://a.test".into()));
        let many: AllowOrigin = serde_json::from_str(r#"["http://a.test","http://b.test"]"#).unwrap();
        assert_eq!(many, AllowOrigin::from(vec!["http://a.test", "http://b.test"]));
    }
}
