//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject allow-lists that can never grant an origin
//! - Reject an allow-origin given both as a list and as a static header
//! - Reject header entries the response builder would refuse
//! - Validate the local gateway settings
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationIssue>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::security::cors::AllowOrigin;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("headers.allow_origin list is empty")]
    EmptyAllowList,

    #[error("headers.allow_origin contains an empty origin")]
    EmptyOrigin,

    #[error("headers.extra contains an empty header name")]
    EmptyHeaderName,

    #[error("headers.extra.{0} has an empty, zero or false value")]
    FalsyHeaderValue(String),

    #[error("server.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("server.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("metrics.address {0:?} is not a socket address")]
    MetricsAddress(String),

    #[error("headers.extra.{0} duplicates headers.allow_origin")]
    DuplicateAllowOrigin(String),
}

/// Check a parsed configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    match &config.headers.allow_origin {
        Some(AllowOrigin::List(origins)) => {
            if origins.is_empty() {
                issues.push(ValidationIssue::EmptyAllowList);
            } else if origins.iter().any(String::is_empty) {
                issues.push(ValidationIssue::EmptyOrigin);
            }
        }
        Some(AllowOrigin::One(origin)) if origin.is_empty() => {
            issues.push(ValidationIssue::EmptyOrigin);
        }
        _ => {}
    }

    if config.headers.allow_origin.is_some() {
        for key in config.headers.static_allow_origin_keys() {
            issues.push(ValidationIssue::DuplicateAllowOrigin(key.to_string()));
        }
    }

    for (name, value) in &config.headers.extra {
        if name.is_empty() {
            issues.push(ValidationIssue::EmptyHeaderName);
        } else if value.is_falsy() {
            issues.push(ValidationIssue::FalsyHeaderValue(name.clone()));
        }
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        issues.push(ValidationIssue::BindAddress(config.server.bind_address.clone()));
    }

    if config.server.max_body_bytes == 0 {
        issues.push(ValidationIssue::ZeroBodyLimit);
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        issues.push(ValidationIssue::MetricsAddress(config.metrics.address.clone()));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::HeaderConfig;
    use crate::http::response::HeaderScalar;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&RouterConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_issue() {
        let mut config = RouterConfig::default();
        config.headers = HeaderConfig::new().allow_origin(vec!["http://a.test", ""]);
        config.headers.extra.insert("X-Off".into(), HeaderScalar::Bool(false));
        config.server.bind_address = "localhost".into();
        config.metrics.enabled = true;
        config.metrics.address = "nowhere".into();

        let issues = validate_config(&config).unwrap_err();
        assert_eq!(
            issues,
            vec![
                ValidationIssue::EmptyOrigin,
                ValidationIssue::FalsyHeaderValue("X-Off".into()),
                ValidationIssue::BindAddress("localhost".into()),
                ValidationIssue::MetricsAddress("nowhere".into()),
            ]
        );
    }

    #[test]
    fn test_allow_origin_set_twice() {
        let mut config = RouterConfig::default();
        config.headers = HeaderConfig::new()
            .allow_origin("https://app.test")
            .header("access-control-allow-origin", "https://other.test");

        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationIssue::DuplicateAllowOrigin(
                "access-control-allow-origin".into()
            )])
        );
    }

    #[test]
    fn test_empty_single_origin() {
        let mut config = RouterConfig::default();
        config.headers.allow_origin = Some(AllowOrigin::One(String::new()));
        assert_eq!(validate_config(&config), Err(vec![ValidationIssue::EmptyOrigin]));
    }
}
