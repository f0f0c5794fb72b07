//! Route table and lookup.
//!
//! # Responsibilities
//! - Store `(method, template, callbacks)` entries in registration order
//! - Reject malformed registrations
//! - Resolve a request to exactly one route, or explain why not
//!
//! # Design Decisions
//! - Generic over the callback type; the pipeline decides what a callback is
//! - Immutable after construction (thread-safe without locks)
//! - Zero matches is a client condition (404), several matches is a
//!   route-table bug (500)

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::errors::HttpError;
use crate::routing::matcher::PathTemplate;

const ORIGIN: &str = "Router";

/// HTTP verbs a route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A method string outside the supported verbs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(UnknownMethod(other.to_owned())),
        }
    }
}

/// A registered route.
#[derive(Debug, Clone)]
pub struct Route<C> {
    pub method: HttpMethod,
    pub template: PathTemplate,
    pub callbacks: Vec<C>,
}

/// The single route selected for a request.
#[derive(Debug)]
pub struct RouteMatch<'a, C> {
    pub route: &'a Route<C>,
    pub params: BTreeMap<String, String>,
}

/// Ordered collection of routes.
#[derive(Debug, Clone)]
pub struct RouteTable<C> {
    routes: Vec<Route<C>>,
}

impl<C> Default for RouteTable<C> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<C> RouteTable<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Empty templates and empty chains are rejected.
    pub fn register(
        &mut self,
        method: HttpMethod,
        template: &str,
        callbacks: Vec<C>,
    ) -> Result<&Route<C>, HttpError> {
        if template.is_empty() {
            return Err(HttpError::internal(format!("Router {}: No resource provided", method))
                .with_origin(ORIGIN));
        }
        if callbacks.is_empty() {
            return Err(HttpError::internal(format!("Router {}: No callbacks provided", method))
                .with_origin(ORIGIN)
                .with_debug(json!({ "resource": template })));
        }

        tracing::debug!(
            method = %method,
            template = %template,
            callbacks = callbacks.len(),
            "Route registered"
        );

        self.routes.push(Route {
            method,
            template: PathTemplate::parse(template),
            callbacks,
        });
        Ok(&self.routes[self.routes.len() - 1])
    }

    pub fn routes(&self) -> &[Route<C>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolve `(method, path)` against the whole table.
    pub fn resolve(&self, method: &str, path: &str) -> Result<RouteMatch<'_, C>, HttpError> {
        let candidates: Vec<&Route<C>> = self
            .routes
            .iter()
            .filter(|route| route.method.as_str() == method && route.template.matches(path))
            .collect();

        match candidates.as_slice() {
            [] => Err(HttpError::not_found("Requested path is not available")
                .with_origin(ORIGIN)
                .with_debug(json!({ "httpMethod": method, "path": path }))),
            [route] => {
                let route = *route;
                if route.callbacks.is_empty() {
                    return Err(HttpError::internal("No callbacks found").with_origin(ORIGIN));
                }
                Ok(RouteMatch {
                    route,
                    params: route.template.extract(path),
                })
            }
            overlapping => {
                let templates: Vec<&str> = overlapping.iter().map(|r| r.template.as_str()).collect();
                Err(HttpError::internal("Multiple requests found. Please check the Router setup")
                    .with_origin(ORIGIN)
                    .with_debug(json!({ "httpMethod": method, "path": path, "templates": templates })))
            }
        }
    }
}
