//! Route registration and per-request dispatch.
//!
//! # Responsibilities
//! - Hold the route table, middleware and options for the process
//! - Build one Dispatcher per invocation with its own headers, response and
//!   storage
//! - Run before → chain → after strictly in order, aborting on first failure
//! - Translate any failure into a response exactly once
//!
//! # Design Decisions
//! - `Router` is written during startup and only read afterwards; share it
//!   via `Arc` across concurrent invocations
//! - The terminal callback must hand back the very Response it received,
//!   which catches handlers that build a response but forget to return it
//! - `error()` never fails; masking of untrusted errors happens there only

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::Instrument;

use crate::config::schema::{HeaderConfig, RouterConfig, RouterOptions};
use crate::errors::{ErrorReport, HttpError};
use crate::http::request::{Event, Request};
use crate::http::response::{ApiResponse, HeaderScalar, Response};
use crate::observability::metrics;
use crate::pipeline::handler::{Handler, Middleware, Storage};
use crate::routing::{HttpMethod, RouteTable};
use crate::security::cors::{self, ALLOW_ORIGIN};

const ORIGIN: &str = "Router";

/// Progress of one invocation through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    CorsApplied,
    Matched,
    BeforeRan,
    ChainRunning,
    AfterRan,
    Sent,
    Failed,
}

/// Process-wide routing configuration.
#[derive(Debug, Default)]
pub struct Router {
    options: RouterOptions,
    headers: HeaderConfig,
    routes: RouteTable<Handler>,
    before: Option<Middleware>,
    after: Option<Middleware>,
}

impl Router {
    pub fn new(options: RouterOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Router with options and default headers taken from configuration.
    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(config.router).with_headers(config.headers.clone())
    }

    /// Replace the default response headers. A static
    /// `Access-Control-Allow-Origin` entry is folded into the allow-list.
    pub fn with_headers(mut self, headers: HeaderConfig) -> Self {
        self.headers = headers.normalized();
        self
    }

    pub fn router_options(&self) -> &RouterOptions {
        &self.options
    }

    pub fn routes(&self) -> &RouteTable<Handler> {
        &self.routes
    }

    /// Register a chain for `method` and `template`.
    pub fn route(
        &mut self,
        method: HttpMethod,
        template: &str,
        chain: impl IntoIterator<Item = Handler>,
    ) -> Result<&mut Self, HttpError> {
        self.routes.register(method, template, chain.into_iter().collect())?;
        Ok(self)
    }

    pub fn get(&mut self, template: &str, chain: impl IntoIterator<Item = Handler>) -> Result<&mut Self, HttpError> {
        self.route(HttpMethod::Get, template, chain)
    }

    pub fn post(&mut self, template: &str, chain: impl IntoIterator<Item = Handler>) -> Result<&mut Self, HttpError> {
        self.route(HttpMethod::Post, template, chain)
    }

    pub fn put(&mut self, template: &str, chain: impl IntoIterator<Item = Handler>) -> Result<&mut Self, HttpError> {
        self.route(HttpMethod::Put, template, chain)
    }

    pub fn patch(&mut self, template: &str, chain: impl IntoIterator<Item = Handler>) -> Result<&mut Self, HttpError> {
        self.route(HttpMethod::Patch, template, chain)
    }

    pub fn delete(&mut self, template: &str, chain: impl IntoIterator<Item = Handler>) -> Result<&mut Self, HttpError> {
        self.route(HttpMethod::Delete, template, chain)
    }

    pub fn options(&mut self, template: &str, chain: impl IntoIterator<Item = Handler>) -> Result<&mut Self, HttpError> {
        self.route(HttpMethod::Options, template, chain)
    }

    /// Set the middleware run before the chain. Last registration wins.
    pub fn before(&mut self, middleware: Middleware) -> &mut Self {
        if let Some(previous) = self.before.replace(middleware) {
            tracing::warn!(previous = %previous.name(), "Before middleware replaced");
        }
        self
    }

    /// Set the middleware run after the chain. Last registration wins.
    pub fn after(&mut self, middleware: Middleware) -> &mut Self {
        if let Some(previous) = self.after.replace(middleware) {
            tracing::warn!(previous = %previous.name(), "After middleware replaced");
        }
        self
    }

    /// Start an invocation. Fails when CORS mode cannot negotiate an origin.
    pub fn dispatcher(&self, event: Event) -> Result<Dispatcher<'_>, HttpError> {
        Dispatcher::new(self, event)
    }

    /// Run one invocation end to end and always produce a response.
    pub async fn respond(&self, event: Event) -> ApiResponse {
        match self.dispatcher(event) {
            Ok(mut dispatcher) => match dispatcher.handle().await {
                Ok(response) => response,
                Err(err) => dispatcher.error(&err),
            },
            Err(err) => self.reject(err),
        }
    }

    /// Render a failure that happened before a dispatcher existed.
    fn reject(&self, err: HttpError) -> ApiResponse {
        let response = Response::new(self.headers.extra.clone());
        let err = anyhow::Error::new(err);
        let report = ErrorReport::from_error(&err, self.options.debug);

        tracing::error!(error = %err, status = report.status, "Request rejected before dispatch");
        metrics::record_error(report.kind, report.trusted);

        response.overwrite(report.status, report.body);
        response.send()
    }

    /// Per-request copy of the default headers, Allow-Origin resolved.
    fn request_headers(&self, event: &Event) -> Result<BTreeMap<String, HeaderScalar>, HttpError> {
        let mut headers = self.headers.extra.clone();

        let allow_origin = if self.options.cors {
            cors::resolve(self.headers.allow_origin.as_ref(), event)?
        } else {
            cors::passthrough(self.headers.allow_origin.as_ref())
        };

        match allow_origin {
            Some(value) => {
                headers.insert(ALLOW_ORIGIN.to_string(), HeaderScalar::Str(value));
            }
            None => {
                headers.remove(ALLOW_ORIGIN);
            }
        }

        Ok(headers)
    }
}

/// One invocation of the pipeline.
#[derive(Debug)]
pub struct Dispatcher<'r> {
    router: &'r Router,
    request: Request,
    response: Response,
    storage: Storage,
    state: DispatchState,
    route: Option<String>,
    started: Instant,
}

impl<'r> Dispatcher<'r> {
    fn new(router: &'r Router, event: Event) -> Result<Self, HttpError> {
        let headers = router.request_headers(&event)?;
        let state = if router.options.cors {
            DispatchState::CorsApplied
        } else {
            DispatchState::Idle
        };

        Ok(Self {
            router,
            request: Request::new(event),
            response: Response::new(headers),
            storage: Storage::new(),
            state,
            route: None,
            started: Instant::now(),
        })
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Resolve the route and run the pipeline.
    pub async fn handle(&mut self) -> anyhow::Result<ApiResponse> {
        let span = tracing::info_span!(
            "dispatch",
            request_id = %self.request.request_id(),
            method = %self.request.method(),
            path = %self.request.path(),
        );

        let result = self.run().instrument(span).await;
        match &result {
            Ok(response) => {
                metrics::record_request(
                    self.request.method(),
                    response.status_code,
                    self.route.as_deref().unwrap_or(metrics::UNMATCHED),
                    self.started,
                );
            }
            Err(_) => self.state = DispatchState::Failed,
        }
        result
    }

    async fn run(&mut self) -> anyhow::Result<ApiResponse> {
        let router = self.router;
        tracing::debug!("Dispatch started");

        let matched = router
            .routes
            .resolve(self.request.method(), self.request.path())?;
        let route = matched.route;
        self.route = Some(route.template.as_str().to_owned());
        self.request.attach_path_parameters(matched.params);
        self.state = DispatchState::Matched;

        if let Some(before) = &router.before {
            before
                .call(self.request.clone(), self.response.clone(), self.storage.clone())
                .await?;
            self.state = DispatchState::BeforeRan;
        }

        self.state = DispatchState::ChainRunning;
        let (last, leading) = route
            .callbacks
            .split_last()
            .ok_or_else(|| HttpError::internal("No callbacks found").with_origin(ORIGIN))?;

        for callback in leading {
            callback
                .call(self.request.clone(), self.response.clone(), self.storage.clone())
                .await?;
        }

        let returned = last
            .call(self.request.clone(), self.response.clone(), self.storage.clone())
            .await?;
        if !returned.is_some_and(|response| response.same_as(&self.response)) {
            return Err(HttpError::internal(format!(
                "Function {} don't return a valid response",
                last.name()
            ))
            .with_origin(ORIGIN)
            .into());
        }

        if let Some(after) = &router.after {
            after
                .call(self.request.clone(), self.response.clone(), self.storage.clone())
                .await?;
            self.state = DispatchState::AfterRan;
        }

        let response = self.response.send();
        self.state = DispatchState::Sent;
        tracing::info!(status = response.status_code, route = %route.template, "Dispatch completed");
        Ok(response)
    }

    /// Translate a failure into the response to send. Never fails.
    ///
    /// Trusted errors keep their message and status; everything else becomes
    /// a generic 500. Internals are attached only in debug mode.
    pub fn error(&self, err: &anyhow::Error) -> ApiResponse {
        let report = ErrorReport::from_error(err, self.router.options.debug);

        if report.trusted {
            tracing::warn!(
                request_id = %self.request.request_id(),
                kind = report.kind,
                status = report.status,
                error = %err,
                "Request failed"
            );
        } else {
            tracing::error!(
                request_id = %self.request.request_id(),
                kind = report.kind,
                error = ?err,
                "Unexpected failure"
            );
        }
        metrics::record_error(report.kind, report.trusted);

        self.response.overwrite(report.status, report.body);
        let response = self.response.send();
        metrics::record_request(
            self.request.method(),
            response.status_code,
            self.route.as_deref().unwrap_or(metrics::UNMATCHED),
            self.started,
        );
        response
    }
}
