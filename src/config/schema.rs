//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::http::response::HeaderScalar;
use crate::security::cors::{AllowOrigin, ALLOW_ORIGIN};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Dispatch behaviour.
    pub router: RouterOptions,

    /// Default response headers and CORS allow-list.
    pub headers: HeaderConfig,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// Metrics exporter settings (binary only).
    pub metrics: MetricsConfig,

    /// Local gateway settings.
    pub server: ServerConfig,
}

/// Constructor-time router switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterOptions {
    /// Expose error sources, debug payloads and stacks in error bodies.
    pub debug: bool,

    /// Negotiate `Access-Control-Allow-Origin` per request.
    pub cors: bool,
}

impl RouterOptions {
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn cors(mut self, cors: bool) -> Self {
        self.cors = cors;
        self
    }
}

/// Headers every response starts from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// CORS allow-list: absent (wildcard under CORS), one origin prefix, or
    /// a list of exact origins.
    pub allow_origin: Option<AllowOrigin>,

    /// Static headers, e.g. `Cache-Control`.
    pub extra: BTreeMap<String, HeaderScalar>,
}

impl HeaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_origin(mut self, allow_origin: impl Into<AllowOrigin>) -> Self {
        self.allow_origin = Some(allow_origin.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderScalar>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Move any `Access-Control-Allow-Origin` entry out of `extra`.
    ///
    /// A static entry becomes the single configured origin when
    /// `allow_origin` is unset; `allow_origin` wins otherwise. Afterwards
    /// `extra` never carries the header, so CORS resolution alone decides it.
    pub fn normalized(mut self) -> Self {
        let keys: Vec<String> = self.static_allow_origin_keys().map(str::to_owned).collect();

        for key in keys {
            let Some(value) = self.extra.remove(&key) else {
                continue;
            };
            if self.allow_origin.is_none() {
                self.allow_origin = Some(AllowOrigin::One(value.to_string()));
            } else {
                tracing::warn!(header = %key, "Static allow-origin header ignored; headers.allow_origin is set");
            }
        }

        self
    }

    /// Keys of `extra` that name the allow-origin header, whatever their case.
    pub fn static_allow_origin_keys(&self) -> impl Iterator<Item = &str> {
        self.extra
            .keys()
            .map(String::as_str)
            .filter(|key| key.eq_ignore_ascii_case(ALLOW_ORIGIN))
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line, for log aggregation.
    #[default]
    Json,
    /// Human-readable output for local development.
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (trace, debug, info, warn, error, or full EnvFilter syntax).
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,

    /// Scrape endpoint bind address.
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Local gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,

    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            max_body_bytes: 6 * 1024 * 1024, // FaaS payload ceiling
        }
    }
}
