//! Configuration type definitions
//!
//! These types represent the runtime configuration for hellomvc.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;

/// Root configuration for hellomvc
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HelloMvcConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Global logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Route table (empty = built-in routes)
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

impl HelloMvcConfig {
    /// Routes the server will actually register
    pub fn effective_routes(&self) -> Vec<RouteConfig> {
        if self.routes.is_empty() {
            RouteConfig::defaults()
        } else {
            self.routes.clone()
        }
    }

    /// Check the configuration for errors that would only show up at runtime
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.logging.validate()?;

        let mut seen = HashSet::new();
        for route in &self.routes {
            route.validate()?;
            if !seen.insert(route.path.as_str()) {
                return Err(Error::Config(format!("Duplicate route path: {}", route.path)));
            }
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Maximum request body size in bytes (default: 1MB)
    #[serde(default = "default_body_limit")]
    pub client_max_body_size: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            client_max_body_size: default_body_limit(),
        }
    }
}

impl ServerConfig {
    /// Parsed listen address
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| Error::Config(format!("Invalid listen address '{}': {}", self.listen, e)))
    }

    fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if self.client_max_body_size == 0 {
            return Err(Error::Config("client_max_body_size must be greater than 0".to_string()));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_body_limit() -> u64 {
    1024 * 1024 // 1MB
}

/// Global logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<()> {
        const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];
        if LEVELS.iter().any(|l| l.eq_ignore_ascii_case(&self.level)) {
            Ok(())
        } else {
            Err(Error::Config(format!("Unknown log level: {}", self.level)))
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

/// Route configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteConfig {
    /// Exact path to match
    pub path: String,

    /// Handler for this route
    pub handler: HandlerConfig,

    /// Allowed methods (None = all)
    #[serde(default)]
    pub methods: Option<Vec<String>>,
}

impl RouteConfig {
    /// Route accepting only POST with a JSON body handler
    pub fn json_body(path: impl Into<String>, binding: Binding, reply: Reply) -> Self {
        Self {
            path: path.into(),
            handler: HandlerConfig::JsonBody { binding, reply },
            methods: Some(vec!["POST".to_string()]),
        }
    }

    /// Built-in route table: five request-body variants plus health
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::json_body("/request-body-json-v1", Binding::Stream, Reply::Ok),
            Self::json_body("/request-body-json-v2", Binding::String, Reply::Ok),
            Self::json_body("/request-body-json-v3", Binding::Record, Reply::Ok),
            Self::json_body("/request-body-json-v4", Binding::Entity, Reply::Ok),
            Self::json_body("/request-body-json-v5", Binding::Record, Reply::Echo),
            Self {
                path: "/health".to_string(),
                handler: HandlerConfig::Health,
                methods: Some(vec!["GET".to_string()]),
            },
        ]
    }

    /// Paths are matched literally, so router pattern syntax is not allowed
    pub fn is_literal_path(&self) -> bool {
        !self.path.contains(['{', '}'])
    }

    fn validate(&self) -> Result<()> {
        if !self.path.starts_with('/') {
            return Err(Error::Config(format!("Route path must start with '/': {}", self.path)));
        }

        if !self.is_literal_path() {
            return Err(Error::Config(format!(
                "Route path must not contain '{{' or '}}': {}",
                self.path
            )));
        }

        if let Some(methods) = &self.methods {
            for method in methods {
                http::Method::from_bytes(method.as_bytes()).map_err(|_| {
                    Error::Config(format!("Invalid method '{}' on route {}", method, self.path))
                })?;
            }
        }

        if let HandlerConfig::JsonBody { binding, reply: Reply::Echo } = &self.handler {
            if !binding.binds_record() {
                return Err(Error::Config(format!(
                    "Route {}: echo reply requires a record or entity binding, got {}",
                    self.path, binding
                )));
            }
        }
        Ok(())
    }
}

/// Handler configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandlerConfig {
    /// Read a JSON body into `HelloData` and answer
    JsonBody {
        binding: Binding,
        #[serde(default)]
        reply: Reply,
    },

    /// Liveness check answering `{"status":"healthy"}`
    Health,
}

/// How a route turns the request body into handler input
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    /// Raw body bytes, read and parsed inside the handler
    Stream,
    /// Body read as text by the host, parsed inside the handler
    String,
    /// Body decoded into a record by the host
    Record,
    /// Body decoded into a record, handed over together with the headers
    Entity,
}

impl Binding {
    /// Whether the host decodes the body before the handler runs
    pub fn binds_record(self) -> bool {
        matches!(self, Binding::Record | Binding::Entity)
    }
}

impl std::fmt::Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Binding::Stream => "stream",
            Binding::String => "string",
            Binding::Record => "record",
            Binding::Entity => "entity",
        };
        f.write_str(name)
    }
}

/// Response shape of a JSON body route
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Reply {
    /// Fixed `ok` acknowledgment
    #[default]
    Ok,
    /// Decoded record re-encoded as JSON
    Echo,
}
