//! Route specification types and registration validation.
//!
//! A [`RouteSpec`] is the raw registration payload handed to
//! [`RouteRegistry::register`](crate::registry::RouteRegistry::register).
//! Validation normalizes it into the settings the registry stores: the method
//! token is checked and defaulted to `GET`, the vhost set is expanded and
//! deduplicated, and the handler shape is resolved from either the bare
//! `handler` field or the nested `config.handler` alias.
//!
//! Handlers are a closed tagged union ([`RouteHandler`]): a callable that
//! produces the response itself, a literal [`StaticResponse`], a prebuilt
//! error response answered verbatim, or the withdrawn sentinel.

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use http::Method;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Callable handler: invoked with the request merged with match data and
/// fully responsible for emitting the response through the request's reply
/// channel, possibly from another coroutine.
pub type RouteCallable = Arc<dyn Fn(HandlerRequest) + Send + Sync>;

/// Continuation channel a filter answers through.
pub type FilterSender = may::sync::mpsc::Sender<bool>;

/// Admission filter: receives the request and a continuation sender and
/// asynchronously yields whether the route should respond. Sending `false`
/// (or dropping the sender) makes the dispatcher fall through as if the
/// route had never matched.
pub type RouteFilter = Arc<dyn Fn(&HandlerRequest, FilterSender) + Send + Sync>;

/// The handler shape of a route record. Exactly one case is active per record.
#[derive(Clone)]
pub enum RouteHandler {
    /// Invoke a callable that emits the response itself.
    Callable(RouteCallable),
    /// Answer directly with a literal payload, status, and headers.
    Static(StaticResponse),
    /// Answer verbatim with a pre-constructed failure response.
    Error(HandlerResponse),
    /// Sentinel: the record occupies its identity slot but currently has no
    /// active handler. Dispatch falls through.
    Withdrawn,
}

impl RouteHandler {
    /// Build a callable handler from a closure.
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(HandlerRequest) + Send + Sync + 'static,
    {
        RouteHandler::Callable(Arc::new(f))
    }

    #[must_use]
    pub fn is_withdrawn(&self) -> bool {
        matches!(self, RouteHandler::Withdrawn)
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteHandler::Callable(_) => f.write_str("Callable(..)"),
            RouteHandler::Static(s) => f.debug_tuple("Static").field(s).finish(),
            RouteHandler::Error(e) => f.debug_tuple("Error").field(e).finish(),
            RouteHandler::Withdrawn => f.write_str("Withdrawn"),
        }
    }
}

/// A literal response the registry answers with directly.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticResponse {
    /// HTTP status code; must be >= 200. Defaults to 200.
    pub status: u16,
    /// Headers applied to the response.
    pub headers: Vec<(String, String)>,
    /// Response payload, emitted as the body.
    pub payload: Value,
}

impl StaticResponse {
    /// Create a static response with status 200 and no headers.
    #[must_use]
    pub fn new(payload: Value) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            payload,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Nested route configuration, an alias surface for the handler plus opaque
/// tags. Supplying a handler both here and at the top level of the spec is a
/// configuration error.
#[derive(Clone, Default)]
pub struct RouteConfig {
    pub handler: Option<RouteHandler>,
    pub tags: Option<Value>,
}

impl RouteConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn handler(mut self, handler: RouteHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: Value) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// Raw route registration payload.
///
/// Built with the fluent methods below and validated by the registry at
/// registration time. A spec without a handler registers (or withdraws to)
/// an inactive record.
#[derive(Clone, Default)]
pub struct RouteSpec {
    /// Method token; defaults to `get` when absent.
    pub method: Option<String>,
    /// Route path, required; may contain `{param}` segments.
    pub path: String,
    /// Bare handler.
    pub handler: Option<RouteHandler>,
    /// Nested configuration carrying the `config.handler` alias.
    pub config: Option<RouteConfig>,
    /// Virtual-host names; defaults to `["*"]` (match any host).
    pub vhost: Option<Vec<String>>,
    /// Optional admission filter.
    pub filter: Option<RouteFilter>,
    /// Opaque metadata, passed through untouched.
    pub tags: Option<Value>,
    /// Opaque validation config, passed through untouched.
    pub validate: Option<Value>,
}

impl RouteSpec {
    /// Start a spec for the given path. Method defaults to `get`.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn method(mut self, method: &str) -> Self {
        self.method = Some(method.to_string());
        self
    }

    #[must_use]
    pub fn handler(mut self, handler: RouteHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Shorthand for a bare callable handler.
    #[must_use]
    pub fn callable<F>(self, f: F) -> Self
    where
        F: Fn(HandlerRequest) + Send + Sync + 'static,
    {
        self.handler(RouteHandler::callable(f))
    }

    /// Shorthand for a bare static-response handler.
    #[must_use]
    pub fn static_response(self, response: StaticResponse) -> Self {
        self.handler(RouteHandler::Static(response))
    }

    #[must_use]
    pub fn config(mut self, config: RouteConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn vhost(mut self, hosts: &[&str]) -> Self {
        self.vhost = Some(hosts.iter().map(|h| h.to_string()).collect());
        self
    }

    #[must_use]
    pub fn filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&HandlerRequest, FilterSender) + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: Value) -> Self {
        self.tags = Some(tags);
        self
    }

    #[must_use]
    pub fn validate(mut self, validate: Value) -> Self {
        self.validate = Some(validate);
        self
    }

    /// Validate and normalize this spec into registry settings.
    ///
    /// Applies defaults (method `GET`, vhost `["*"]`), enforces the method
    /// token pattern and vhost shape, resolves the handler from the bare
    /// field or the `config.handler` alias, and rejects ambiguous specs that
    /// supply both.
    pub(crate) fn into_settings(self) -> Result<RouteSettings, ConfigError> {
        if self.path.is_empty() {
            return Err(ConfigError::EmptyPath);
        }

        let method = parse_method(self.method.as_deref())?;

        let vhost = match self.vhost {
            None => vec!["*".to_string()],
            Some(hosts) => {
                if hosts.is_empty() {
                    return Err(ConfigError::EmptyVhost);
                }
                let mut out: Vec<String> = Vec::with_capacity(hosts.len());
                for host in hosts {
                    if !is_valid_vhost(&host) {
                        return Err(ConfigError::InvalidVhost { vhost: host });
                    }
                    let lower = host.to_ascii_lowercase();
                    if !out.contains(&lower) {
                        out.push(lower);
                    }
                }
                out
            }
        };

        let config = self.config.unwrap_or_default();
        let handler = match (self.handler, config.handler) {
            (Some(_), Some(_)) => return Err(ConfigError::AmbiguousHandler),
            (Some(h), None) | (None, Some(h)) => h,
            (None, None) => RouteHandler::Withdrawn,
        };

        if let RouteHandler::Static(ref s) = handler {
            if s.status < 200 {
                return Err(ConfigError::InvalidStatus { status: s.status });
            }
        }

        Ok(RouteSettings {
            method,
            path: self.path,
            vhost,
            handler,
            filter: self.filter,
            tags: self.tags.or(config.tags),
            validate: self.validate,
        })
    }
}

/// A validated, normalized registration: what the registry actually stores.
pub(crate) struct RouteSettings {
    pub method: Method,
    pub path: String,
    pub vhost: Vec<String>,
    pub handler: RouteHandler,
    pub filter: Option<RouteFilter>,
    pub tags: Option<Value>,
    pub validate: Option<Value>,
}

impl std::fmt::Debug for RouteSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSettings")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("vhost", &self.vhost)
            .field("filter", &self.filter.as_ref().map(|_| "<filter>"))
            .field("tags", &self.tags)
            .field("validate", &self.validate)
            .finish_non_exhaustive()
    }
}

/// Parse a method token, defaulting to `GET`.
///
/// The token is uppercased before parsing so identity comparison is
/// case-insensitive; `http::Method` enforces the RFC 7230 token character
/// set the registration schema requires.
pub(crate) fn parse_method(method: Option<&str>) -> Result<Method, ConfigError> {
    let token = match method {
        None => return Ok(Method::GET),
        Some(t) => t,
    };
    let upper = token.to_ascii_uppercase();
    Method::from_bytes(upper.as_bytes()).map_err(|_| ConfigError::InvalidMethod {
        method: token.to_string(),
    })
}

fn is_valid_vhost(host: &str) -> bool {
    if host == "*" {
        return true;
    }
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

/// Route registration validation error
///
/// Identifies the offending field of a malformed [`RouteSpec`]. Raised
/// synchronously at registration time; the failing entry creates no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The `path` field is required and must be non-empty.
    EmptyPath,
    /// The method is not a valid HTTP token.
    InvalidMethod {
        /// The rejected method string
        method: String,
    },
    /// An explicit vhost list must contain at least one name.
    EmptyVhost,
    /// A vhost entry is not a hostname or the `*` wildcard.
    InvalidVhost {
        /// The rejected vhost string
        vhost: String,
    },
    /// Both a bare `handler` and a nested `config.handler` were supplied.
    AmbiguousHandler,
    /// A static response declared a status code below 200.
    InvalidStatus {
        /// The rejected status code
        status: u16,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyPath => {
                write!(f, "route configuration error: 'path' is required and must be non-empty")
            }
            ConfigError::InvalidMethod { method } => {
                write!(
                    f,
                    "route configuration error: '{}' is not a valid method token",
                    method
                )
            }
            ConfigError::EmptyVhost => {
                write!(
                    f,
                    "route configuration error: 'vhost' must contain at least one host name"
                )
            }
            ConfigError::InvalidVhost { vhost } => {
                write!(
                    f,
                    "route configuration error: '{}' is not a valid virtual host name",
                    vhost
                )
            }
            ConfigError::AmbiguousHandler => {
                write!(
                    f,
                    "route configuration error: 'handler' and 'config.handler' are mutually \
                     exclusive; supply exactly one"
                )
            }
            ConfigError::InvalidStatus { status } => {
                write!(
                    f,
                    "route configuration error: static response status {} is below 200",
                    status
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
