use crate::config::RouteHandler;
use crate::router::{ParamVec, Router};
use crate::server::ParsedRequest;
use http::Method;
use may::sync::mpsc;
use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Maximum inline headers before heap allocation.
/// Most requests carry well under 16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the dispatch hot path.
///
/// Header names are `Arc<str>` because they repeat across requests and
/// clone in O(1); values are per-request data and stay `String`.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Channel a handler sends its response through.
pub type ReplySender = mpsc::Sender<HandlerResponse>;

/// The request view a callable handler receives: the inbound request merged
/// with the match's extracted path parameters, plus the reply channel the
/// handler answers through.
#[derive(Clone)]
pub struct HandlerRequest {
    /// HTTP method of the inbound request.
    pub method: Method,
    /// Request path, query string stripped.
    pub path: String,
    /// Request host name, port stripped.
    pub host: String,
    /// Path parameters extracted by the matching engine.
    pub path_params: ParamVec,
    /// Query string parameters.
    pub query_params: ParamVec,
    /// HTTP headers (lowercase names).
    pub headers: HeaderVec,
    /// Request body parsed as JSON, if present.
    pub body: Option<Value>,
    /// Channel for sending the response back to the dispatcher.
    pub reply_tx: ReplySender,
}

impl HandlerRequest {
    /// Get a path parameter by name. Last occurrence wins when a name
    /// repeats at different path depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name, last occurrence wins.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name, case-insensitive per RFC 7230.
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Send the response. A handler must reply exactly once; the send fails
    /// silently if the dispatcher has already gone away.
    pub fn reply(&self, response: HandlerResponse) {
        let _ = self.reply_tx.send(response);
    }
}

impl fmt::Debug for HandlerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("host", &self.host)
            .field("path_params", &self.path_params)
            .field("query_params", &self.query_params)
            .field("body", &self.body)
            .finish()
    }
}

/// Response data produced by dispatch: status code, headers, and JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 503, ...)
    pub status: u16,
    /// Response headers
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body
    pub body: Value,
}

impl HandlerResponse {
    /// Create a response with the given status, headers, and body.
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with a `content-type` header.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create an error response with an `{ "error": message }` body.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// Get a header by name, case-insensitive.
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// The per-request dispatch hook of one listener.
///
/// Invoked at the earliest extension point of the request lifecycle, before
/// the host's own routing result is finalized, so registered routes can
/// pre-empt native ones and withdrawn routes can fall back to them.
pub struct Dispatcher {
    router: Arc<Router>,
}

impl Dispatcher {
    /// Create a dispatcher bound to its listener's matching engine.
    #[must_use]
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    /// Dispatch one inbound request.
    ///
    /// Returns `Some(response)` when a registered route answered, `None`
    /// when this layer has nothing to say about the request — no structural
    /// match, a withdrawn handler, or a filter that declined. On `None` the
    /// caller must proceed exactly as if the overlay were not installed.
    #[must_use]
    pub fn dispatch(&self, req: &ParsedRequest) -> Option<HandlerResponse> {
        let m = match self.router.resolve(&req.method, &req.path, &req.host) {
            Some(m) => m,
            None => {
                debug!(method = %req.method, path = %req.path, "No overlay match, falling through");
                return None;
            }
        };

        // One snapshot per dispatch: handler and filter are always observed
        // as a consistent pair, even while a register call swaps them.
        let state = m.record.state();

        if state.handler.is_withdrawn() {
            debug!(
                method = %req.method,
                path = %req.path,
                compare_path = %m.record.compare_path(),
                "Matched route is withdrawn, falling through"
            );
            return None;
        }

        let (reply_tx, reply_rx) = mpsc::channel();
        let request = HandlerRequest {
            method: req.method.clone(),
            path: req.path.clone(),
            host: req.host.clone(),
            path_params: m.path_params,
            query_params: req
                .query_params
                .iter()
                .map(|(k, v)| (Arc::from(k.as_str()), v.clone()))
                .collect(),
            headers: req
                .headers
                .iter()
                .map(|(k, v)| (Arc::from(k.as_str()), v.clone()))
                .collect(),
            body: req.body.clone(),
            reply_tx,
        };

        if let Some(filter) = &state.filter {
            let (decision_tx, decision_rx) = mpsc::channel();
            filter(&request, decision_tx);
            // Cooperative suspension point: the filter may answer from
            // another coroutine after an arbitrary but finite delay. No
            // locks are held while waiting and no timeout is imposed here.
            match decision_rx.recv() {
                Ok(true) => {
                    debug!(method = %req.method, path = %req.path, "Filter admitted request");
                }
                Ok(false) => {
                    debug!(method = %req.method, path = %req.path, "Filter declined request, falling through");
                    return None;
                }
                Err(_) => {
                    warn!(
                        method = %req.method,
                        path = %req.path,
                        "Filter dropped its continuation without answering, falling through"
                    );
                    return None;
                }
            }
        }

        Some(self.respond(&state.handler, request, reply_rx))
    }

    /// Produce the response for an active handler. One exhaustive branch per
    /// handler shape; the withdrawn case was resolved before the filter ran.
    fn respond(
        &self,
        handler: &RouteHandler,
        request: HandlerRequest,
        reply_rx: mpsc::Receiver<HandlerResponse>,
    ) -> HandlerResponse {
        match handler {
            RouteHandler::Callable(f) => {
                let method = request.method.clone();
                let path = request.path.clone();
                f(request);
                match reply_rx.recv() {
                    Ok(response) => {
                        info!(
                            method = %method,
                            path = %path,
                            status = response.status,
                            "Handler response received"
                        );
                        response
                    }
                    Err(_) => {
                        error!(
                            method = %method,
                            path = %path,
                            "Handler dropped its reply channel without responding"
                        );
                        HandlerResponse::error(503, "Handler is not responding")
                    }
                }
            }
            RouteHandler::Static(s) => {
                let mut response =
                    HandlerResponse::new(s.status, HeaderVec::new(), s.payload.clone());
                for (name, value) in &s.headers {
                    response.set_header(name, value.clone());
                }
                response
            }
            RouteHandler::Error(e) => e.clone(),
            RouteHandler::Withdrawn => HandlerResponse::error(503, "Handler is not responding"),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .finish()
    }
}
