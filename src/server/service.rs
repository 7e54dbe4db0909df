use super::request::ParsedRequest;
use super::response::not_found;
use crate::dispatcher::{Dispatcher, HandlerResponse};
use http::Method;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// One listener's request entry point: the overlay dispatcher in front of
/// the host's own route table.
///
/// The native table stands in for whatever routing the host server applies
/// when the overlay declines. Requests flow overlay first; on fallthrough
/// the native route (or the default not-found response) answers, exactly as
/// it would with no overlay installed.
pub struct OverlayService {
    dispatcher: Dispatcher,
    native: HashMap<(Method, String), HandlerResponse>,
}

impl OverlayService {
    /// Create a service with an empty native route table.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            native: HashMap::new(),
        }
    }

    /// Install a native route: what the host itself would answer for this
    /// method and exact path.
    pub fn native_route(&mut self, method: Method, path: &str, response: HandlerResponse) {
        self.native.insert((method, path.to_string()), response);
    }

    /// Handle one request end to end.
    pub fn handle(&self, req: &ParsedRequest) -> HandlerResponse {
        if let Some(response) = self.dispatcher.dispatch(req) {
            return response;
        }

        match self.native.get(&(req.method.clone(), req.path.clone())) {
            Some(response) => {
                debug!(method = %req.method, path = %req.path, "Native route answered");
                response.clone()
            }
            None => {
                debug!(method = %req.method, path = %req.path, "No route, default not-found");
                not_found()
            }
        }
    }
}

impl fmt::Debug for OverlayService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayService")
            .field("dispatcher", &self.dispatcher)
            .field("native_routes", &self.native.len())
            .finish()
    }
}
