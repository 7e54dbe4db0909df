//! # Malkoha
//!
//! **Malkoha** is a dynamic route-registry overlay for servers built on the
//! `may` coroutine runtime. It lets a running server register, override,
//! update, and retract routes at runtime, and resolves each inbound request
//! to at most one active handler.
//!
//! ## Overview
//!
//! A host server installs one [`registry::RouteRegistry`] per server instance
//! and one [`router::Router`] (the path-matching engine) per listener. Routes
//! registered through the registry shadow the host's own routing: when the
//! overlay has nothing to say about a request, the [`dispatcher::Dispatcher`]
//! declines and the host's default handling proceeds untouched.
//!
//! ## Architecture
//!
//! - **[`config`]** - Route specification types and registration validation
//! - **[`registry`]** - The route registry: register / override / delete / lookup
//! - **[`router`]** - Path matching with `{param}` segments and virtual hosts
//! - **[`dispatcher`]** - Per-request hook: match, filter, respond, or fall through
//! - **[`server`]** - Host transport glue: parsed request view and overlay service
//!
//! ## Core semantics
//!
//! Routes are deduplicated by **identity key**: the method plus the path with
//! every `{param}` segment collapsed to a single placeholder, so
//! `GET /hello/{name}` and `get /hello/{thing}` are one logical route.
//! Re-registering an identity merges the new handler, filter, and metadata
//! into the existing record in place; the matching engine is only ever
//! inserted into once per identity and reads the record's current state at
//! dispatch time. Deleting a route withdraws its handler but keeps the record
//! in its identity slot, so a later registration reactivates it by merge.
//!
//! ## Example
//!
//! ```rust,ignore
//! use malkoha::{Dispatcher, HandlerResponse, RouteRegistry, RouteSpec, Router};
//! use std::sync::Arc;
//!
//! let listener = Arc::new(Router::new());
//! let registry = RouteRegistry::new(vec![listener.clone()])?;
//! let dispatcher = Dispatcher::new(listener);
//!
//! registry.register([RouteSpec::new("/pets/{id}").callable(|req| {
//!     let id = req.get_path_param("id").unwrap_or("").to_string();
//!     req.reply(HandlerResponse::json(200, serde_json::json!({ "id": id })));
//! })])?;
//!
//! // per request, from the listener's earliest extension point:
//! if let Some(resp) = dispatcher.dispatch(&parsed) {
//!     // overlay answered
//! } else {
//!     // fall through to the host's own routing
//! }
//! ```

pub mod config;
pub mod dispatcher;
pub mod registry;
pub mod router;
pub mod server;

pub use config::{ConfigError, RouteConfig, RouteHandler, RouteSpec, StaticResponse};
pub use dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
pub use registry::{normalize_path, RegistryError, RouteIdent, RouteRecord, RouteRegistry};
pub use router::{RouteMatch, Router};
pub use server::{OverlayService, ParsedRequest};
