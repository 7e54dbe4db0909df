//! # Registry Module
//!
//! The registry owns the ordered sequence of route records for one server
//! instance and exposes the administrative surface of the overlay:
//! [`RouteRegistry::register`], [`RouteRegistry::delete`], and
//! [`RouteRegistry::lookup`].
//!
//! ## Identity
//!
//! Records are deduplicated by **identity key**: the uppercase-normalized
//! method plus the path with every `{param}` segment collapsed by
//! [`normalize_path`]. `get /hello/{name}` and `GET /hello/{thing}` are the
//! same route.
//!
//! ## Override semantics
//!
//! The first registration under an identity appends a record and inserts it
//! into every attached listener's matching engine, once per
//! (listener, vhost) pair. Every later registration under the same identity
//! merges the new handler, filter, tags, validation config, and literal path
//! into the existing record in place; position, method, and vhost set are
//! preserved, and the matching engine is never touched again. The engine
//! holds a live reference to the record and reads its current state at
//! dispatch time, so an override is a single atomic pointer swap.
//!
//! ## Deletion
//!
//! Deletion is soft: the handler is set to the withdrawn sentinel and the
//! record keeps its identity slot. A withdrawn record still matches
//! structurally but yields nothing at dispatch time, so the dispatcher falls
//! through exactly as if the registry had never claimed the path. A later
//! registration under the same identity reactivates the record by merge;
//! the sequence length never changes across a withdraw/reactivate cycle.

mod core;
mod normalize;

pub use self::core::{RegistryError, RouteIdent, RouteRecord, RouteRegistry, RouteState};
pub use self::normalize::normalize_path;
