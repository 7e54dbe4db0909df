//! # Router Module
//!
//! The path-matching engine consumed by the registry and the dispatcher.
//! Each listener owns one [`Router`]; the registry inserts a route on first
//! registration of an identity, and the dispatcher resolves each inbound
//! (method, path, host) triple to a [`RouteMatch`].
//!
//! ## Two-phase approach
//!
//! 1. **Insertion**: registration paths (e.g. `/pets/{id}`) are compiled
//!    into regex patterns that match and extract path parameters. Insertion
//!    is rare and append-mostly.
//! 2. **Resolution**: each request tests the compiled patterns for its
//!    method and host, exact virtual host before the `*` wildcard, and
//!    returns the stored record plus extracted parameters.
//!
//! The stored payload is a live reference to the registry's mutable route
//! record, never a copy, so overrides and withdrawals are visible at the
//! next dispatch without touching this table.

mod core;

pub use self::core::{ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
