use crate::config::{parse_method, ConfigError, RouteFilter, RouteHandler, RouteSettings, RouteSpec};
use crate::router::Router;
use arc_swap::ArcSwap;
use http::Method;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use super::normalize::normalize_path;

/// The mutable fields of a route record, swapped as one immutable snapshot.
///
/// A dispatch loads exactly one snapshot, so it can never observe a new
/// handler paired with a stale filter.
#[derive(Clone)]
pub struct RouteState {
    /// The literal registration path, with real parameter names. Replaced on
    /// every merge; the matching engine keeps the path it was inserted with.
    pub path: String,
    /// The active handler, or the withdrawn sentinel.
    pub handler: RouteHandler,
    /// Optional admission filter.
    pub filter: Option<RouteFilter>,
    /// Opaque metadata, no behavioral effect.
    pub tags: Option<Value>,
    /// Opaque validation config, no behavioral effect.
    pub validate: Option<Value>,
}

impl fmt::Debug for RouteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteState")
            .field("path", &self.path)
            .field("handler", &self.handler)
            .field("filter", &self.filter.as_ref().map(|_| "<filter>"))
            .field("tags", &self.tags)
            .field("validate", &self.validate)
            .finish()
    }
}

/// One registered route: an immutable identity plus a mutable state cell.
///
/// The identity (method, compare-path, vhost set) is fixed at first
/// registration. The matching engine holds an `Arc` to the record and reads
/// its current state at dispatch time, which is what makes an override an
/// O(1) metadata swap instead of a re-routing operation.
pub struct RouteRecord {
    method: Method,
    compare_path: String,
    vhost: Vec<String>,
    state: ArcSwap<RouteState>,
}

impl RouteRecord {
    fn new(settings: RouteSettings, compare_path: String) -> Self {
        Self {
            method: settings.method,
            compare_path,
            vhost: settings.vhost,
            state: ArcSwap::from_pointee(RouteState {
                path: settings.path,
                handler: settings.handler,
                filter: settings.filter,
                tags: settings.tags,
                validate: settings.validate,
            }),
        }
    }

    /// The method half of the identity key (uppercase-normalized).
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The normalized-path half of the identity key.
    #[must_use]
    pub fn compare_path(&self) -> &str {
        &self.compare_path
    }

    /// Virtual hosts this record was registered for. Fixed at creation;
    /// merges never touch it.
    #[must_use]
    pub fn vhost(&self) -> &[String] {
        &self.vhost
    }

    /// Load the current state snapshot.
    #[must_use]
    pub fn state(&self) -> Arc<RouteState> {
        self.state.load_full()
    }

    /// Whether the record currently has no active handler.
    #[must_use]
    pub fn is_withdrawn(&self) -> bool {
        self.state.load().handler.is_withdrawn()
    }

    /// Replace the mutable fields with the new registration's, atomically.
    fn merge(&self, settings: RouteSettings) {
        self.state.store(Arc::new(RouteState {
            path: settings.path,
            handler: settings.handler,
            filter: settings.filter,
            tags: settings.tags,
            validate: settings.validate,
        }));
    }

    /// Clear the handler, keeping every other field in place.
    fn withdraw(&self) {
        self.state.rcu(|current| {
            let mut state = (**current).clone();
            state.handler = RouteHandler::Withdrawn;
            state
        });
    }
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("method", &self.method)
            .field("compare_path", &self.compare_path)
            .field("vhost", &self.vhost)
            .field("state", &self.state.load())
            .finish()
    }
}

/// Identity of a registered route: method plus literal path.
///
/// Lookup and deletion normalize the path, so any parameter names select the
/// same record the registration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteIdent {
    pub method: Method,
    pub path: String,
}

impl RouteIdent {
    /// Build an identity from a method token (case-insensitive) and a path.
    pub fn new(method: &str, path: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            method: parse_method(Some(method))?,
            path: path.to_string(),
        })
    }

    /// Identity for a `GET` route.
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::GET,
            path: path.to_string(),
        }
    }
}

/// Registry operation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The registry was created without any attached listener; there is
    /// nowhere to push routes at registration time.
    NoActiveListeners,
    /// A registration entry failed validation. Entries already processed in
    /// the same batch stay committed.
    Config(ConfigError),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NoActiveListeners => {
                write!(f, "cannot create a route registry without any active listeners")
            }
            RegistryError::Config(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Config(err) => Some(err),
            RegistryError::NoActiveListeners => None,
        }
    }
}

impl From<ConfigError> for RegistryError {
    fn from(err: ConfigError) -> Self {
        RegistryError::Config(err)
    }
}

/// The route registry: an ordered sequence of route records owned by one
/// server instance, plus the matching engines of its listeners.
///
/// Records are deduplicated by identity key. Re-registering an identity
/// merges the new handler, filter, and metadata into the existing record in
/// place; the matching engines are only inserted into on first registration,
/// once per (listener, vhost) pair. Deletion withdraws a record's handler
/// but never removes the record, so a later registration under the same
/// identity reactivates it by merge.
pub struct RouteRegistry {
    routes: RwLock<Vec<Arc<RouteRecord>>>,
    listeners: Vec<Arc<Router>>,
}

impl RouteRegistry {
    /// Create an empty registry attached to the given listeners' matching
    /// engines.
    ///
    /// Fails with [`RegistryError::NoActiveListeners`] when the listener set
    /// is empty: routes registered later would be unreachable.
    pub fn new(listeners: Vec<Arc<Router>>) -> Result<Self, RegistryError> {
        if listeners.is_empty() {
            return Err(RegistryError::NoActiveListeners);
        }
        Ok(Self {
            routes: RwLock::new(Vec::new()),
            listeners,
        })
    }

    /// Register one or many route specifications, in order.
    ///
    /// Each entry is validated and applied independently; there is no
    /// transaction across the batch. A validation failure aborts that entry
    /// and the remainder of the batch, but entries already processed stay
    /// committed.
    pub fn register<I>(&self, specs: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = RouteSpec>,
    {
        for spec in specs {
            let settings = spec.into_settings()?;
            self.apply(settings);
        }
        Ok(())
    }

    fn apply(&self, settings: RouteSettings) {
        let compare_path = normalize_path(&settings.path);
        let path = settings.path.clone();
        let method = settings.method.clone();

        let mut routes = self.write_routes();
        if let Some(record) = routes
            .iter()
            .find(|r| r.method == method && r.compare_path == compare_path)
        {
            info!(
                method = %method,
                path = %path,
                compare_path = %compare_path,
                "Route override, merging record in place"
            );
            record.merge(settings);
            return;
        }

        let record = Arc::new(RouteRecord::new(settings, compare_path.clone()));
        routes.push(record.clone());
        drop(routes);

        info!(
            method = %method,
            path = %path,
            compare_path = %compare_path,
            vhosts = ?record.vhost(),
            listeners = self.listeners.len(),
            "Route registered"
        );

        // First registration under this identity: push into every listener's
        // matching engine, once per (listener, vhost) pair. Later merges
        // never re-insert; the engine resolves to this record and reads its
        // current state at dispatch time.
        for listener in &self.listeners {
            for vhost in record.vhost() {
                listener.add(method.clone(), &path, vhost, record.clone());
            }
        }
    }

    /// Soft-delete one or many routes by identity.
    ///
    /// A found record has its handler cleared; every other field, its
    /// position in the sequence, and its matching-engine entries stay.
    /// Deleting an identity that was never registered is a no-op.
    pub fn delete<I>(&self, idents: I)
    where
        I: IntoIterator<Item = RouteIdent>,
    {
        for ident in idents {
            let compare_path = normalize_path(&ident.path);
            let routes = self.read_routes();
            match routes
                .iter()
                .find(|r| r.method == ident.method && r.compare_path == compare_path)
            {
                Some(record) => {
                    record.withdraw();
                    info!(
                        method = %ident.method,
                        compare_path = %compare_path,
                        "Route withdrawn"
                    );
                }
                None => {
                    debug!(
                        method = %ident.method,
                        compare_path = %compare_path,
                        "Delete of unregistered route ignored"
                    );
                }
            }
        }
    }

    /// Identity-key lookup.
    #[must_use]
    pub fn lookup(&self, ident: &RouteIdent) -> Option<Arc<RouteRecord>> {
        let compare_path = normalize_path(&ident.path);
        self.read_routes()
            .iter()
            .find(|r| r.method == ident.method && r.compare_path == compare_path)
            .cloned()
    }

    /// Number of records in the sequence, withdrawn ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_routes().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_routes().is_empty()
    }

    fn read_routes(&self) -> RwLockReadGuard<'_, Vec<Arc<RouteRecord>>> {
        match self.routes.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Route sequence lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_routes(&self) -> RwLockWriteGuard<'_, Vec<Arc<RouteRecord>>> {
        match self.routes.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Route sequence lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("routes", &self.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
