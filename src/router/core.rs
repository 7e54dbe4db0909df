use crate::registry::RouteRecord;
use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// Maximum number of path parameters before heap allocation.
/// Most routes have well under 8 parameter segments.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the dispatch hot path.
///
/// Param names are `Arc<str>` because they come from the compiled route
/// table and clone in O(1); values are per-request data extracted from the
/// URL and stay `String`.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of resolving a request against the matching engine: the payload the
/// route was inserted with plus the extracted path parameters.
#[derive(Clone)]
pub struct RouteMatch {
    /// The registered record. The dispatcher reads its *current* state
    /// through this reference, not a copy baked in at insertion time.
    pub record: Arc<RouteRecord>,
    /// Path parameters extracted from the URL (e.g. `{id}` -> `("id", "123")`).
    pub path_params: ParamVec,
}

impl RouteMatch {
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
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("record", &self.record)
            .field("path_params", &self.path_params)
            .finish()
    }
}

struct CompiledRoute {
    method: Method,
    vhost: String,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    record: Arc<RouteRecord>,
}

/// The path-matching engine of one listener.
///
/// Routes are inserted at registration time with the literal path (real
/// parameter names) and resolved per request by (method, path, host).
/// Matching prefers an exact virtual-host entry over a `*` wildcard entry;
/// within a table, insertion order decides.
///
/// The table is append-mostly: insertions happen only on first registration
/// of an identity, while resolution runs concurrently on every request, so
/// the table sits behind a short-held `RwLock`.
pub struct Router {
    table: RwLock<Vec<CompiledRoute>>,
}

impl Router {
    /// Create an empty matching engine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Vec::new()),
        }
    }

    /// Insert a route for one (method, path, vhost) triple.
    ///
    /// The record is stored as the opaque payload; later overrides mutate
    /// the record, never this table.
    pub fn add(&self, method: Method, path: &str, vhost: &str, record: Arc<RouteRecord>) {
        let (regex, param_names) = Self::path_to_regex(path);
        debug!(
            method = %method,
            path = %path,
            vhost = %vhost,
            pattern = %regex.as_str(),
            "Route inserted into matching engine"
        );
        self.write_table().push(CompiledRoute {
            method,
            vhost: vhost.to_ascii_lowercase(),
            regex,
            param_names,
            record,
        });
    }

    /// Resolve a request to a previously inserted route.
    ///
    /// Returns `None` when no structural match exists; the caller treats
    /// that as fallthrough.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str, host: &str) -> Option<RouteMatch> {
        let host = host.to_ascii_lowercase();
        let table = self.read_table();

        // Exact vhost entries shadow wildcard entries for the same request.
        let passes: [&str; 2] = [host.as_str(), "*"];
        for wanted in passes {
            if wanted.is_empty() {
                continue;
            }
            for compiled in table.iter() {
                if compiled.method != *method || compiled.vhost != wanted {
                    continue;
                }
                if let Some(caps) = compiled.regex.captures(path) {
                    let mut path_params = ParamVec::new();
                    for (i, name) in compiled.param_names.iter().enumerate() {
                        if let Some(m) = caps.get(i + 1) {
                            path_params.push((name.clone(), m.as_str().to_string()));
                        }
                    }
                    debug!(
                        method = %method,
                        path = %path,
                        vhost = %wanted,
                        pattern = %compiled.regex.as_str(),
                        path_params = ?path_params,
                        "Route matched"
                    );
                    return Some(RouteMatch {
                        record: compiled.record.clone(),
                        path_params,
                    });
                }
            }
        }

        debug!(method = %method, path = %path, host = %host, "No route matched");
        None
    }

    /// Number of (method, path, vhost) entries in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_table().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_table().is_empty()
    }

    /// Convert a route path to a regex and extract parameter names.
    ///
    /// `/users/{id}` becomes `^/users/([^/]+)$` with parameter names
    /// `["id"]`. Literal segments are escaped, so paths containing regex
    /// metacharacters match themselves.
    pub(crate) fn path_to_regex(path: &str) -> (Regex, Vec<Arc<str>>) {
        if path == "/" {
            return (
                Regex::new(r"^/$").expect("Failed to compile path regex"),
                Vec::new(),
            );
        }

        let mut pattern = String::with_capacity(path.len() + 5);
        pattern.push('^');
        let mut param_names: Vec<Arc<str>> = Vec::with_capacity(path.matches('{').count());

        for segment in path.split('/') {
            if segment.starts_with('{') && segment.ends_with('}') && segment.len() > 2 {
                let name = segment.trim_start_matches('{').trim_end_matches('}');
                pattern.push_str("/([^/]+)");
                param_names.push(Arc::from(name));
            } else if !segment.is_empty() {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }

        pattern.push('$');
        let regex = Regex::new(&pattern).expect("Failed to compile path regex");

        (regex, param_names)
    }

    fn read_table(&self) -> RwLockReadGuard<'_, Vec<CompiledRoute>> {
        match self.table.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Matching engine lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_table(&self) -> RwLockWriteGuard<'_, Vec<CompiledRoute>> {
        match self.table.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Matching engine lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.len())
            .finish()
    }
}
