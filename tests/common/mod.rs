#![allow(dead_code)]

use malkoha::{Dispatcher, RouteRegistry, Router};
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Install a test subscriber once per process; respects `RUST_LOG`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A single-listener overlay: one matching engine shared by the registry
/// and the dispatcher.
pub fn overlay() -> (Arc<Router>, RouteRegistry, Dispatcher) {
    init_tracing();
    let router = Arc::new(Router::new());
    let registry = RouteRegistry::new(vec![router.clone()]).expect("registry with one listener");
    let dispatcher = Dispatcher::new(router.clone());
    (router, registry, dispatcher)
}
