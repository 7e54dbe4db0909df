//! Tests for the route registry: identity deduplication, override merge,
//! soft deletion, and batch registration semantics.

use malkoha::{
    ConfigError, HandlerResponse, ParsedRequest, RegistryError, RouteConfig, RouteHandler,
    RouteIdent, RouteRegistry, RouteSpec, StaticResponse,
};
use serde_json::json;

mod common;
use common::overlay;

/// Callable handler replying with a fixed JSON value.
fn echo(value: &'static str) -> RouteHandler {
    RouteHandler::callable(move |req| req.reply(HandlerResponse::json(200, json!(value))))
}

#[test]
fn test_identity_collapses_parameter_names_and_method_case() {
    let (router, registry, dispatcher) = overlay();

    registry
        .register([RouteSpec::new("/hello/{name}").handler(echo("1"))])
        .expect("first registration");
    registry
        .register([RouteSpec::new("/hello/{thing}").method("GET").handler(echo("2"))])
        .expect("second registration");

    // One record, one matcher entry: the second registration merged.
    assert_eq!(registry.len(), 1);
    assert_eq!(router.len(), 1);

    let resp = dispatcher
        .dispatch(&ParsedRequest::get("/hello/person", "localhost"))
        .expect("dispatch");
    assert_eq!(resp.body, json!("2"));
}

#[test]
fn test_override_replaces_handler_in_place() {
    let (_, registry, dispatcher) = overlay();

    registry
        .register([RouteSpec::new("/").handler(echo("1"))])
        .expect("register");
    let resp = dispatcher
        .dispatch(&ParsedRequest::get("/", "localhost"))
        .expect("dispatch");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, json!("1"));

    registry
        .register([RouteSpec::new("/").handler(echo("2"))])
        .expect("override");
    let resp = dispatcher
        .dispatch(&ParsedRequest::get("/", "localhost"))
        .expect("dispatch after override");
    assert_eq!(resp.body, json!("2"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_withdraw_then_reactivate_keeps_one_record() {
    let (router, registry, dispatcher) = overlay();

    registry
        .register([RouteSpec::new("/").handler(echo("1"))])
        .expect("register");
    registry.delete([RouteIdent::get("/")]);

    assert!(dispatcher
        .dispatch(&ParsedRequest::get("/", "localhost"))
        .is_none());

    registry
        .register([RouteSpec::new("/").handler(echo("2"))])
        .expect("reactivate");
    let resp = dispatcher
        .dispatch(&ParsedRequest::get("/", "localhost"))
        .expect("dispatch after reactivation");
    assert_eq!(resp.body, json!("2"));

    // The cycle never grew the sequence or the matcher table.
    assert_eq!(registry.len(), 1);
    assert_eq!(router.len(), 1);
}

#[test]
fn test_delete_unknown_identity_is_a_noop() {
    let (_, registry, _) = overlay();
    registry.delete([RouteIdent::get("/never/registered")]);
    assert!(registry.is_empty());
}

#[test]
fn test_delete_ignores_parameter_names() {
    let (_, registry, dispatcher) = overlay();

    registry
        .register([RouteSpec::new("/hello/{name}").handler(echo("1"))])
        .expect("register");
    registry.delete([RouteIdent::get("/hello/{anything}")]);

    assert!(dispatcher
        .dispatch(&ParsedRequest::get("/hello/person", "localhost"))
        .is_none());
}

#[test]
fn test_delete_only_clears_the_handler() {
    let (_, registry, _) = overlay();

    registry
        .register([RouteSpec::new("/tagged").handler(echo("1")).tags(json!(["a"]))])
        .expect("register");
    registry.delete([RouteIdent::get("/tagged")]);

    let record = registry
        .lookup(&RouteIdent::get("/tagged"))
        .expect("record still present");
    assert!(record.is_withdrawn());
    assert_eq!(record.state().tags, Some(json!(["a"])));
}

#[test]
fn test_batch_commits_entries_before_a_validation_failure() {
    let (_, registry, dispatcher) = overlay();

    let err = registry
        .register([
            RouteSpec::new("/a").handler(echo("a")),
            RouteSpec::new("").handler(echo("broken")),
            RouteSpec::new("/b").handler(echo("b")),
        ])
        .expect_err("empty path must fail");
    assert_eq!(err, RegistryError::Config(ConfigError::EmptyPath));

    // The entry before the failure is committed; the one after is not.
    assert_eq!(registry.len(), 1);
    assert!(dispatcher
        .dispatch(&ParsedRequest::get("/a", "localhost"))
        .is_some());
    assert!(dispatcher
        .dispatch(&ParsedRequest::get("/b", "localhost"))
        .is_none());
}

#[test]
fn test_registry_requires_a_listener() {
    let err = RouteRegistry::new(Vec::new()).expect_err("no listeners");
    assert_eq!(err, RegistryError::NoActiveListeners);
}

#[test]
fn test_ambiguous_handler_is_rejected() {
    let (_, registry, _) = overlay();

    let err = registry
        .register([RouteSpec::new("/")
            .handler(echo("bare"))
            .config(RouteConfig::new().handler(echo("nested")))])
        .expect_err("both handlers supplied");
    assert_eq!(err, RegistryError::Config(ConfigError::AmbiguousHandler));
    assert!(registry.is_empty());
}

#[test]
fn test_invalid_method_creates_no_record() {
    let (_, registry, _) = overlay();

    let err = registry
        .register([RouteSpec::new("/").method("not a token").handler(echo("1"))])
        .expect_err("invalid method");
    assert!(matches!(
        err,
        RegistryError::Config(ConfigError::InvalidMethod { .. })
    ));
    assert!(registry.is_empty());
}

#[test]
fn test_lookup_by_identity() {
    let (_, registry, _) = overlay();

    registry
        .register([RouteSpec::new("/pets/{id}").handler(echo("pet"))])
        .expect("register");

    let record = registry
        .lookup(&RouteIdent::get("/pets/{anything}"))
        .expect("identity collapses parameter names");
    assert_eq!(record.state().path, "/pets/{id}");
    assert!(registry
        .lookup(&RouteIdent::get("/unknown"))
        .is_none());
    assert!(registry
        .lookup(&RouteIdent::new("post", "/pets/{id}").expect("ident"))
        .is_none());
}

#[test]
fn test_merge_preserves_the_original_vhost_set() {
    let (_, registry, dispatcher) = overlay();

    registry
        .register([RouteSpec::new("/")
            .vhost(&["a.example.com"])
            .handler(echo("1"))])
        .expect("register");
    registry
        .register([RouteSpec::new("/")
            .vhost(&["b.example.com"])
            .handler(echo("2"))])
        .expect("override");

    // The override's handler took effect on the original vhost ...
    let resp = dispatcher
        .dispatch(&ParsedRequest::get("/", "a.example.com"))
        .expect("dispatch on original vhost");
    assert_eq!(resp.body, json!("2"));

    // ... and its vhost set was ignored.
    assert!(dispatcher
        .dispatch(&ParsedRequest::get("/", "b.example.com"))
        .is_none());
}

#[test]
fn test_override_replaces_a_stale_filter() {
    let (_, registry, dispatcher) = overlay();

    registry
        .register([RouteSpec::new("/")
            .handler(echo("1"))
            .filter(|_req, decision| {
                let _ = decision.send(false);
            })])
        .expect("register");
    assert!(dispatcher
        .dispatch(&ParsedRequest::get("/", "localhost"))
        .is_none());

    // Re-registering without a filter clears the old one.
    registry
        .register([RouteSpec::new("/").handler(echo("2"))])
        .expect("override");
    let resp = dispatcher
        .dispatch(&ParsedRequest::get("/", "localhost"))
        .expect("dispatch after override");
    assert_eq!(resp.body, json!("2"));
}

#[test]
fn test_config_handler_registration_and_override() {
    let (_, registry, dispatcher) = overlay();

    registry
        .register([RouteSpec::new("/").config(RouteConfig::new().handler(echo("1")))])
        .expect("register via config.handler");
    let resp = dispatcher
        .dispatch(&ParsedRequest::get("/", "localhost"))
        .expect("dispatch");
    assert_eq!(resp.body, json!("1"));

    registry
        .register([RouteSpec::new("/")
            .config(RouteConfig::new().handler(echo("2")).tags(json!(["test"])))])
        .expect("override via config.handler");
    let resp = dispatcher
        .dispatch(&ParsedRequest::get("/", "localhost"))
        .expect("dispatch after override");
    assert_eq!(resp.body, json!("2"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_registering_without_a_handler_creates_a_withdrawn_record() {
    let (_, registry, dispatcher) = overlay();

    registry
        .register([RouteSpec::new("/placeholder")])
        .expect("register without handler");
    assert_eq!(registry.len(), 1);
    assert!(dispatcher
        .dispatch(&ParsedRequest::get("/placeholder", "localhost"))
        .is_none());

    // The placeholder reactivates by merge.
    registry
        .register([RouteSpec::new("/placeholder").static_response(StaticResponse::new(json!("x")))])
        .expect("activate");
    assert_eq!(registry.len(), 1);
    assert!(dispatcher
        .dispatch(&ParsedRequest::get("/placeholder", "localhost"))
        .is_some());
}

#[test]
fn test_registry_feeds_every_listener() {
    common::init_tracing();
    let a = std::sync::Arc::new(malkoha::Router::new());
    let b = std::sync::Arc::new(malkoha::Router::new());
    let registry =
        RouteRegistry::new(vec![a.clone(), b.clone()]).expect("registry with two listeners");

    registry
        .register([RouteSpec::new("/shared").handler(echo("1"))])
        .expect("register");

    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 1);

    // A merge never re-inserts into either matcher.
    registry
        .register([RouteSpec::new("/shared").handler(echo("2"))])
        .expect("override");
    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 1);
}
