//! End-to-end tests through the overlay service: overlay routes in front of
//! a native route table, with the fallthrough and override-precedence
//! contracts observable from the outside.

use http::Method;
use malkoha::{
    HandlerRequest, HandlerResponse, OverlayService, ParsedRequest, RouteIdent, RouteSpec,
};
use serde_json::json;

mod common;
use common::overlay;

fn reply(value: &'static str) -> impl Fn(HandlerRequest) + Send + Sync {
    move |req| req.reply(HandlerResponse::json(200, json!(value)))
}

#[test]
fn test_register_override_delete_with_native_fallback() {
    let (_, registry, dispatcher) = overlay();
    let mut service = OverlayService::new(dispatcher);
    service.native_route(Method::GET, "/", HandlerResponse::json(200, json!("1")));

    // Overlay route answers first.
    registry
        .register([RouteSpec::new("/").callable(reply("1"))])
        .expect("register");
    let resp = service.handle(&ParsedRequest::get("/", "localhost"));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, json!("1"));

    // Re-registering overrides, it does not duplicate.
    registry
        .register([RouteSpec::new("/").callable(reply("2"))])
        .expect("override");
    let resp = service.handle(&ParsedRequest::get("/", "localhost"));
    assert_eq!(resp.body, json!("2"));
    assert_eq!(registry.len(), 1);

    // Deleting falls back to the native route.
    registry.delete([RouteIdent::get("/")]);
    let resp = service.handle(&ParsedRequest::get("/", "localhost"));
    assert_eq!(resp.body, json!("1"));
}

#[test]
fn test_delete_without_native_route_yields_default_not_found() {
    let (_, registry, dispatcher) = overlay();
    let service = OverlayService::new(dispatcher);

    registry
        .register([RouteSpec::new("/ephemeral").callable(reply("here"))])
        .expect("register");
    assert_eq!(
        service.handle(&ParsedRequest::get("/ephemeral", "localhost")).status,
        200
    );

    registry.delete([RouteIdent::get("/ephemeral")]);
    let resp = service.handle(&ParsedRequest::get("/ephemeral", "localhost"));
    assert_eq!(resp.status, 404);
}

#[test]
fn test_overlay_takes_precedence_over_native_routes() {
    let (_, registry, dispatcher) = overlay();
    let mut service = OverlayService::new(dispatcher);
    service.native_route(Method::GET, "/", HandlerResponse::json(200, json!("native")));

    registry
        .register([RouteSpec::new("/").callable(reply("overlay"))])
        .expect("register");

    let resp = service.handle(&ParsedRequest::get("/", "localhost"));
    assert_eq!(resp.body, json!("overlay"));
}

#[test]
fn test_fallthrough_is_indistinguishable_from_no_overlay() {
    let (_, _registry, dispatcher) = overlay();
    let mut with_overlay = OverlayService::new(dispatcher);
    let native = HandlerResponse::json(200, json!("native"));
    with_overlay.native_route(Method::GET, "/native", native.clone());

    // Nothing registered: the native response comes back exactly as
    // installed, and unknown paths get the default not-found.
    let resp = with_overlay.handle(&ParsedRequest::get("/native", "localhost"));
    assert_eq!(resp, native);
    assert_eq!(
        with_overlay.handle(&ParsedRequest::get("/missing", "localhost")).status,
        404
    );
}

#[test]
fn test_path_parameters_end_to_end() {
    let (_, registry, dispatcher) = overlay();
    let service = OverlayService::new(dispatcher);

    registry
        .register([RouteSpec::new("/{value}").callable(|req: HandlerRequest| {
            let value = req.get_path_param("value").unwrap_or("").to_string();
            req.reply(HandlerResponse::json(200, json!(value)));
        })])
        .expect("register");

    let resp = service.handle(&ParsedRequest::get("/foo", "localhost"));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, json!("foo"));
}

#[test]
fn test_vhost_route_with_host_header_port() {
    let (_, registry, dispatcher) = overlay();
    let service = OverlayService::new(dispatcher);

    registry
        .register([RouteSpec::new("/api")
            .vhost(&["api.example.com"])
            .callable(reply("api"))])
        .expect("register");

    // The transport strips the port before the overlay sees the host.
    let resp = service.handle(&ParsedRequest::get("/api", "api.example.com:8080"));
    assert_eq!(resp.body, json!("api"));

    let resp = service.handle(&ParsedRequest::get("/api", "other.example.com"));
    assert_eq!(resp.status, 404);
}
