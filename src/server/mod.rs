//! # Server Module
//!
//! Host transport glue. The overlay does not parse HTTP or own connections;
//! it consumes a [`ParsedRequest`] view of each inbound request and produces
//! a [`HandlerResponse`](crate::dispatcher::HandlerResponse) or declines.
//!
//! [`OverlayService`] wires the dispatcher in front of a stand-in native
//! route table, realizing the fallthrough contract: a request the overlay
//! declines gets exactly what the host would have produced with no overlay
//! installed.

mod request;
mod response;
mod service;

pub use self::request::{parse_query_params, strip_port, ParsedRequest};
pub use self::response::{not_found, status_reason};
pub use self::service::OverlayService;
