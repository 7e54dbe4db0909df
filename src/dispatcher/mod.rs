//! # Dispatcher Module
//!
//! The per-request hook of the overlay. For each inbound request the
//! [`Dispatcher`] queries its listener's matching engine, reads the matched
//! record's current state, runs the optional admission filter, and produces
//! exactly one outcome: a response, or fallthrough (`None`).
//!
//! ## State machine
//!
//! `Unmatched -> Matched -> Filtered-Out (fallthrough) | Filtered-In -> Responded`
//!
//! Terminal states are "fallthrough" and "responded"; a request is never
//! dispatched twice by this component. Fallthrough covers three first-class,
//! non-error conditions: no structural match, a withdrawn handler, and a
//! filter that declined. In all three the host's default handling must
//! proceed exactly as if the overlay were never installed.
//!
//! ## Concurrency
//!
//! Filter evaluation is the only suspension point on the dispatch path: the
//! filter receives a continuation channel and may answer from another
//! coroutine. While the dispatcher waits it holds no locks, so concurrent
//! dispatches and register/delete calls proceed unblocked. Callable handlers
//! answer through the request's reply channel the same way; a handler that
//! drops its channel without replying yields a 503.

mod core;

pub use self::core::{
    Dispatcher, HandlerRequest, HandlerResponse, HeaderVec, ReplySender, MAX_INLINE_HEADERS,
};
