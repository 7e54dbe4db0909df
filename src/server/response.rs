use crate::dispatcher::HandlerResponse;

/// Reason phrase for the status codes this layer produces.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// The host's default not-found response, produced when neither the overlay
/// nor the native route table claims a request.
#[must_use]
pub fn not_found() -> HandlerResponse {
    HandlerResponse::error(404, "Not Found")
}
