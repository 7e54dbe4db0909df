use once_cell::sync::Lazy;
use regex::Regex;

static PARAM_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^}]+\}").expect("Failed to compile param segment regex"));

/// Reduce a route path to its comparison key by collapsing every maximal
/// `{...}` segment to the fixed token `{token}`.
///
/// Used only for computing identity keys; the matching engine always receives
/// the original path with its real parameter names. Pure and total: a path
/// with no parameter segments is returned unchanged.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    PARAM_SEGMENT.replace_all(path, "{token}").into_owned()
}
