use http::Method;
use serde_json::Value;
use std::collections::HashMap;

/// Parsed HTTP request data consumed by the dispatcher.
///
/// This is the boundary with the host transport: whatever HTTP stack the
/// host runs, it hands the overlay this view of the inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    /// HTTP method
    pub method: Method,
    /// Request path, query string stripped
    pub path: String,
    /// Request host name, lowercased, port stripped
    pub host: String,
    /// HTTP headers (lowercase keys)
    pub headers: HashMap<String, String>,
    /// Parsed query string parameters
    pub query_params: HashMap<String, String>,
    /// Parsed JSON body (if present)
    pub body: Option<Value>,
}

impl ParsedRequest {
    /// Build a parsed request from a method, a path that may carry a query
    /// string, and a host that may carry a port.
    #[must_use]
    pub fn new(method: Method, path_and_query: &str, host: &str) -> Self {
        let path = path_and_query
            .split('?')
            .next()
            .unwrap_or("/")
            .to_string();
        Self {
            method,
            path,
            host: strip_port(host).to_ascii_lowercase(),
            headers: HashMap::new(),
            query_params: parse_query_params(path_and_query),
            body: None,
        }
    }

    /// Shorthand for a `GET` request.
    #[must_use]
    pub fn get(path_and_query: &str, host: &str) -> Self {
        Self::new(Method::GET, path_and_query, host)
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Parse query string parameters from a URL path.
///
/// Extracts everything after the `?` and URL-decodes names and values.
#[must_use]
pub fn parse_query_params(path: &str) -> HashMap<String, String> {
    if let Some(pos) = path.find('?') {
        let query_str = &path[pos + 1..];
        url::form_urlencoded::parse(query_str.as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    } else {
        HashMap::new()
    }
}

/// Strip a trailing `:port` from a host header value.
#[must_use]
pub fn strip_port(host: &str) -> &str {
    host.rsplit_once(':')
        .map(|(name, port)| {
            if port.chars().all(|c| c.is_ascii_digit()) {
                name
            } else {
                host
            }
        })
        .unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_params() {
        let q = parse_query_params("/p?x=1&y=2");
        assert_eq!(q.get("x"), Some(&"1".to_string()));
        assert_eq!(q.get("y"), Some(&"2".to_string()));
    }

    #[test]
    fn test_parse_query_params_decodes() {
        let q = parse_query_params("/p?name=a%20b");
        assert_eq!(q.get("name"), Some(&"a b".to_string()));
    }

    #[test]
    fn test_no_query_string() {
        assert!(parse_query_params("/p").is_empty());
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("example.com:8080"), "example.com");
        assert_eq!(strip_port("example.com"), "example.com");
    }

    #[test]
    fn test_new_splits_query_and_normalizes_host() {
        let req = ParsedRequest::get("/pets?limit=10", "API.Example.com:8080");
        assert_eq!(req.path, "/pets");
        assert_eq!(req.host, "api.example.com");
        assert_eq!(req.query_params.get("limit"), Some(&"10".to_string()));
    }
}
