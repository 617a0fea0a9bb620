use std::collections::HashMap;

/// A parsed HTTP request.
///
/// Filled in incrementally by [`RequestParser`](crate::http::parser::RequestParser)
/// and left untouched once parsing finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// The method token as received (e.g. "GET")
    pub method: String,
    /// Normalized request target (e.g. "/index.html")
    pub path: String,
    /// Protocol version without the "HTTP/" prefix (e.g. "1.1")
    pub version: String,
    /// Header fields, case-sensitive as received, last occurrence wins
    pub headers: HashMap<String, String>,
    /// Raw body line, after in-place form decoding for url-encoded posts
    pub body: String,
    /// Fields decoded from an `application/x-www-form-urlencoded` body
    pub form: HashMap<String, String>,
}

impl Request {
    /// Retrieves a header value by its exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Returns the decoded form field, or an empty string if absent.
    pub fn form_value(&self, key: &str) -> &str {
        self.form.get(key).map(|v| v.as_str()).unwrap_or("")
    }

    /// Whether the connection should stay open after the response.
    ///
    /// Only an explicit `Connection: keep-alive` on an HTTP/1.1 request
    /// qualifies; the comparison is exact.
    pub fn is_keep_alive(&self) -> bool {
        self.header("Connection") == Some("keep-alive") && self.version == "1.1"
    }
}
