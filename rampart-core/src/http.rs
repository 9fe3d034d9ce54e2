// HTTP request and response types

use crate::{ErrorList, Extensions};
use cookie::Cookie;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP request wrapper
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub path_params: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    /// Whether the request arrived over an encrypted (TLS) connection
    pub tls: bool,
    /// Typed request-scoped state
    pub extensions: Extensions,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HashMap::new(),
            body: Vec::new(),
            path_params: HashMap::new(),
            query_params: HashMap::new(),
            tls: false,
            extensions: Extensions::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Get a header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The `Host` header
    pub fn host(&self) -> Option<&str> {
        self.header("Host")
    }

    /// The media type of the body, without parameters, lower-cased
    pub fn content_type(&self) -> Option<String> {
        self.header("Content-Type").map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    pub fn is_tls(&self) -> bool {
        self.tls
    }

    /// Get a cookie value sent in the `Cookie` header
    pub fn cookie(&self, name: &str) -> Option<String> {
        let header = self.header("Cookie")?;
        Cookie::split_parse(header)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_string())
    }

    /// Parse the request body as JSON
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> Result<T, crate::Error> {
        serde_json::from_slice(&self.body).map_err(|e| crate::Error::Deserialization(e.to_string()))
    }

    /// Get a path parameter by name
    pub fn param(&self, name: &str) -> Option<&String> {
        self.path_params.get(name)
    }

    /// Get a query parameter by name
    pub fn query(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }
}

/// HTTP response wrapper
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub cookies: Vec<Cookie<'static>>,
    pub body: Vec<u8>,
    /// Errors recorded while producing this response
    pub errors: ErrorList,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            cookies: Vec::new(),
            body: Vec::new(),
            errors: ErrorList::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn bad_request() -> Self {
        Self::new(400)
    }

    pub fn forbidden() -> Self {
        Self::new(403)
    }

    pub fn not_found() -> Self {
        Self::new(404)
    }

    pub fn internal_server_error() -> Self {
        Self::new(500)
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, crate::Error> {
        self.body =
            serde_json::to_vec(value).map_err(|e| crate::Error::Serialization(e.to_string()))?;
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        Ok(self)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Get a header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Add a value to a comma-separated list header such as `Vary`.
    ///
    /// Values already present (compared case-insensitively) are not repeated.
    pub fn append_header(&mut self, name: &str, value: &str) {
        let existing = self
            .headers
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned();

        match existing {
            Some(key) => {
                let current = self.headers.entry(key).or_default();
                let present = current
                    .split(',')
                    .any(|item| item.trim().eq_ignore_ascii_case(value));
                if !present {
                    if current.trim().is_empty() {
                        *current = value.to_string();
                    } else {
                        current.push_str(", ");
                        current.push_str(value);
                    }
                }
            }
            None => {
                self.headers.insert(name.to_string(), value.to_string());
            }
        }
    }

    /// Queue a cookie to be sent with `Set-Cookie`
    pub fn add_cookie(&mut self, cookie: Cookie<'static>) {
        self.cookies.retain(|c| c.name() != cookie.name());
        self.cookies.push(cookie);
    }

    /// Rendered `Set-Cookie` header values
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.cookies.iter().map(|c| c.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = HttpRequest::new("GET", "/").with_header("X-CSRF-Token", "abc");

        assert_eq!(req.header("x-csrf-token"), Some("abc"));
        assert_eq!(req.header("X-Csrf-Token"), Some("abc"));
        assert_eq!(req.header("missing"), None);
    }

    #[test]
    fn test_cookie_lookup() {
        let req = HttpRequest::new("GET", "/")
            .with_header("cookie", "_session=xyz; _csrf_token=abc%3D; theme=dark");

        assert_eq!(req.cookie("_csrf_token"), Some("abc%3D".to_string()));
        assert_eq!(req.cookie("theme"), Some("dark".to_string()));
        assert_eq!(req.cookie("absent"), None);
    }

    #[test]
    fn test_content_type_strips_parameters() {
        let req = HttpRequest::new("POST", "/")
            .with_header("Content-Type", "Multipart/Form-Data; boundary=xyz");

        assert_eq!(req.content_type().as_deref(), Some("multipart/form-data"));
    }

    #[test]
    fn test_append_header_merges_without_duplicates() {
        let mut response = HttpResponse::ok().with_header("vary", "Accept-Encoding");

        response.append_header("Vary", "Cookie");
        response.append_header("Vary", "cookie");

        assert_eq!(response.header("Vary"), Some("Accept-Encoding, Cookie"));
    }

    #[test]
    fn test_append_header_inserts_when_missing() {
        let mut response = HttpResponse::ok();
        response.append_header("Vary", "Cookie");

        assert_eq!(response.header("vary"), Some("Cookie"));
    }

    #[test]
    fn test_add_cookie_replaces_same_name() {
        let mut response = HttpResponse::ok();
        response.add_cookie(Cookie::new("a", "1"));
        response.add_cookie(Cookie::new("a", "2"));

        assert_eq!(response.set_cookie_headers(), vec!["a=2".to_string()]);
    }
}
