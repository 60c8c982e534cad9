//! HTTP request types for the host-does-IO pattern.
//!
//! # Design
//! Requests are plain data. The query layer builds an `HttpRequest` and hands
//! it to a `Transport`; it never opens a socket itself. Query parameters and
//! headers are kept as ordered pairs so the wire order is deterministic and
//! easy to assert on in tests.

use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `path` is the absolute URL without the query string; `params` are encoded
/// by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn set_param(&mut self, key: &str, value: impl Into<String>) {
        set_pair(&mut self.params, key, value.into());
    }

    /// Header names compare case-insensitively.
    pub fn set_header(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
        {
            Some((_, v)) => *v = value,
            None => self.headers.push((key.to_string(), value)),
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

fn set_pair(pairs: &mut Vec<(String, String)>, key: &str, value: String) {
    match pairs.iter_mut().find(|(k, _)| k == key) {
        Some((_, v)) => *v = value,
        None => pairs.push((key.to_string(), value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_param_replaces_existing_value() {
        let mut req = HttpRequest::new(HttpMethod::Get, "http://localhost/x");
        req.set_param("page", "1");
        req.set_param("order", "Date ASC");
        req.set_param("page", "2");
        assert_eq!(
            req.params,
            vec![
                ("page".to_string(), "2".to_string()),
                ("order".to_string(), "Date ASC".to_string()),
            ]
        );
    }

    #[test]
    fn headers_are_case_insensitive() {
        let mut req = HttpRequest::new(HttpMethod::Get, "http://localhost/x");
        req.set_header("If-Modified-Since", "a");
        req.set_header("if-modified-since", "b");
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header("IF-MODIFIED-SINCE"), Some("b"));
    }

    #[test]
    fn method_display() {
        assert_eq!(HttpMethod::Put.to_string(), "PUT");
    }
}
