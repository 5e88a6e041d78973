//! Request and response values that flow between the router, strategies, stores and network.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::cache::hash::compute_cache_key;

/// Declared destination of an intercepted request (what the page will use it for).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Destination {
    Image,
    Document,
    Script,
    Style,
    /// Anything else, including the empty destination of `fetch()` calls.
    #[default]
    Empty,
    Other(String),
}

impl Destination {
    /// Parse a destination string as the page reports it.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => Self::Image,
            "document" => Self::Document,
            "script" => Self::Script,
            "style" => Self::Style,
            "" => Self::Empty,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Script => "script",
            Self::Style => "style",
            Self::Empty => "",
            Self::Other(s) => s,
        }
    }
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Upper-case HTTP method.
    pub method: String,
    /// Absolute URL.
    pub url: String,
    pub destination: Destination,
}

impl Request {
    /// A `GET` request with the given destination.
    pub fn get(url: impl Into<String>, destination: Destination) -> Self {
        Self { method: "GET".into(), url: url.into(), destination }
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    /// Only retrievals are ever stored in or served from a named cache.
    pub fn is_cacheable(&self) -> bool {
        self.method == "GET"
    }

    pub fn key(&self) -> RequestKey {
        RequestKey { method: self.method.clone(), url: self.url.clone() }
    }
}

/// Identity of a cache entry: method plus absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: "GET".into(), url: url.into() }
    }

    /// Store-level key: hex SHA-256 over method and URL.
    pub fn hash(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }

    /// Reject keys that may not be cached.
    pub fn ensure_cacheable(&self) -> Result<(), Error> {
        if self.method == "GET" {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!("{} requests are never cached: {}", self.method, self.url)))
        }
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Immutable snapshot of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl ResponseSnapshot {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// The literal returned when neither the network nor any cache can answer.
    pub fn offline() -> Self {
        Self::new(503, vec![("content-type".into(), "text/plain; charset=utf-8".into())], Bytes::from_static(b"Offline"))
    }

    /// Minimal inline image served for images that cannot be fetched.
    pub fn image_placeholder() -> Self {
        Self::new(
            200,
            vec![("content-type".into(), "image/svg+xml".into())],
            Bytes::from_static(br#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"/>"#),
        )
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_parse() {
        assert_eq!(Destination::parse("IMAGE"), Destination::Image);
        assert_eq!(Destination::parse("style"), Destination::Style);
        assert_eq!(Destination::parse(""), Destination::Empty);
        assert_eq!(Destination::parse("font"), Destination::Other("font".into()));
        assert_eq!(Destination::parse("font").as_str(), "font");
    }

    #[test]
    fn test_only_get_is_cacheable() {
        let get = Request::get("https://example.com/a.js", Destination::Script);
        assert!(get.is_cacheable());
        assert!(get.key().ensure_cacheable().is_ok());

        let post = get.with_method("post");
        assert_eq!(post.method, "POST");
        assert!(!post.is_cacheable());
        assert!(matches!(post.key().ensure_cacheable(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_key_hash_depends_on_method() {
        let get = RequestKey::get("https://example.com/");
        let head = RequestKey { method: "HEAD".into(), url: "https://example.com/".into() };
        assert_ne!(get.hash(), head.hash());
        assert_eq!(get.to_string(), "GET https://example.com/");
    }

    #[test]
    fn test_offline_and_placeholder() {
        let offline = ResponseSnapshot::offline();
        assert_eq!(offline.status, 503);
        assert_eq!(&offline.body[..], b"Offline");
        assert!(!offline.is_ok());

        let placeholder = ResponseSnapshot::image_placeholder();
        assert!(placeholder.is_ok());
        assert_eq!(placeholder.content_type(), Some("image/svg+xml"));
        assert_eq!(placeholder.header("Content-Type"), Some("image/svg+xml"));
    }
}
