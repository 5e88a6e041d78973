//! URL resolution against the worker's origin.
//!
//! Every URL the worker stores or looks up goes through [`resolve`] so cache
//! keys are stable: root-relative paths become absolute, hosts are lowercased
//! and fragments are dropped.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse the configured origin.
pub fn parse_origin(origin: &str) -> Result<Url, UrlError> {
    let trimmed = origin.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }
    let parsed = Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

/// Resolve an absolute or root-relative URL against `base`.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Join relative references onto `base`
/// 3. Lowercase the host (done by the parser for http/https)
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn resolve(base: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
