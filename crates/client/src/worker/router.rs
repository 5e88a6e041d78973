//! Request classification.
//!
//! Every intercepted request is either passed straight to the network
//! untouched or routed to one of four resource kinds, each served by its own
//! strategy.

use serde::Serialize;
use url::Url;

use crate::fetch::{parse_origin, same_origin};
use shelter_core::{CacheConfiguration, Destination, Error, Request};

/// What an intercepted request is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Image,
    Document,
    ScriptOrStyle,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The worker does not answer; the request goes out as if unintercepted.
    PassThrough,
    Intercept(ResourceKind),
}

#[derive(Debug, Clone)]
pub struct RequestRouter {
    origin: Url,
    excluded_paths: Vec<String>,
}

impl RequestRouter {
    pub fn new(config: &CacheConfiguration) -> Result<Self, Error> {
        let origin = parse_origin(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        Ok(Self { origin, excluded_paths: config.excluded_paths.clone() })
    }

    /// Decide how a request is handled.
    ///
    /// Cross-origin requests, unparseable URLs and paths containing an
    /// excluded substring pass through. Everything else is classified by its
    /// destination.
    pub fn classify(&self, request: &Request) -> Route {
        let Ok(url) = Url::parse(&request.url) else {
            return Route::PassThrough;
        };

        if !same_origin(&url, &self.origin) {
            return Route::PassThrough;
        }

        if self.excluded_paths.iter().any(|p| !p.is_empty() && url.path().contains(p.as_str())) {
            return Route::PassThrough;
        }

        let kind = match request.destination {
            Destination::Image => ResourceKind::Image,
            Destination::Document => ResourceKind::Document,
            Destination::Script | Destination::Style => ResourceKind::ScriptOrStyle,
            Destination::Empty | Destination::Other(_) => ResourceKind::Other,
        };
        Route::Intercept(kind)
    }
}
