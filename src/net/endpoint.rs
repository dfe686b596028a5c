//! Live endpoint derivation.
//!
//! A poll's live results endpoint is `{ws|wss}://{host}/polls/{pollId}/results`.
//! The encrypted scheme is chosen when the page hosting the results view was
//! itself loaded over `https`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Transport security of the page hosting the results view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageScheme {
    #[default]
    Http,
    Https,
}

impl PageScheme {
    /// Live connection scheme matching this page's transport security.
    pub fn live_scheme(self) -> &'static str {
        match self {
            PageScheme::Http => "ws",
            PageScheme::Https => "wss",
        }
    }
}

impl fmt::Display for PageScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageScheme::Http => write!(f, "http"),
            PageScheme::Https => write!(f, "https"),
        }
    }
}

/// The configured host cannot form a live endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid live host '{0}'")]
pub struct InvalidHost(pub String);

/// Derives live endpoints for a fixed host.
///
/// The host is checked once here so that [`EndpointResolver::resolve`] has no
/// failure mode.
#[derive(Debug, Clone)]
pub struct EndpointResolver {
    base: Url,
}

impl EndpointResolver {
    /// Build a resolver for `host` (`name` or `name:port`).
    pub fn new(host: &str) -> Result<Self, InvalidHost> {
        let base = Url::parse(&format!("ws://{}", host)).map_err(|_| InvalidHost(host.to_string()))?;

        let bare = base.host_str().is_some_and(|h| !h.is_empty())
            && base.path() == "/"
            && base.query().is_none()
            && base.fragment().is_none()
            && base.username().is_empty()
            && base.password().is_none();
        if !bare {
            return Err(InvalidHost(host.to_string()));
        }

        Ok(Self { base })
    }

    /// Live results endpoint for `poll_id` as seen from a page served over `scheme`.
    pub fn resolve(&self, scheme: PageScheme, poll_id: &str) -> Url {
        resolve_endpoint(&self.base, scheme, poll_id)
    }
}

fn resolve_endpoint(base: &Url, scheme: PageScheme, poll_id: &str) -> Url {
    let mut url = base.clone();
    // ws <-> wss only swaps between special schemes, which url always accepts.
    let _ = url.set_scheme(scheme.live_scheme());
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().extend(["polls", poll_id, "results"]);
    }

    tracing::debug!(poll_id = %poll_id, url = %url, "Resolved live results endpoint");
    url
}
