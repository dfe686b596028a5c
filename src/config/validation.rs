//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and that the
//! server locations can actually be turned into URLs. All errors are
//! collected, not just the first.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ClientConfig;
use crate::net::endpoint::EndpointResolver;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.host '{0}' is not a valid host[:port]")]
    InvalidHost(String),

    #[error("server.api_base_url '{0}' is not an http(s) URL")]
    InvalidApiUrl(String),

    #[error("{field} must be at least 1")]
    ZeroValue { field: &'static str },

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if EndpointResolver::new(&config.server.host).is_err() {
        errors.push(ValidationError::InvalidHost(config.server.host.clone()));
    }

    match Url::parse(&config.server.api_base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {}
        _ => errors.push(ValidationError::InvalidApiUrl(
            config.server.api_base_url.clone(),
        )),
    }

    if config.reconnect.max_attempts == 0 {
        errors.push(ValidationError::ZeroValue { field: "reconnect.max_attempts" });
    }
    if config.reconnect.base_delay_ms == 0 {
        errors.push(ValidationError::ZeroValue { field: "reconnect.base_delay_ms" });
    }
    if config.reconnect.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "reconnect.connect_timeout_secs" });
    }
    if config.api.timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "api.timeout_secs" });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
