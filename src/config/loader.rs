//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ClientConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the server domain for both the live and REST endpoints.
pub const ENV_SERVER_DOMAIN: &str = "POLL_LIVE_SERVER_DOMAIN";
/// Overrides the server port for both the live and REST endpoints.
pub const ENV_SERVER_PORT: &str = "POLL_LIVE_SERVER_PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// A missing file yields the defaults. Environment overrides are applied
/// before validation.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    load_config_with_overrides(
        path,
        std::env::var(ENV_SERVER_DOMAIN).ok().as_deref(),
        std::env::var(ENV_SERVER_PORT).ok().as_deref(),
    )
}

/// [`load_config`] with explicit domain/port overrides instead of the
/// process environment.
pub fn load_config_with_overrides(
    path: &Path,
    domain: Option<&str>,
    port: Option<&str>,
) -> Result<ClientConfig, ConfigError> {
    let mut config = if path.exists() {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)?
    } else {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        ClientConfig::default()
    };

    apply_env_overrides(&mut config, domain, port);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Rewrite server locations from a domain and/or port override.
///
/// Both the live host and the API base URL follow the override, so the two
/// never point at different servers.
pub fn apply_env_overrides(config: &mut ClientConfig, domain: Option<&str>, port: Option<&str>) {
    if domain.is_none() && port.is_none() {
        return;
    }

    let (current_domain, current_port) = split_host(&config.server.host);
    let domain = domain.unwrap_or(current_domain).to_string();
    let port = port.map(str::to_string).or(current_port.map(str::to_string));

    let authority = match port {
        Some(port) => format!("{}:{}", domain, port),
        None => domain,
    };

    tracing::info!(authority = %authority, "Applying server override from environment");

    let api_scheme = if config.server.api_base_url.starts_with("https://") {
        "https"
    } else {
        "http"
    };
    config.server.host = authority.clone();
    config.server.api_base_url = format!("{}://{}", api_scheme, authority);
}

fn split_host(host: &str) -> (&str, Option<&str>) {
    match host.rsplit_once(':') {
        Some((domain, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
            (domain, Some(port))
        }
        _ => (host, None),
    }
}
