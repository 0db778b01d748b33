//! Configuration validation.
//!
//! # Responsibilities
//! - Normalize and check the replay target host
//! - Check the log source can be started (non-empty command)
//! - Validate value ranges and addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: &ReplayConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ReplayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("target host is empty")]
    EmptyTarget,

    #[error("target host {0:?} is not a valid host[:port]")]
    InvalidTarget(String),

    #[error("source command is empty")]
    EmptyCommand,

    #[error("metrics address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("pool_max_idle_per_host must be greater than zero")]
    ZeroIdlePool,
}

/// Trim whitespace and any trailing slashes from a target host argument.
pub fn normalize_target(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn check_target(target: &str) -> Result<(), ValidationError> {
    if target.is_empty() {
        return Err(ValidationError::EmptyTarget);
    }
    let invalid = || ValidationError::InvalidTarget(target.to_string());
    let url = Url::parse(&format!("http://{}/", target)).map_err(|_| invalid())?;
    let only_host = url.path() == "/"
        && url.query().is_none()
        && url.username().is_empty()
        && url.host_str().is_some_and(|h| !h.is_empty());
    if only_host {
        Ok(())
    } else {
        Err(invalid())
    }
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &ReplayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = check_target(&config.target) {
        errors.push(e);
    }

    if !config.source.stdin && config.source.command.trim().is_empty() {
        errors.push(ValidationError::EmptyCommand);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.client.pool_max_idle_per_host == 0 {
        errors.push(ValidationError::ZeroIdlePool);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
