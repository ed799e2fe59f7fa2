//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check downstream definitions (unique names, absolute http(s) hosts)
//! - Validate value ranges (timeouts > 0, connect timeout within request timeout)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("client.timeout_secs must be greater than 0")]
    ZeroTimeout,

    #[error("client.connect_timeout_secs must be greater than 0")]
    ZeroConnectTimeout,

    #[error("client.connect_timeout_secs ({connect}) exceeds client.timeout_secs ({total})")]
    ConnectExceedsTotal { connect: u64, total: u64 },

    #[error("downstream #{0} has an empty name")]
    EmptyDownstreamName(usize),

    #[error("downstream '{0}' is defined more than once")]
    DuplicateDownstream(String),

    #[error("downstream '{name}' has an invalid host '{host}': {reason}")]
    InvalidHost {
        name: String,
        host: String,
        reason: String,
    },

    #[error("downstream '{0}' has timeout_secs = 0")]
    ZeroDownstreamTimeout(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let client = &config.client;
    if client.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if client.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }
    if client.timeout_secs > 0 && client.connect_timeout_secs > client.timeout_secs {
        errors.push(ValidationError::ConnectExceedsTotal {
            connect: client.connect_timeout_secs,
            total: client.timeout_secs,
        });
    }

    let mut seen = HashSet::new();
    for (i, downstream) in config.downstreams.iter().enumerate() {
        if downstream.name.trim().is_empty() {
            errors.push(ValidationError::EmptyDownstreamName(i));
        } else if !seen.insert(downstream.name.as_str()) {
            errors.push(ValidationError::DuplicateDownstream(downstream.name.clone()));
        }

        if let Err(reason) = check_host(&downstream.host) {
            errors.push(ValidationError::InvalidHost {
                name: downstream.name.clone(),
                host: downstream.host.clone(),
                reason,
            });
        }

        if downstream.timeout_secs == Some(0) {
            errors.push(ValidationError::ZeroDownstreamTimeout(downstream.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_host(host: &str) -> Result<(), String> {
    let url = Url::parse(host).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}
