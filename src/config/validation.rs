//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that configured addresses and URLs parse
//! - Validate value ranges (timeouts > 0, confirmations > 0)
//!
//! Returns all validation errors, not just the first.

use alloy::primitives::Address;
use url::Url;

use crate::config::schema::ConnectorSettings;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate settings loaded from a file.
pub fn validate_config(config: &ConnectorSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let network = &config.network;

    if let Some(url) = network.network_url.as_deref().filter(|u| !u.is_empty()) {
        if let Err(e) = url.parse::<Url>() {
            errors.push(ValidationError::new("network.network_url", format!("invalid URL '{}': {}", url, e)));
        }
    }

    if let Some(address) = network.contract_address.as_deref().filter(|a| !a.is_empty()) {
        if let Err(e) = address.parse::<Address>() {
            errors.push(ValidationError::new(
                "network.contract_address",
                format!("invalid address '{}': {}", address, e),
            ));
        }
    }

    if network.artifacts_dir.trim().is_empty() {
        errors.push(ValidationError::new("network.artifacts_dir", "must not be empty"));
    }

    if network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be greater than 0"));
    }

    if network.confirmation_blocks == 0 {
        errors.push(ValidationError::new("network.confirmation_blocks", "must be at least 1"));
    }

    if network.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "network.confirmation_timeout_secs",
            "must be greater than 0",
        ));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
