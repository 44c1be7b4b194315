//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs, addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::Address;
use std::net::SocketAddr;

use crate::config::schema::EngineConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g. `ledger.rpc_url`).
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let ledger = &config.ledger;
    check_url(&mut errors, "ledger.rpc_url", &ledger.rpc_url);
    for (i, url) in ledger.failover_urls.iter().enumerate() {
        check_url(&mut errors, &format!("ledger.failover_urls[{}]", i), url);
    }
    if ledger.chain_id == 0 {
        errors.push(ValidationError::new("ledger.chain_id", "must be greater than 0"));
    }
    match ledger.escrow_address.parse::<Address>() {
        Ok(addr) if addr.is_zero() => {
            errors.push(ValidationError::new(
                "ledger.escrow_address",
                "must not be the zero address",
            ));
        }
        Ok(_) => {}
        Err(e) => {
            errors.push(ValidationError::new(
                "ledger.escrow_address",
                format!("invalid address: {}", e),
            ));
        }
    }
    if ledger.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "ledger.rpc_timeout_secs",
            "must be greater than 0",
        ));
    }
    if ledger.gas_price_multiplier < 1.0 {
        errors.push(ValidationError::new(
            "ledger.gas_price_multiplier",
            "must be at least 1.0",
        ));
    }

    check_url(&mut errors, "content.gateway_url", &config.content.gateway_url);
    check_url(&mut errors, "content.upload_url", &config.content.upload_url);
    if config.content.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "content.timeout_secs",
            "must be greater than 0",
        ));
    }

    let fetches = config.sync.max_concurrent_fetches;
    if !(1..=64).contains(&fetches) {
        errors.push(ValidationError::new(
            "sync.max_concurrent_fetches",
            format!("must be between 1 and 64, got {}", fetches),
        ));
    }

    check_socket_addr(&mut errors, "api.bind_address", &config.api.bind_address);
    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if let Err(e) = value.parse::<url::Url>() {
        errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e)));
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            field,
            format!("invalid socket address '{}'", value),
        ));
    }
}
