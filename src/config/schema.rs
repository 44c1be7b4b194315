//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the engine.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the marketplace engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Ledger (escrow contract) connection settings.
    pub ledger: LedgerConfig,

    /// Content store settings.
    pub content: ContentConfig,

    /// Synchronization pass settings.
    pub sync: SyncConfig,

    /// Read-only JSON API settings.
    pub api: ApiConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ledger integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// The only chain ID this deployment accepts (296 = Hedera testnet).
    pub chain_id: u64,

    /// Address of the escrow contract holding project records.
    pub escrow_address: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations required before a write counts as done.
    pub confirmation_blocks: u64,

    /// Gas price multiplier (1.0 = estimated, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://testnet.hashio.io/api".to_string(),
            failover_urls: Vec::new(),
            chain_id: 296,
            escrow_address: "0xea7098b8cc404e423630edb1f4726d366b4afdae".to_string(),
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            gas_price_multiplier: 1.2,
            max_gas_price_gwei: 5000,
        }
    }
}

/// Content store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Gateway used to read payloads (`{gateway_url}/ipfs/{cid}`).
    pub gateway_url: String,

    /// Upload endpoint used to publish payloads.
    pub upload_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Cache resolved metadata by CID.
    pub cache_enabled: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            gateway_url: "https://w3s.link".to_string(),
            upload_url: "https://api.web3.storage/upload".to_string(),
            timeout_secs: 15,
            cache_enabled: true,
        }
    }
}

/// Synchronization pass configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum number of records fetched and resolved at once.
    pub max_concurrent_fetches: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
        }
    }
}

/// JSON API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address (e.g., "127.0.0.1:8787").
    pub bind_address: String,

    /// Whole-request timeout in seconds. A sync pass must fit inside it.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8787".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.ledger.chain_id, 296);
        assert_eq!(config.ledger.rpc_timeout_secs, 10);
        assert_eq!(config.sync.max_concurrent_fetches, 8);
        assert!(config.content.cache_enabled);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [ledger]
            chain_id = 31337
            rpc_url = "http://localhost:8545"

            [sync]
            max_concurrent_fetches = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.ledger.chain_id, 31337);
        assert_eq!(config.ledger.confirmation_blocks, 1);
        assert_eq!(config.sync.max_concurrent_fetches, 2);
        assert_eq!(config.content.gateway_url, "https://w3s.link");
        assert_eq!(config.observability.log_level, "info");
    }
}
