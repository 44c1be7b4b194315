//! JSON-RPC ledger reader with timeout and failover.
//!
//! # Responsibilities
//! - Connect to the primary JSON-RPC endpoint plus any failovers
//! - Read the escrow contract (`projectCount`, `getProject`)
//! - Handle timeouts and network errors gracefully
//! - Provide health check for ledger connectivity

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LedgerConfig;
use crate::error::{EngineError, EngineResult};
use crate::jobs::types::ProjectRecord;
use crate::ledger::contract;
use crate::ledger::reader::LedgerReader;
use crate::ledger::types::ChainId;
use crate::observability::metrics;

/// Escrow ledger reader over one or more RPC providers.
#[derive(Clone)]
pub struct RpcLedger {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Escrow contract address.
    escrow: Address,
    config: LedgerConfig,
    timeout_duration: Duration,
}

impl RpcLedger {
    /// Build a reader without touching the network.
    pub fn new(config: LedgerConfig) -> EngineResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            EngineError::ledger_call(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(
            Arc::new(ProviderBuilder::new().connect_http(primary_url)) as Arc<dyn Provider + Send + Sync>
        );

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(
                    Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>
                );
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let escrow: Address = config.escrow_address.parse().map_err(|e| {
            EngineError::ledger_call(format!(
                "Invalid escrow address '{}': {}",
                config.escrow_address, e
            ))
        })?;

        Ok(Self {
            providers,
            escrow,
            config,
            timeout_duration,
        })
    }

    /// Build a reader and report (without failing) whether the network is reachable.
    pub async fn connect(config: LedgerConfig) -> EngineResult<Self> {
        let ledger = Self::new(config)?;

        match ledger.chain_id().await {
            Ok(chain_id) => {
                tracing::info!(
                    rpc_url = %ledger.config.rpc_url,
                    chain_id = %chain_id,
                    escrow = %ledger.escrow,
                    "Ledger reader initialized"
                );
            }
            Err(e) => {
                // The network guard rejects each operation; startup stays usable.
                tracing::warn!(error = %e, "Ledger reader initialized but RPC is unreachable");
            }
        }

        Ok(ledger)
    }

    /// Read-only call against the escrow contract.
    async fn call_escrow(&self, input: Bytes) -> Result<Bytes, String> {
        let tx = TransactionRequest::default()
            .with_to(self.escrow)
            .with_input(input);

        let mut last_error = String::from("no providers configured");
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.call(tx.clone()).into_future();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                    last_error = e.to_string();
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                    last_error = format!("timeout after {} seconds", self.config.rpc_timeout_secs);
                }
            }
        }
        Err(format!("All RPC providers failed: {}", last_error))
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> EngineResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_block_number();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(provider_idx = i, "RPC timeout"),
            }
        }
        Err(EngineError::ledger_call("All providers failed to get block number"))
    }

    /// Check if the ledger is reachable.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_block_number().await.is_ok();
        metrics::record_ledger_health(healthy);
        healthy
    }

    pub fn escrow(&self) -> Address {
        self.escrow
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

#[async_trait]
impl LedgerReader for RpcLedger {
    async fn chain_id(&self) -> EngineResult<ChainId> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_chain_id();
            match timeout(self.timeout_duration, fut).await {
                Ok(Ok(result)) => return Ok(ChainId(result)),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(EngineError::ledger_call("All RPC providers failed to report chain ID"))
    }

    async fn count(&self) -> EngineResult<u64> {
        let output = self
            .call_escrow(contract::encode_count())
            .await
            .map_err(EngineError::ledger_call)?;
        contract::decode_count(&output)
    }

    async fn get(&self, project_id: u64) -> EngineResult<ProjectRecord> {
        let output = self
            .call_escrow(contract::encode_get(project_id))
            .await
            .map_err(|reason| EngineError::ledger(project_id, reason))?;
        contract::decode_get(project_id, &output)
    }
}

impl std::fmt::Debug for RpcLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLedger")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("escrow", &self.escrow)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
