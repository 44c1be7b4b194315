//! Private-key wallet signer.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::LedgerConfig;
use crate::error::{EngineError, EngineResult};
use crate::ledger::types::ChainId;
use crate::wallet::signer::{TransactionIntent, TxReceipt, WalletSigner};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "HUMANWORK_WALLET_PRIVATE_KEY";

/// Wallet that signs with a local key and submits over JSON-RPC.
#[derive(Clone)]
pub struct LocalWallet {
    address: Address,
    /// Provider with the signing filler installed.
    provider: Arc<dyn Provider + Send + Sync>,
    config: LedgerConfig,
    timeout_duration: Duration,
}

impl LocalWallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Security
    /// The private key is parsed and stored securely. It is never logged.
    pub fn from_private_key(private_key_hex: &str, config: LedgerConfig) -> EngineResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex.parse().map_err(|e| {
            EngineError::Validation(format!("Invalid private key format: {}", e))
        })?;
        let address = signer.address();

        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            EngineError::ledger_call(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url);

        tracing::info!(
            address = %address,
            chain_id = config.chain_id,
            "Wallet initialized"
        );

        Ok(Self {
            address,
            provider: Arc::new(provider) as Arc<dyn Provider + Send + Sync>,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            config,
        })
    }

    /// Load wallet from environment variable.
    ///
    /// Reads `HUMANWORK_WALLET_PRIVATE_KEY` from environment.
    pub fn from_env(config: LedgerConfig) -> EngineResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            EngineError::Validation(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })?;

        Self::from_private_key(&private_key, config)
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Current gas price with the configured multiplier, bounded by the maximum.
    async fn gas_price(&self) -> EngineResult<u128> {
        let gas_price = match timeout(self.timeout_duration, self.provider.get_gas_price()).await {
            Ok(Ok(price)) => price,
            Ok(Err(e)) => return Err(EngineError::ledger_call(format!("gas price query failed: {}", e))),
            Err(_) => return Err(EngineError::ledger_call("gas price query timed out")),
        };
        let gas_price_gwei = gas_price / 1_000_000_000;

        if gas_price_gwei > self.config.max_gas_price_gwei as u128 {
            return Err(EngineError::TransactionRejected(format!(
                "gas price {} gwei exceeds maximum {} gwei",
                gas_price_gwei, self.config.max_gas_price_gwei
            )));
        }

        Ok((gas_price as f64 * self.config.gas_price_multiplier) as u128)
    }
}

#[async_trait]
impl WalletSigner for LocalWallet {
    async fn request_accounts(&self) -> EngineResult<Vec<Address>> {
        Ok(vec![self.address])
    }

    async fn chain_id(&self) -> EngineResult<ChainId> {
        match timeout(self.timeout_duration, self.provider.get_chain_id()).await {
            Ok(Ok(id)) => Ok(ChainId(id)),
            Ok(Err(e)) => Err(EngineError::ledger_call(format!("chain ID query failed: {}", e))),
            Err(_) => Err(EngineError::ledger_call("chain ID query timed out")),
        }
    }

    async fn send(&self, intent: TransactionIntent) -> EngineResult<TxReceipt> {
        if intent.from != self.address {
            return Err(EngineError::TransactionRejected(format!(
                "wallet {} cannot sign for {}",
                self.address, intent.from
            )));
        }

        let gas_price = self.gas_price().await?;
        let tx = TransactionRequest::default()
            .with_from(intent.from)
            .with_to(intent.to)
            .with_value(intent.value)
            .with_input(intent.input)
            .with_gas_price(gas_price);

        // Gas estimation happens here, so contract reverts surface as rejection.
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| EngineError::TransactionRejected(e.to_string()))?;
        let tx_hash = *pending.tx_hash();
        tracing::info!(tx_hash = %tx_hash, "Transaction sent, awaiting confirmation");

        let receipt = pending
            .with_required_confirmations(self.config.confirmation_blocks)
            .get_receipt()
            .await
            .map_err(|e| {
                EngineError::ledger_call(format!("confirmation of {} failed: {}", tx_hash, e))
            })?;

        Ok(TxReceipt {
            tx_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
            logs: receipt.inner.logs().iter().map(|log| log.inner.clone()).collect(),
        })
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .field("rpc_url", &self.config.rpc_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn config() -> LedgerConfig {
        LedgerConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            rpc_timeout_secs: 2,
            ..LedgerConfig::default()
        }
    }

    #[test]
    fn test_wallet_from_private_key() {
        let wallet = LocalWallet::from_private_key(TEST_PRIVATE_KEY, config()).unwrap();
        assert_eq!(
            wallet.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_wallet_with_0x_prefix() {
        let wallet =
            LocalWallet::from_private_key(&format!("0x{}", TEST_PRIVATE_KEY), config()).unwrap();
        assert_eq!(
            wallet.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_invalid_private_key() {
        let result = LocalWallet::from_private_key("invalid_key", config());
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));
    }

    #[tokio::test]
    async fn test_request_accounts_returns_own_address() {
        let wallet = LocalWallet::from_private_key(TEST_PRIVATE_KEY, config()).unwrap();
        assert_eq!(wallet.request_accounts().await.unwrap(), vec![wallet.address()]);
    }

    #[tokio::test]
    async fn test_refuses_foreign_account() {
        let wallet = LocalWallet::from_private_key(TEST_PRIVATE_KEY, config()).unwrap();
        let intent = TransactionIntent {
            from: Address::repeat_byte(0x42),
            to: Address::repeat_byte(0x01),
            value: Default::default(),
            input: Default::default(),
        };
        let err = wallet.send(intent).await.unwrap_err();
        assert!(matches!(err, EngineError::TransactionRejected(_)));
    }
}
