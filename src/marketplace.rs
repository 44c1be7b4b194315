//! Marketplace workflows composed from the engine components.
//!
//! Posting a job publishes its metadata first and only then escrows funds;
//! if publishing fails nothing is written to the ledger. Saving a profile
//! publishes the profile document and returns its CID. Both check the
//! signer's network before anything is published.

use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::EngineConfig;
use crate::content::{ContentResolver, ContentStore};
use crate::error::{EngineError, EngineResult};
use crate::jobs::sync::JobSynchronizer;
use crate::jobs::types::{JobMetadata, ProfilePayload};
use crate::ledger::guard::NetworkGuard;
use crate::ledger::reader::LedgerReader;
use crate::ledger::transaction::TransactionSubmitter;
use crate::wallet::signer::WalletSigner;

/// Job as entered by a client, before validation.
#[derive(Debug, Clone, Default)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    /// Decimal ether amount, e.g. "0.25". Becomes the escrowed value.
    pub budget: String,
    /// Unix seconds.
    pub deadline: u64,
    pub freelancer: Option<Address>,
}

/// Profile as entered by a user, before validation.
#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
    pub name: String,
    pub age: String,
    pub email: String,
    /// Comma-separated.
    pub skills: String,
}

/// Result of a successful job post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedJob {
    /// `None` when the escrow was confirmed but its id could not be read.
    pub project_id: Option<u64>,
    pub description_cid: String,
    pub amount: U256,
    pub tx_hash: TxHash,
}

/// Result of a successful approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub project_id: u64,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Entry point wiring ledger, content store and wallet together.
#[derive(Clone)]
pub struct Marketplace {
    signer: Arc<dyn WalletSigner>,
    resolver: ContentResolver,
    synchronizer: JobSynchronizer,
    submitter: TransactionSubmitter,
}

impl Marketplace {
    pub fn new(
        ledger: Arc<dyn LedgerReader>,
        store: Arc<dyn ContentStore>,
        signer: Arc<dyn WalletSigner>,
        config: &EngineConfig,
    ) -> EngineResult<Self> {
        let escrow: Address = config.ledger.escrow_address.parse().map_err(|e| {
            EngineError::Validation(format!(
                "invalid escrow address '{}': {}",
                config.ledger.escrow_address, e
            ))
        })?;

        let resolver = ContentResolver::new(store, config.content.cache_enabled);
        let synchronizer = JobSynchronizer::new(
            Arc::clone(&ledger),
            resolver.clone(),
            NetworkGuard::new(config.ledger.chain_id),
            config.sync.max_concurrent_fetches,
        );
        let submitter =
            TransactionSubmitter::new(Arc::clone(&signer), ledger, synchronizer.clone(), escrow);

        Ok(Self {
            signer,
            resolver,
            synchronizer,
            submitter,
        })
    }

    pub fn synchronizer(&self) -> &JobSynchronizer {
        &self.synchronizer
    }

    pub fn submitter(&self) -> &TransactionSubmitter {
        &self.submitter
    }

    pub fn resolver(&self) -> &ContentResolver {
        &self.resolver
    }

    /// First account the signer is connected to, if any.
    pub async fn active_account(&self) -> EngineResult<Option<Address>> {
        Ok(self.signer.request_accounts().await?.into_iter().next())
    }

    /// Publish job metadata, then escrow the budget in a new project.
    pub async fn post_job(&self, account: Option<Address>, draft: JobDraft) -> EngineResult<PostedJob> {
        let amount = validate_job(&draft)?;
        let client = account.ok_or(EngineError::NoActiveAccount)?;
        self.submitter.check_network().await?;

        let metadata = JobMetadata {
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            budget: draft.budget.trim().to_string(),
            deadline: Some(draft.deadline.to_string()),
            client: Some(client.to_string()),
            timestamp: Some(now_millis()),
        };
        let description_cid = self.resolver.publish("job.json", &metadata).await?;

        let created = self
            .submitter
            .create_project(
                Some(client),
                draft.freelancer.unwrap_or(Address::ZERO),
                &description_cid,
                draft.deadline,
                amount,
            )
            .await?;

        Ok(PostedJob {
            project_id: created.project_id,
            description_cid,
            amount,
            tx_hash: created.tx_hash,
        })
    }

    /// Approve the submitted work on `project_id`.
    pub async fn approve_work(&self, account: Option<Address>, project_id: u64) -> EngineResult<Approval> {
        let receipt = self.submitter.approve_work(account, project_id).await?;
        Ok(Approval {
            project_id,
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
        })
    }

    /// Publish a profile document and return its CID.
    pub async fn save_profile(&self, account: Option<Address>, draft: ProfileDraft) -> EngineResult<String> {
        let account = account.ok_or(EngineError::NoActiveAccount)?;
        let profile = validate_profile(account, &draft)?;
        self.submitter.check_network().await?;
        self.resolver.publish("profile.json", &profile).await
    }
}

impl std::fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("synchronizer", &self.synchronizer)
            .field("submitter", &self.submitter)
            .finish()
    }
}

/// Check a job draft and return the amount to escrow in wei.
fn validate_job(draft: &JobDraft) -> EngineResult<U256> {
    if draft.title.trim().is_empty() {
        return Err(EngineError::Validation("title is required".to_string()));
    }
    if draft.description.trim().is_empty() {
        return Err(EngineError::Validation("description is required".to_string()));
    }
    if draft.deadline == 0 {
        return Err(EngineError::Validation("deadline is required".to_string()));
    }
    parse_ether(draft.budget.trim()).map_err(|e| {
        EngineError::Validation(format!(
            "budget '{}' is not a decimal ether amount: {}",
            draft.budget, e
        ))
    })
}

fn validate_profile(account: Address, draft: &ProfileDraft) -> EngineResult<ProfilePayload> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(EngineError::Validation("name is required".to_string()));
    }
    let email = draft.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(EngineError::Validation(format!("invalid email '{}'", email)));
    }
    let age: u32 = draft
        .age
        .trim()
        .parse()
        .map_err(|_| EngineError::Validation(format!("age '{}' is not a number", draft.age)))?;
    let skills = draft
        .skills
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    Ok(ProfilePayload {
        name: name.to_string(),
        age,
        email: email.to_string(),
        skills,
        account,
        timestamp: now_millis(),
    })
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
