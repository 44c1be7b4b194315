//! In-process escrow ledger.
//!
//! Plays both sides of the ledger boundary: it serves reads like an RPC node
//! and accepts signed writes like the escrow contract, enforcing the same
//! preconditions. Used for local development and tests.

use alloy::primitives::{Address, Log, TxHash, B256, U256};
use alloy::sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{EngineError, EngineResult};
use crate::jobs::types::{ProjectRecord, ProjectStatus};
use crate::ledger::contract::SimpleEscrow;
use crate::ledger::reader::LedgerReader;
use crate::ledger::types::ChainId;
use crate::wallet::signer::{TransactionIntent, TxReceipt, WalletSigner};

#[derive(Debug, Default)]
struct State {
    projects: Vec<ProjectRecord>,
    accounts: Vec<Address>,
    unreadable: HashSet<u64>,
    decline_next: bool,
    block_number: u64,
}

/// Escrow ledger held in memory.
#[derive(Debug)]
pub struct InMemoryLedger {
    chain_id: AtomicU64,
    escrow: Address,
    state: Mutex<State>,
    /// Every read-side call, including chain ID queries.
    read_calls: AtomicU64,
    sent: AtomicU64,
}

impl InMemoryLedger {
    pub fn new(chain_id: u64, escrow: Address) -> Self {
        Self {
            chain_id: AtomicU64::new(chain_id),
            escrow,
            state: Mutex::new(State::default()),
            read_calls: AtomicU64::new(0),
            sent: AtomicU64::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn escrow(&self) -> Address {
        self.escrow
    }

    /// Switch the network this ledger reports.
    pub fn set_chain_id(&self, chain_id: u64) {
        self.chain_id.store(chain_id, Ordering::SeqCst);
    }

    /// Make `account` available to the signer side.
    pub fn connect_account(&self, account: Address) {
        let mut state = self.state();
        if !state.accounts.contains(&account) {
            state.accounts.push(account);
        }
    }

    pub fn disconnect_all(&self) {
        self.state().accounts.clear();
    }

    /// Append a record as-is, assigning the next project id. Returns the id.
    pub fn seed(&self, mut record: ProjectRecord) -> u64 {
        let mut state = self.state();
        let id = state.projects.len() as u64;
        record.project_id = id;
        state.projects.push(record);
        id
    }

    /// Ledger-side "work submitted" transition performed by a freelancer.
    pub fn submit_work(&self, project_id: u64, deliverable_cid: &str) -> EngineResult<()> {
        let mut state = self.state();
        let record = state
            .projects
            .get_mut(project_id as usize)
            .ok_or_else(|| EngineError::ledger(project_id, "project does not exist"))?;
        if !record.status.can_transition_to(ProjectStatus::WorkSubmitted) {
            return Err(EngineError::TransactionRejected(format!(
                "project {} is {}, work cannot be submitted",
                project_id, record.status
            )));
        }
        record.status = ProjectStatus::WorkSubmitted;
        record.deliverable_cid = deliverable_cid.to_string();
        Ok(())
    }

    /// Make `get(project_id)` fail until cleared.
    pub fn fail_reads_for(&self, project_id: u64) {
        self.state().unreadable.insert(project_id);
    }

    pub fn clear_read_failures(&self) {
        self.state().unreadable.clear();
    }

    /// The next `send` is declined as if the user refused to sign.
    pub fn decline_next_send(&self) {
        self.state().decline_next = true;
    }

    pub fn record(&self, project_id: u64) -> Option<ProjectRecord> {
        self.state().projects.get(project_id as usize).cloned()
    }

    pub fn read_calls(&self) -> u64 {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn sent_transactions(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }

    fn apply_create(
        &self,
        state: &mut State,
        from: Address,
        value: U256,
        call: SimpleEscrow::createProjectCall,
    ) -> EngineResult<Vec<Log>> {
        let deadline = u64::try_from(call.deadline)
            .map_err(|_| EngineError::TransactionRejected("execution reverted: deadline overflow".into()))?;
        let project_id = state.projects.len() as u64;
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        state.projects.push(ProjectRecord {
            project_id,
            client: from,
            freelancer: call.freelancer,
            amount: value,
            description_cid: call.descriptionCID.clone(),
            deliverable_cid: String::new(),
            status: ProjectStatus::Created,
            created_at,
            deadline,
        });

        let event = SimpleEscrow::ProjectCreated {
            projectId: U256::from(project_id),
            client: from,
            freelancer: call.freelancer,
            amount: value,
            descriptionCID: call.descriptionCID,
            deadline: call.deadline,
        };
        Ok(vec![Log {
            address: self.escrow,
            data: event.encode_log_data(),
        }])
    }

    fn apply_approve(
        &self,
        state: &mut State,
        from: Address,
        call: SimpleEscrow::approveWorkCall,
    ) -> EngineResult<Vec<Log>> {
        let project_id = u64::try_from(call.projectId).unwrap_or(u64::MAX);
        let record = state
            .projects
            .get_mut(project_id as usize)
            .ok_or_else(|| EngineError::TransactionRejected("execution reverted: no such project".into()))?;

        if record.client != from {
            return Err(EngineError::TransactionRejected(
                "execution reverted: only the client can approve".into(),
            ));
        }
        if !record.status.can_transition_to(ProjectStatus::Completed) {
            return Err(EngineError::TransactionRejected(format!(
                "execution reverted: project is {}, expected Work Submitted",
                record.status
            )));
        }
        record.status = ProjectStatus::Completed;
        Ok(Vec::new())
    }
}

#[async_trait]
impl LedgerReader for InMemoryLedger {
    async fn chain_id(&self) -> EngineResult<ChainId> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ChainId(self.chain_id.load(Ordering::SeqCst)))
    }

    async fn count(&self) -> EngineResult<u64> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state().projects.len() as u64)
    }

    async fn get(&self, project_id: u64) -> EngineResult<ProjectRecord> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if state.unreadable.contains(&project_id) {
            return Err(EngineError::ledger(project_id, "injected read failure"));
        }
        state
            .projects
            .get(project_id as usize)
            .cloned()
            .ok_or_else(|| EngineError::ledger(project_id, "execution reverted: no such project"))
    }
}

#[async_trait]
impl WalletSigner for InMemoryLedger {
    async fn request_accounts(&self) -> EngineResult<Vec<Address>> {
        Ok(self.state().accounts.clone())
    }

    async fn chain_id(&self) -> EngineResult<ChainId> {
        Ok(ChainId(self.chain_id.load(Ordering::SeqCst)))
    }

    async fn send(&self, intent: TransactionIntent) -> EngineResult<TxReceipt> {
        let mut state = self.state();

        if std::mem::take(&mut state.decline_next) {
            return Err(EngineError::TransactionRejected("user rejected the request".into()));
        }
        if !state.accounts.contains(&intent.from) {
            return Err(EngineError::TransactionRejected(format!(
                "signer does not control {}",
                intent.from
            )));
        }
        if intent.to != self.escrow {
            return Err(EngineError::TransactionRejected(format!(
                "unknown contract {}",
                intent.to
            )));
        }

        let logs = if let Ok(call) = SimpleEscrow::createProjectCall::abi_decode(&intent.input) {
            self.apply_create(&mut state, intent.from, intent.value, call)?
        } else if let Ok(call) = SimpleEscrow::approveWorkCall::abi_decode(&intent.input) {
            self.apply_approve(&mut state, intent.from, call)?
        } else {
            return Err(EngineError::TransactionRejected(
                "execution reverted: unknown function selector".into(),
            ));
        };

        state.block_number += 1;
        let nonce = self.sent.fetch_add(1, Ordering::SeqCst);

        Ok(TxReceipt {
            tx_hash: TxHash::from(B256::left_padding_from(&nonce.to_be_bytes())),
            block_number: Some(state.block_number),
            success: true,
            logs,
        })
    }
}
