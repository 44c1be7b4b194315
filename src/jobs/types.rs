//! Job domain types: ledger records, off-ledger metadata and merged views.

use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, U256};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, EngineResult};

/// Text used for every metadata field that is missing or unresolvable.
pub const NOT_AVAILABLE: &str = "N/A";

/// Lifecycle of an escrowed project.
///
/// `Created --(work submitted)--> WorkSubmitted --(approveWork)--> Completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Created,
    WorkSubmitted,
    Completed,
}

impl ProjectStatus {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Created => "Created",
            ProjectStatus::WorkSubmitted => "Work Submitted",
            ProjectStatus::Completed => "Completed",
        }
    }

    /// Whether the ledger may move a record from `self` to `next`.
    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        matches!(
            (self, next),
            (ProjectStatus::Created, ProjectStatus::WorkSubmitted)
                | (ProjectStatus::WorkSubmitted, ProjectStatus::Completed)
        )
    }
}

impl TryFrom<u8> for ProjectStatus {
    type Error = EngineError;

    fn try_from(raw: u8) -> EngineResult<Self> {
        match raw {
            0 => Ok(ProjectStatus::Created),
            1 => Ok(ProjectStatus::WorkSubmitted),
            2 => Ok(ProjectStatus::Completed),
            other => Err(EngineError::ledger_call(format!(
                "unknown project status {}",
                other
            ))),
        }
    }
}

impl From<ProjectStatus> for u8 {
    fn from(status: ProjectStatus) -> Self {
        match status {
            ProjectStatus::Created => 0,
            ProjectStatus::WorkSubmitted => 1,
            ProjectStatus::Completed => 2,
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A project as held by the escrow contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub project_id: u64,
    pub client: Address,
    /// Zero until a freelancer is assigned.
    pub freelancer: Address,
    /// Escrowed value in wei.
    pub amount: U256,
    pub description_cid: String,
    /// Empty until work is submitted.
    pub deliverable_cid: String,
    pub status: ProjectStatus,
    pub created_at: u64,
    pub deadline: u64,
}

impl ProjectRecord {
    /// Case-insensitive by construction: addresses compare as bytes.
    pub fn is_client(&self, account: &Address) -> bool {
        self.client == *account
    }

    pub fn has_freelancer(&self) -> bool {
        !self.freelancer.is_zero()
    }
}

/// Job description published to the content store.
///
/// Every field has a default so a partial payload degrades predictably:
/// missing text fields read as `"N/A"`, missing extras as `None`. Text fields
/// also accept JSON numbers, since budgets were historically authored as both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMetadata {
    #[serde(default = "not_available", deserialize_with = "text")]
    pub title: String,
    #[serde(default = "not_available", deserialize_with = "text")]
    pub description: String,
    #[serde(default = "not_available", deserialize_with = "text")]
    pub budget: String,
    #[serde(
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub deadline: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub client: Option<String>,
    /// Authoring time in milliseconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl JobMetadata {
    /// Placeholder used when a record's metadata cannot be resolved.
    pub fn placeholder() -> Self {
        Self {
            title: NOT_AVAILABLE.to_string(),
            description: NOT_AVAILABLE.to_string(),
            budget: NOT_AVAILABLE.to_string(),
            deadline: None,
            client: None,
            timestamp: None,
        }
    }
}

impl Default for JobMetadata {
    fn default() -> Self {
        Self::placeholder()
    }
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(not_available()),
        other => Err(de::Error::custom(format!("expected text, found {}", other))),
    }
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Null => Ok(None),
        other => Err(de::Error::custom(format!("expected text, found {}", other))),
    }
}

/// User profile published to the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub name: String,
    pub age: u32,
    pub email: String,
    pub skills: Vec<String>,
    pub account: Address,
    /// Milliseconds since the epoch.
    pub timestamp: u64,
}

/// A ledger record merged with its resolved (or placeholder) metadata.
///
/// Derived and ephemeral: rebuilt on every synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub project_id: u64,
    pub client: Address,
    pub freelancer: Address,
    /// Ledger amount in wei.
    pub amount: U256,
    /// Ledger amount formatted in ether.
    pub amount_ether: String,
    pub description_cid: String,
    pub deliverable_cid: String,
    pub status: ProjectStatus,
    pub status_label: String,
    pub created_at: u64,
    pub deadline: u64,
    pub title: String,
    pub description: String,
    /// Off-ledger budget text; not reconciled with `amount`.
    pub budget: String,
    /// False when the fields above are placeholders.
    pub metadata_resolved: bool,
}

impl JobView {
    /// Merge a record with its metadata. `None` yields placeholder fields.
    pub fn merge(record: ProjectRecord, metadata: Option<JobMetadata>) -> Self {
        let metadata_resolved = metadata.is_some();
        let metadata = metadata.unwrap_or_else(JobMetadata::placeholder);

        Self {
            project_id: record.project_id,
            client: record.client,
            freelancer: record.freelancer,
            amount: record.amount,
            amount_ether: format_ether(record.amount),
            description_cid: record.description_cid,
            deliverable_cid: record.deliverable_cid,
            status: record.status,
            status_label: record.status.label().to_string(),
            created_at: record.created_at,
            deadline: record.deadline,
            title: metadata.title,
            description: metadata.description,
            budget: metadata.budget,
            metadata_resolved,
        }
    }

    /// Work can be approved only once it has been submitted.
    pub fn can_approve(&self) -> bool {
        self.status == ProjectStatus::WorkSubmitted
    }
}
