//! Escrow contract ABI and conversions into engine types.

use alloy::primitives::{Address, Bytes, Log, U256};
use alloy::sol;
use alloy::sol_types::{SolCall, SolEvent};

use crate::error::{EngineError, EngineResult};
use crate::jobs::types::{ProjectRecord, ProjectStatus};

sol! {
    /// Escrow contract holding marketplace projects.
    #[derive(Debug)]
    interface SimpleEscrow {
        struct Project {
            address client;
            address freelancer;
            uint256 amount;
            string descriptionCID;
            string deliverableCID;
            uint8 status;
            uint256 createdAt;
            uint256 deadline;
        }

        /// Emitted when a client escrows funds for a new project.
        event ProjectCreated(
            uint256 indexed projectId,
            address indexed client,
            address indexed freelancer,
            uint256 amount,
            string descriptionCID,
            uint256 deadline
        );

        function projectCount() external view returns (uint256);
        function getProject(uint256 projectId) external view returns (Project memory);
        function createProject(address freelancer, string calldata descriptionCID, uint256 deadline) external payable returns (uint256);
        function approveWork(uint256 projectId) external;
    }
}

/// Calldata for `projectCount()`.
pub fn encode_count() -> Bytes {
    SimpleEscrow::projectCountCall {}.abi_encode().into()
}

/// Calldata for `getProject(id)`.
pub fn encode_get(project_id: u64) -> Bytes {
    SimpleEscrow::getProjectCall {
        projectId: U256::from(project_id),
    }
    .abi_encode()
    .into()
}

/// Calldata for `createProject(freelancer, cid, deadline)`.
pub fn encode_create(freelancer: Address, description_cid: &str, deadline: u64) -> Bytes {
    SimpleEscrow::createProjectCall {
        freelancer,
        descriptionCID: description_cid.to_string(),
        deadline: U256::from(deadline),
    }
    .abi_encode()
    .into()
}

/// Calldata for `approveWork(id)`.
pub fn encode_approve(project_id: u64) -> Bytes {
    SimpleEscrow::approveWorkCall {
        projectId: U256::from(project_id),
    }
    .abi_encode()
    .into()
}

/// Project id announced by a `ProjectCreated` log from `escrow`, if any.
pub fn created_project_id(escrow: Address, logs: &[Log]) -> Option<u64> {
    logs.iter()
        .filter(|log| log.address == escrow)
        .filter_map(|log| SimpleEscrow::ProjectCreated::decode_log_data(&log.data).ok())
        .find_map(|event| u64::try_from(event.projectId).ok())
}

pub fn decode_count(data: &[u8]) -> EngineResult<u64> {
    let count = SimpleEscrow::projectCountCall::abi_decode_returns(data)
        .map_err(|e| EngineError::ledger_call(format!("malformed projectCount result: {}", e)))?;
    to_u64(count, "projectCount")
}

pub fn decode_get(project_id: u64, data: &[u8]) -> EngineResult<ProjectRecord> {
    let project = SimpleEscrow::getProjectCall::abi_decode_returns(data)
        .map_err(|e| EngineError::ledger(project_id, format!("malformed getProject result: {}", e)))?;
    into_record(project_id, project)
}

/// Convert an ABI project into a [`ProjectRecord`].
pub fn into_record(project_id: u64, project: SimpleEscrow::Project) -> EngineResult<ProjectRecord> {
    let status = ProjectStatus::try_from(project.status)
        .map_err(|e| EngineError::ledger(project_id, e.to_string()))?;

    Ok(ProjectRecord {
        project_id,
        client: project.client,
        freelancer: project.freelancer,
        amount: project.amount,
        description_cid: project.descriptionCID,
        deliverable_cid: project.deliverableCID,
        status,
        created_at: to_u64(project.createdAt, "createdAt")
            .map_err(|e| EngineError::ledger(project_id, e.to_string()))?,
        deadline: to_u64(project.deadline, "deadline")
            .map_err(|e| EngineError::ledger(project_id, e.to_string()))?,
    })
}

/// Convert an engine record back into its ABI form.
pub fn from_record(record: &ProjectRecord) -> SimpleEscrow::Project {
    SimpleEscrow::Project {
        client: record.client,
        freelancer: record.freelancer,
        amount: record.amount,
        descriptionCID: record.description_cid.clone(),
        deliverableCID: record.deliverable_cid.clone(),
        status: record.status.into(),
        createdAt: U256::from(record.created_at),
        deadline: U256::from(record.deadline),
    }
}

fn to_u64(value: U256, field: &str) -> EngineResult<u64> {
    u64::try_from(value)
        .map_err(|_| EngineError::ledger_call(format!("{} does not fit in u64: {}", field, value)))
}
