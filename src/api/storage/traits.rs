//! Storage trait definitions for the API storage backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::StorageError;
use super::rows::{FlowDetailFields, FlowFields, UseCaseFields, UseCaseRecord};
use crate::models::RecordId;

/// Caller identity for mutating operations
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    /// Owner identity stored on every document the caller creates
    pub user_id: String,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Storage backend trait for database operations.
///
/// Reads are independent and never observe a half-applied transaction.
/// Every write goes through a [`StorageTransaction`].
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Get a live (not soft-deleted) use case with its flows and details
    async fn find_use_case(&self, id: RecordId) -> Result<Option<UseCaseRecord>, StorageError>;

    /// First live use case, by id, whose name contains `name` case-insensitively
    async fn find_use_case_by_name(
        &self,
        name: &str,
    ) -> Result<Option<UseCaseRecord>, StorageError>;

    /// All live use cases ordered by id
    async fn list_use_cases(&self) -> Result<Vec<UseCaseRecord>, StorageError>;

    /// Open a transaction; dropping it without `commit` discards every write
    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StorageError>;
}

/// Write primitives scoped to one atomic unit of work.
#[async_trait]
pub trait StorageTransaction: Send {
    /// Lock a live use case owned by `owner`; `None` if absent or owned by someone else
    async fn lock_owned_use_case(
        &mut self,
        id: RecordId,
        owner: &UserContext,
    ) -> Result<Option<RecordId>, StorageError>;

    /// Insert a root row and return its generated id
    async fn insert_use_case(
        &mut self,
        owner: &UserContext,
        fields: &UseCaseFields,
    ) -> Result<RecordId, StorageError>;

    /// Replace every scalar and multi-value column of a root row
    async fn update_use_case(
        &mut self,
        id: RecordId,
        fields: &UseCaseFields,
    ) -> Result<(), StorageError>;

    /// Insert a flow row under `use_case_id` and return its generated id
    async fn insert_flow(
        &mut self,
        use_case_id: RecordId,
        fields: &FlowFields,
    ) -> Result<RecordId, StorageError>;

    /// Insert a detail row under `flow_id` and return its generated id
    async fn insert_flow_detail(
        &mut self,
        flow_id: RecordId,
        fields: &FlowDetailFields,
    ) -> Result<RecordId, StorageError>;

    /// Delete every detail of every flow of `use_case_id`
    async fn delete_flow_details(&mut self, use_case_id: RecordId) -> Result<u64, StorageError>;

    /// Delete every flow of `use_case_id`, cascading to their details
    async fn delete_flows(&mut self, use_case_id: RecordId) -> Result<u64, StorageError>;

    /// Overwrite the stored status, including the terminal `deleted` marker
    async fn set_status(&mut self, id: RecordId, status: &str) -> Result<(), StorageError>;

    /// Delete the root row
    async fn delete_use_case(&mut self, id: RecordId) -> Result<(), StorageError>;

    /// Make every write of this transaction visible
    async fn commit(self: Box<Self>) -> Result<(), StorageError>;
}
