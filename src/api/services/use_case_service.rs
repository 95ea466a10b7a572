//! Use case service - the upsert procedure, deletion and the read queries.
//!
//! Every multi-row write runs inside one storage transaction. Storage and
//! transform failures are logged here and leave as coarse [`ServiceError`]s;
//! the low-level error never reaches the caller.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use super::transform::{to_document, write_plan};
use crate::models::enums::DELETED_STATUS;
use crate::models::{
    DeleteRequest, DeleteResponse, RecordId, SaveResponse, UpsertUseCase, UseCaseFull,
    UseCaseQuery, Validate, ValidationErrors,
};
use crate::storage::{
    StorageBackend, StorageError, StorageTransaction, UseCaseRecord, UserContext, WritePlan,
};

pub const CREATED_MESSAGE: &str = "Use case created successfully";
pub const UPDATED_MESSAGE: &str = "Use case updated successfully";
pub const DELETED_MESSAGE: &str = "Use case deleted successfully";
pub const NOT_FOUND_MESSAGE: &str = "Use case not found";

/// Coarse outcome kinds surfaced to callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// Schema rule violated; carries the field-path-indexed error tree
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    /// Identity absent, or not owned by the caller
    #[error("{0}")]
    NotFound(String),
    /// Identifier that cannot address a document
    #[error("{0}")]
    InvalidIdentifier(String),
    /// Storage failed unexpectedly; retryable
    #[error("{0}")]
    Persistence(String),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::InvalidIdentifier(_) => "invalid_identifier",
            ServiceError::Persistence(_) => "persistence",
        }
    }
}

/// Log a storage failure and replace it with a generic persistence error.
fn persistence(message: &'static str) -> impl Fn(StorageError) -> ServiceError {
    move |e| {
        error!("{}: {}", message, e);
        ServiceError::Persistence(message.to_string())
    }
}

/// Service implementing every use case operation over a storage backend.
#[derive(Clone)]
pub struct UseCaseService {
    storage: Arc<dyn StorageBackend>,
}

impl UseCaseService {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Create or fully replace a use case, dispatching on the submission tag.
    pub async fn save_use_case(
        &self,
        caller: &UserContext,
        input: UpsertUseCase,
    ) -> Result<SaveResponse, ServiceError> {
        if let Err(errors) = input.validate() {
            info!(
                "Rejected {} of '{}': {} invalid field(s)",
                input.kind(),
                input.name(),
                errors.len()
            );
            return Err(ServiceError::Validation(errors));
        }

        let fail = persistence("Failed to save use case");
        let mut tx = self.storage.begin().await.map_err(&fail)?;

        let (id, message) = match &input {
            UpsertUseCase::Create(doc) => {
                let plan = write_plan(doc);
                let id = tx
                    .insert_use_case(caller, &plan.root)
                    .await
                    .map_err(&fail)?;
                insert_children(&mut tx, id, &plan).await.map_err(&fail)?;
                (id, CREATED_MESSAGE)
            }
            UpsertUseCase::Update(doc) => {
                let owned = tx
                    .lock_owned_use_case(doc.id, caller)
                    .await
                    .map_err(&fail)?;
                let Some(id) = owned else {
                    warn!(
                        "Update of use case {} refused for {}: absent or not owned",
                        doc.id, caller.user_id
                    );
                    return Err(ServiceError::NotFound(
                        "Use case not found or you don't have permission to edit it".to_string(),
                    ));
                };
                let plan = write_plan(doc);
                tx.update_use_case(id, &plan.root).await.map_err(&fail)?;
                tx.delete_flows(id).await.map_err(&fail)?;
                insert_children(&mut tx, id, &plan).await.map_err(&fail)?;
                (id, UPDATED_MESSAGE)
            }
        };

        tx.commit().await.map_err(&fail)?;
        info!("Saved use case {} ({}) for {}", id, input.kind(), caller.user_id);

        Ok(SaveResponse {
            success: true,
            id,
            message: message.to_string(),
        })
    }

    /// Soft delete (status `deleted`) or hard delete (details, flows, root).
    pub async fn delete_use_case(
        &self,
        caller: &UserContext,
        request: DeleteRequest,
    ) -> Result<DeleteResponse, ServiceError> {
        let fail = persistence("Failed to delete use case");
        let mut tx = self.storage.begin().await.map_err(&fail)?;

        let Some(id) = tx
            .lock_owned_use_case(request.id, caller)
            .await
            .map_err(&fail)?
        else {
            warn!(
                "Delete of use case {} refused for {}: absent or not owned",
                request.id, caller.user_id
            );
            return Err(ServiceError::NotFound(
                "Use case not found or you don't have permission to delete it".to_string(),
            ));
        };

        if request.hard_delete {
            tx.delete_flow_details(id).await.map_err(&fail)?;
            tx.delete_flows(id).await.map_err(&fail)?;
            tx.delete_use_case(id).await.map_err(&fail)?;
        } else {
            tx.set_status(id, DELETED_STATUS).await.map_err(&fail)?;
        }
        tx.commit().await.map_err(&fail)?;

        info!(
            "Deleted use case {} for {} (hard: {})",
            id, caller.user_id, request.hard_delete
        );
        Ok(DeleteResponse {
            success: true,
            message: DELETED_MESSAGE.to_string(),
        })
    }

    /// One document by id or, failing that, by case-insensitive name fragment.
    pub async fn get_use_case(&self, query: UseCaseQuery) -> Result<UseCaseFull, ServiceError> {
        let fail = persistence("Failed to fetch use case");
        let name = query.name.filter(|n| !n.is_empty());

        let record = match (query.id, name) {
            (Some(id), _) => self.storage.find_use_case(id).await.map_err(&fail)?,
            (None, Some(name)) => self
                .storage
                .find_use_case_by_name(&name)
                .await
                .map_err(&fail)?,
            (None, None) => {
                return Err(ServiceError::InvalidIdentifier(
                    "Either id or name must be provided".to_string(),
                ));
            }
        };

        let record = record.ok_or_else(|| ServiceError::NotFound(NOT_FOUND_MESSAGE.to_string()))?;
        document(record, "Failed to fetch use case")
    }

    /// Every live document, ordered by id.
    pub async fn get_all_use_cases(&self) -> Result<Vec<UseCaseFull>, ServiceError> {
        let records = self
            .storage
            .list_use_cases()
            .await
            .map_err(persistence("Failed to fetch use cases"))?;

        records
            .into_iter()
            .map(|record| document(record, "Failed to fetch use cases"))
            .collect()
    }

    /// Convenience for callers holding only an id.
    pub async fn get_use_case_by_id(&self, id: RecordId) -> Result<UseCaseFull, ServiceError> {
        self.get_use_case(UseCaseQuery {
            id: Some(id),
            name: None,
        })
        .await
    }
}

fn document(record: UseCaseRecord, message: &'static str) -> Result<UseCaseFull, ServiceError> {
    to_document(record).map_err(|e| {
        error!("{}: {}", message, e);
        ServiceError::Persistence(message.to_string())
    })
}

/// Insert every flow, then its details under the flow's new id.
async fn insert_children(
    tx: &mut Box<dyn StorageTransaction>,
    use_case_id: RecordId,
    plan: &WritePlan,
) -> Result<(), StorageError> {
    for flow in &plan.flows {
        let flow_id = tx.insert_flow(use_case_id, &flow.fields).await?;
        for detail in &flow.details {
            tx.insert_flow_detail(flow_id, detail).await?;
        }
    }
    Ok(())
}
