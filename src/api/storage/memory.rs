//! In-memory storage backend implementation.
//!
//! Used when no `DATABASE_URL` is configured and by the test suites. Mirrors
//! the PostgreSQL backend: transactions are serialized behind one async mutex
//! and work on a private copy of the tables that replaces the shared copy only
//! on commit.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::rows::{
    FlowDetailFields, FlowDetailRow, FlowFields, FlowRow, UseCaseFields, UseCaseRecord,
    UseCaseRow, assemble_records,
};
use super::{StorageError, traits::*};
use crate::models::RecordId;
use crate::models::enums::DELETED_STATUS;

#[derive(Debug, Clone, Default)]
struct Tables {
    use_cases: BTreeMap<RecordId, UseCaseRow>,
    flows: BTreeMap<RecordId, FlowRow>,
    details: BTreeMap<RecordId, FlowDetailRow>,
    last_use_case_id: RecordId,
    last_flow_id: RecordId,
    last_detail_id: RecordId,
}

impl Tables {
    fn live(&self, filter: impl Fn(&UseCaseRow) -> bool) -> Vec<UseCaseRecord> {
        let roots: Vec<UseCaseRow> = self
            .use_cases
            .values()
            .filter(|row| row.status != DELETED_STATUS && filter(row))
            .cloned()
            .collect();
        let ids: Vec<RecordId> = roots.iter().map(|r| r.id).collect();
        let flows: Vec<FlowRow> = self
            .flows
            .values()
            .filter(|f| ids.contains(&f.use_case_id))
            .cloned()
            .collect();
        let flow_ids: Vec<RecordId> = flows.iter().map(|f| f.id).collect();
        let details: Vec<FlowDetailRow> = self
            .details
            .values()
            .filter(|d| flow_ids.contains(&d.flow_id))
            .cloned()
            .collect();
        assemble_records(roots, flows, details)
    }

    fn flow_ids_of(&self, use_case_id: RecordId) -> Vec<RecordId> {
        self.flows
            .values()
            .filter(|f| f.use_case_id == use_case_id)
            .map(|f| f.id)
            .collect()
    }
}

/// In-memory storage backend.
#[derive(Clone, Default)]
pub struct InMemoryStorageBackend {
    tables: Arc<Mutex<Tables>>,
    fail_detail_inserts: Arc<AtomicBool>,
}

impl InMemoryStorageBackend {
    /// Create an empty in-memory storage backend.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Hooks for exercising the backend from test suites.
#[cfg(any(test, feature = "test-support"))]
impl InMemoryStorageBackend {
    /// Make every subsequent flow detail insert fail with a connection error.
    ///
    /// Lets callers observe that a failing multi-row write leaves nothing behind.
    pub fn fail_detail_inserts(&self, fail: bool) {
        self.fail_detail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Root row by id, soft-deleted rows included.
    pub async fn raw_use_case(&self, id: RecordId) -> Option<UseCaseRow> {
        self.tables.lock().await.use_cases.get(&id).cloned()
    }

    /// Number of stored (use case, flow, flow detail) rows, soft-deleted included.
    pub async fn row_counts(&self) -> (usize, usize, usize) {
        let tables = self.tables.lock().await;
        (tables.use_cases.len(), tables.flows.len(), tables.details.len())
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorageBackend {
    async fn find_use_case(&self, id: RecordId) -> Result<Option<UseCaseRecord>, StorageError> {
        let tables = self.tables.lock().await;
        Ok(tables.live(|row| row.id == id).into_iter().next())
    }

    async fn find_use_case_by_name(
        &self,
        name: &str,
    ) -> Result<Option<UseCaseRecord>, StorageError> {
        let needle = name.to_lowercase();
        let tables = self.tables.lock().await;
        Ok(tables
            .live(|row| row.name.to_lowercase().contains(&needle))
            .into_iter()
            .next())
    }

    async fn list_use_cases(&self) -> Result<Vec<UseCaseRecord>, StorageError> {
        let tables = self.tables.lock().await;
        Ok(tables.live(|_| true))
    }

    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StorageError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(InMemoryTransaction {
            guard,
            working,
            fail_detail_inserts: self.fail_detail_inserts.load(Ordering::SeqCst),
        }))
    }
}

/// Transaction over a private copy of the tables.
struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    fail_detail_inserts: bool,
}

fn new_root(id: RecordId, owner: &UserContext, fields: &UseCaseFields) -> UseCaseRow {
    let now = Utc::now();
    UseCaseRow {
        id,
        owner_id: owner.user_id.clone(),
        date: fields.date.clone(),
        sector: fields.sector.clone(),
        name: fields.name.clone(),
        participants: fields.participants.clone(),
        description: fields.description.clone(),
        trigger: fields.trigger.clone(),
        documentation_ref: fields.documentation_ref.clone(),
        primary_actors: fields.primary_actors.clone(),
        secondary_actors: fields.secondary_actors.clone(),
        preconditions: fields.preconditions.clone(),
        successful_results: fields.successful_results.clone(),
        failed_results: fields.failed_results.clone(),
        conditions: fields.conditions.clone(),
        input: fields.input.clone(),
        output: fields.output.clone(),
        notes: Some(fields.notes.clone()),
        status: fields.status.as_str().to_string(),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl StorageTransaction for InMemoryTransaction {
    async fn lock_owned_use_case(
        &mut self,
        id: RecordId,
        owner: &UserContext,
    ) -> Result<Option<RecordId>, StorageError> {
        Ok(self
            .working
            .use_cases
            .get(&id)
            .filter(|row| row.owner_id == owner.user_id && row.status != DELETED_STATUS)
            .map(|row| row.id))
    }

    async fn insert_use_case(
        &mut self,
        owner: &UserContext,
        fields: &UseCaseFields,
    ) -> Result<RecordId, StorageError> {
        self.working.last_use_case_id += 1;
        let id = self.working.last_use_case_id;
        self.working.use_cases.insert(id, new_root(id, owner, fields));
        Ok(id)
    }

    async fn update_use_case(
        &mut self,
        id: RecordId,
        fields: &UseCaseFields,
    ) -> Result<(), StorageError> {
        let row = self
            .working
            .use_cases
            .get_mut(&id)
            .ok_or_else(|| StorageError::not_found("use_case", id))?;
        let owner = UserContext::new(row.owner_id.clone());
        let created_at = row.created_at;
        *row = UseCaseRow {
            created_at,
            ..new_root(id, &owner, fields)
        };
        Ok(())
    }

    async fn insert_flow(
        &mut self,
        use_case_id: RecordId,
        fields: &FlowFields,
    ) -> Result<RecordId, StorageError> {
        if !self.working.use_cases.contains_key(&use_case_id) {
            return Err(StorageError::not_found("use_case", use_case_id));
        }
        self.working.last_flow_id += 1;
        let id = self.working.last_flow_id;
        self.working.flows.insert(
            id,
            FlowRow {
                id,
                use_case_id,
                name: fields.name.clone(),
                flow_type: fields.flow_type.as_str().to_string(),
                frequency: fields.frequency,
                description: fields.description.clone(),
            },
        );
        Ok(id)
    }

    async fn insert_flow_detail(
        &mut self,
        flow_id: RecordId,
        fields: &FlowDetailFields,
    ) -> Result<RecordId, StorageError> {
        if self.fail_detail_inserts {
            return Err(StorageError::ConnectionError(
                "flow detail insert rejected".to_string(),
            ));
        }
        if !self.working.flows.contains_key(&flow_id) {
            return Err(StorageError::not_found("flow", flow_id));
        }
        self.working.last_detail_id += 1;
        let id = self.working.last_detail_id;
        self.working.details.insert(
            id,
            FlowDetailRow {
                id,
                flow_id,
                step: fields.step,
                actor: fields.actor.clone(),
                action: fields.action.clone(),
                system_response: fields.system_response.clone(),
                conditions: fields.conditions.clone(),
                exceptions: fields.exceptions.clone(),
                notes: Some(fields.notes.clone()),
            },
        );
        Ok(id)
    }

    async fn delete_flow_details(&mut self, use_case_id: RecordId) -> Result<u64, StorageError> {
        let flow_ids = self.working.flow_ids_of(use_case_id);
        let before = self.working.details.len();
        self.working
            .details
            .retain(|_, d| !flow_ids.contains(&d.flow_id));
        Ok((before - self.working.details.len()) as u64)
    }

    async fn delete_flows(&mut self, use_case_id: RecordId) -> Result<u64, StorageError> {
        self.delete_flow_details(use_case_id).await?;
        let before = self.working.flows.len();
        self.working
            .flows
            .retain(|_, f| f.use_case_id != use_case_id);
        Ok((before - self.working.flows.len()) as u64)
    }

    async fn set_status(&mut self, id: RecordId, status: &str) -> Result<(), StorageError> {
        let row = self
            .working
            .use_cases
            .get_mut(&id)
            .ok_or_else(|| StorageError::not_found("use_case", id))?;
        row.status = status.to_string();
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_use_case(&mut self, id: RecordId) -> Result<(), StorageError> {
        self.delete_flows(id).await?;
        self.working
            .use_cases
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found("use_case", id))
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let InMemoryTransaction {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}
