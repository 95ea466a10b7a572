//! PostgreSQL storage backend implementation.
//!
//! Uses sqlx for database operations and implements the StorageBackend trait.
//! Writes run inside a `sqlx::Transaction` that rolls back when dropped.

use super::rows::{
    FlowDetailFields, FlowDetailRow, FlowFields, FlowRow, UseCaseFields, UseCaseRecord,
    UseCaseRow, assemble_records,
};
use super::{StorageError, traits::*};
use crate::models::RecordId;
use crate::models::enums::DELETED_STATUS;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

const ROOT_COLUMNS: &str = r#"
    id, owner_id, "date", sector, name, participants, description, "trigger",
    documentation_ref, primary_actors, secondary_actors, preconditions,
    successful_results, failed_results, conditions, "input", "output", notes,
    status, created_at, updated_at
"#;

const SNAPSHOT_ISOLATION: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

/// PostgreSQL storage backend implementation.
pub struct PostgresStorageBackend {
    pool: PgPool,
}

impl PostgresStorageBackend {
    /// Create a new PostgreSQL storage backend.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::ConnectionError(format!("Migration failed: {}", e)))
    }

    /// Read-only transaction whose queries all see one snapshot.
    async fn snapshot(&self) -> Result<Transaction<'static, Postgres>, StorageError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(SNAPSHOT_ISOLATION).execute(&mut *tx).await?;
        Ok(tx)
    }
}

/// Load flows and details for roots selected in the same transaction.
async fn with_children(
    tx: &mut Transaction<'static, Postgres>,
    roots: Vec<UseCaseRow>,
) -> Result<Vec<UseCaseRecord>, StorageError> {
    if roots.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<RecordId> = roots.iter().map(|r| r.id).collect();

    let flows = sqlx::query_as::<_, FlowRow>(
        r#"
        SELECT id, use_case_id, name, flow_type, frequency, description
        FROM use_case_flows
        WHERE use_case_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut **tx)
    .await?;

    let details = sqlx::query_as::<_, FlowDetailRow>(
        r#"
        SELECT d.id, d.flow_id, d.step, d.actor, d.action, d.system_response,
               d.conditions, d.exceptions, d.notes
        FROM use_case_flow_details d
        JOIN use_case_flows f ON f.id = d.flow_id
        WHERE f.use_case_id = ANY($1)
        ORDER BY d.id
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut **tx)
    .await?;

    Ok(assemble_records(roots, flows, details))
}

/// Escape LIKE wildcards so `name` is matched literally.
fn like_pattern(name: &str) -> String {
    let escaped = name
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl StorageBackend for PostgresStorageBackend {
    async fn find_use_case(&self, id: RecordId) -> Result<Option<UseCaseRecord>, StorageError> {
        let mut tx = self.snapshot().await?;
        let sql = format!(
            "SELECT {ROOT_COLUMNS} FROM use_cases WHERE id = $1 AND status <> $2"
        );
        let root = sqlx::query_as::<_, UseCaseRow>(&sql)
            .bind(id)
            .bind(DELETED_STATUS)
            .fetch_optional(&mut *tx)
            .await?;

        let record = with_children(&mut tx, root.into_iter().collect()).await?.pop();
        tx.commit().await?;
        Ok(record)
    }

    async fn find_use_case_by_name(
        &self,
        name: &str,
    ) -> Result<Option<UseCaseRecord>, StorageError> {
        let mut tx = self.snapshot().await?;
        let sql = format!(
            r#"SELECT {ROOT_COLUMNS} FROM use_cases
               WHERE name ILIKE $1 ESCAPE '\' AND status <> $2
               ORDER BY id
               LIMIT 1"#
        );
        let root = sqlx::query_as::<_, UseCaseRow>(&sql)
            .bind(like_pattern(name))
            .bind(DELETED_STATUS)
            .fetch_optional(&mut *tx)
            .await?;

        let record = with_children(&mut tx, root.into_iter().collect()).await?.pop();
        tx.commit().await?;
        Ok(record)
    }

    async fn list_use_cases(&self) -> Result<Vec<UseCaseRecord>, StorageError> {
        let mut tx = self.snapshot().await?;
        let sql = format!("SELECT {ROOT_COLUMNS} FROM use_cases WHERE status <> $1 ORDER BY id");
        let roots = sqlx::query_as::<_, UseCaseRow>(&sql)
            .bind(DELETED_STATUS)
            .fetch_all(&mut *tx)
            .await?;

        let records = with_children(&mut tx, roots).await?;
        tx.commit().await?;
        Ok(records)
    }

    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StorageError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

/// One database transaction; dropping it without `commit` rolls back.
struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StorageTransaction for PostgresTransaction {
    async fn lock_owned_use_case(
        &mut self,
        id: RecordId,
        owner: &UserContext,
    ) -> Result<Option<RecordId>, StorageError> {
        let row: Option<(RecordId,)> = sqlx::query_as(
            r#"
            SELECT id FROM use_cases
            WHERE id = $1 AND owner_id = $2 AND status <> $3
            FOR UPDATE
            "#,
        )
        .bind(id)
        .bind(&owner.user_id)
        .bind(DELETED_STATUS)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(|(id,)| id))
    }

    async fn insert_use_case(
        &mut self,
        owner: &UserContext,
        fields: &UseCaseFields,
    ) -> Result<RecordId, StorageError> {
        let (id,): (RecordId,) = sqlx::query_as(
            r#"
            INSERT INTO use_cases (
                owner_id, "date", sector, name, participants, description, "trigger",
                documentation_ref, primary_actors, secondary_actors, preconditions,
                successful_results, failed_results, conditions, "input", "output",
                notes, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING id
            "#,
        )
        .bind(&owner.user_id)
        .bind(&fields.date)
        .bind(&fields.sector)
        .bind(&fields.name)
        .bind(&fields.participants)
        .bind(&fields.description)
        .bind(&fields.trigger)
        .bind(&fields.documentation_ref)
        .bind(&fields.primary_actors)
        .bind(&fields.secondary_actors)
        .bind(&fields.preconditions)
        .bind(&fields.successful_results)
        .bind(&fields.failed_results)
        .bind(&fields.conditions)
        .bind(&fields.input)
        .bind(&fields.output)
        .bind(&fields.notes)
        .bind(fields.status.as_str())
        .fetch_one(&mut *self.tx)
        .await?;

        debug!("Inserted use case {}", id);
        Ok(id)
    }

    async fn update_use_case(
        &mut self,
        id: RecordId,
        fields: &UseCaseFields,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE use_cases SET
                "date" = $2, sector = $3, name = $4, participants = $5, description = $6,
                "trigger" = $7, documentation_ref = $8, primary_actors = $9,
                secondary_actors = $10, preconditions = $11, successful_results = $12,
                failed_results = $13, conditions = $14, "input" = $15, "output" = $16,
                notes = $17, status = $18, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&fields.date)
        .bind(&fields.sector)
        .bind(&fields.name)
        .bind(&fields.participants)
        .bind(&fields.description)
        .bind(&fields.trigger)
        .bind(&fields.documentation_ref)
        .bind(&fields.primary_actors)
        .bind(&fields.secondary_actors)
        .bind(&fields.preconditions)
        .bind(&fields.successful_results)
        .bind(&fields.failed_results)
        .bind(&fields.conditions)
        .bind(&fields.input)
        .bind(&fields.output)
        .bind(&fields.notes)
        .bind(fields.status.as_str())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("use_case", id));
        }
        Ok(())
    }

    async fn insert_flow(
        &mut self,
        use_case_id: RecordId,
        fields: &FlowFields,
    ) -> Result<RecordId, StorageError> {
        let (id,): (RecordId,) = sqlx::query_as(
            r#"
            INSERT INTO use_case_flows (use_case_id, name, flow_type, frequency, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(use_case_id)
        .bind(&fields.name)
        .bind(fields.flow_type.as_str())
        .bind(fields.frequency)
        .bind(&fields.description)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn insert_flow_detail(
        &mut self,
        flow_id: RecordId,
        fields: &FlowDetailFields,
    ) -> Result<RecordId, StorageError> {
        let (id,): (RecordId,) = sqlx::query_as(
            r#"
            INSERT INTO use_case_flow_details (
                flow_id, step, actor, action, system_response, conditions, exceptions, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(flow_id)
        .bind(fields.step)
        .bind(&fields.actor)
        .bind(&fields.action)
        .bind(&fields.system_response)
        .bind(&fields.conditions)
        .bind(&fields.exceptions)
        .bind(&fields.notes)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn delete_flow_details(&mut self, use_case_id: RecordId) -> Result<u64, StorageError> {
        let result = sqlx::query(
            r#"
            DELETE FROM use_case_flow_details
            WHERE flow_id IN (SELECT id FROM use_case_flows WHERE use_case_id = $1)
            "#,
        )
        .bind(use_case_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_flows(&mut self, use_case_id: RecordId) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM use_case_flows WHERE use_case_id = $1")
            .bind(use_case_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn set_status(&mut self, id: RecordId, status: &str) -> Result<(), StorageError> {
        let result =
            sqlx::query("UPDATE use_cases SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(&mut *self.tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("use_case", id));
        }
        Ok(())
    }

    async fn delete_use_case(&mut self, id: RecordId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM use_cases WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("use_case", id));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.tx.commit().await?;
        Ok(())
    }
}
