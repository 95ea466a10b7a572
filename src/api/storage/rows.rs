//! Relational shapes of a use case.
//!
//! These are persistence rows and carry no behaviour. Actors, results and the
//! other string lists live as flat multi-value columns on the root row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{FlowType, RecordId, UseCaseStatus};

/// A persisted `use_cases` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UseCaseRow {
    pub id: RecordId,
    pub owner_id: String,
    pub date: String,
    pub sector: String,
    pub name: String,
    pub participants: Vec<String>,
    pub description: String,
    pub trigger: String,
    pub documentation_ref: Vec<String>,
    pub primary_actors: Vec<String>,
    pub secondary_actors: Vec<String>,
    pub preconditions: Vec<String>,
    pub successful_results: Vec<String>,
    pub failed_results: Vec<String>,
    pub conditions: Vec<String>,
    pub input: Vec<String>,
    pub output: Vec<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted `use_case_flows` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FlowRow {
    pub id: RecordId,
    pub use_case_id: RecordId,
    pub name: String,
    pub flow_type: String,
    pub frequency: i32,
    pub description: String,
}

/// A persisted `use_case_flow_details` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FlowDetailRow {
    pub id: RecordId,
    pub flow_id: RecordId,
    pub step: i32,
    pub actor: String,
    pub action: String,
    pub system_response: String,
    pub conditions: Vec<String>,
    pub exceptions: Vec<String>,
    pub notes: Option<String>,
}

/// A flow row with its details, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRecord {
    pub row: FlowRow,
    pub details: Vec<FlowDetailRow>,
}

/// Everything stored for one use case: the flattened read shape.
#[derive(Debug, Clone, PartialEq)]
pub struct UseCaseRecord {
    pub root: UseCaseRow,
    pub flows: Vec<FlowRecord>,
}

/// Group flat rows into records, keeping the order of `roots` and row-id order below.
pub fn assemble_records(
    roots: Vec<UseCaseRow>,
    mut flows: Vec<FlowRow>,
    mut details: Vec<FlowDetailRow>,
) -> Vec<UseCaseRecord> {
    flows.sort_by_key(|f| f.id);
    details.sort_by_key(|d| d.id);
    roots
        .into_iter()
        .map(|root| {
            let flows = flows
                .iter()
                .filter(|f| f.use_case_id == root.id)
                .map(|f| FlowRecord {
                    row: f.clone(),
                    details: details.iter().filter(|d| d.flow_id == f.id).cloned().collect(),
                })
                .collect();
            UseCaseRecord { root, flows }
        })
        .collect()
}

/// Scalar and multi-value columns written to a `use_cases` row.
#[derive(Debug, Clone, PartialEq)]
pub struct UseCaseFields {
    pub date: String,
    pub sector: String,
    pub name: String,
    pub participants: Vec<String>,
    pub description: String,
    pub trigger: String,
    pub documentation_ref: Vec<String>,
    pub primary_actors: Vec<String>,
    pub secondary_actors: Vec<String>,
    pub preconditions: Vec<String>,
    pub successful_results: Vec<String>,
    pub failed_results: Vec<String>,
    pub conditions: Vec<String>,
    pub input: Vec<String>,
    pub output: Vec<String>,
    pub notes: String,
    pub status: UseCaseStatus,
}

/// Columns written to a `use_case_flows` row.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowFields {
    pub name: String,
    pub flow_type: FlowType,
    pub frequency: i32,
    pub description: String,
}

/// Columns written to a `use_case_flow_details` row.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowDetailFields {
    pub step: i32,
    pub actor: String,
    pub action: String,
    pub system_response: String,
    pub conditions: Vec<String>,
    pub exceptions: Vec<String>,
    pub notes: String,
}

/// A flow to insert together with its details.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFlow {
    pub fields: FlowFields,
    pub details: Vec<FlowDetailFields>,
}

/// Per-entity writes derived from one document.
#[derive(Debug, Clone, PartialEq)]
pub struct WritePlan {
    pub root: UseCaseFields,
    pub flows: Vec<NewFlow>,
}
