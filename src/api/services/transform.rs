//! Conversion between the nested document and its relational rows.
//!
//! The read direction rebuilds a [`UseCaseFull`] from a stored record. The write
//! direction flattens any document variant into a [`WritePlan`]; identities are
//! never part of a plan because every row is (re)created by the store.

use thiserror::Error;

use crate::models::{
    Actors, Flow, FlowDetail, FlowType, Identity, UpdateFlow, UpdateFlowDetail, UseCase,
    UseCaseFull, UseCaseStatus,
};
use crate::storage::{
    FlowDetailFields, FlowDetailRow, FlowFields, FlowRecord, NewFlow, UseCaseFields,
    UseCaseRecord, WritePlan,
};

/// A stored row that cannot be expressed as a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("use case {id} has unknown status '{status}'")]
    UnknownStatus { id: i64, status: String },
    #[error("flow {id} has unknown type '{flow_type}'")]
    UnknownFlowType { id: i64, flow_type: String },
}

fn detail_document(row: FlowDetailRow) -> UpdateFlowDetail {
    FlowDetail {
        id: row.id,
        step: row.step,
        actor: row.actor,
        action: row.action,
        system_response: row.system_response,
        conditions: row.conditions,
        exceptions: row.exceptions,
        notes: row.notes.unwrap_or_default(),
    }
}

fn flow_document(record: FlowRecord) -> Result<UpdateFlow, TransformError> {
    let FlowRecord { row, details } = record;
    let flow_type = row
        .flow_type
        .parse::<FlowType>()
        .map_err(|_| TransformError::UnknownFlowType {
            id: row.id,
            flow_type: row.flow_type.clone(),
        })?;
    Ok(Flow {
        id: row.id,
        name: row.name,
        flow_type,
        frequency: row.frequency,
        description: row.description,
        flow_details: details.into_iter().map(detail_document).collect(),
    })
}

/// Rebuild the nested document from its stored rows.
///
/// `useCaseRef` is not persisted and always comes back empty.
pub fn to_document(record: UseCaseRecord) -> Result<UseCaseFull, TransformError> {
    let UseCaseRecord { root, flows } = record;
    let status = root
        .status
        .parse::<UseCaseStatus>()
        .map_err(|_| TransformError::UnknownStatus {
            id: root.id,
            status: root.status.clone(),
        })?;
    let flows = flows
        .into_iter()
        .map(flow_document)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(UseCase {
        id: root.id,
        date: root.date,
        sector: root.sector,
        name: root.name,
        participants: root.participants,
        description: root.description,
        trigger: root.trigger,
        documentation_ref: root.documentation_ref,
        use_case_ref: Vec::new(),
        actors: Actors {
            primary: root.primary_actors,
            secondary: root.secondary_actors,
        },
        preconditions: root.preconditions,
        successful_results: root.successful_results,
        failed_results: root.failed_results,
        conditions: root.conditions,
        flows,
        input: root.input,
        output: root.output,
        notes: root.notes.unwrap_or_default(),
        status,
    })
}

fn detail_fields<I: Identity>(detail: &FlowDetail<I>) -> FlowDetailFields {
    FlowDetailFields {
        step: detail.step,
        actor: detail.actor.clone(),
        action: detail.action.clone(),
        system_response: detail.system_response.clone(),
        conditions: detail.conditions.clone(),
        exceptions: detail.exceptions.clone(),
        notes: detail.notes.clone(),
    }
}

fn new_flow<I: Identity>(flow: &Flow<I>) -> NewFlow {
    NewFlow {
        fields: FlowFields {
            name: flow.name.clone(),
            flow_type: flow.flow_type,
            frequency: flow.frequency,
            description: flow.description.clone(),
        },
        details: flow.flow_details.iter().map(detail_fields).collect(),
    }
}

/// Split a document into the rows written for it, flows and details in order.
pub fn write_plan<I: Identity>(doc: &UseCase<I>) -> WritePlan {
    WritePlan {
        root: UseCaseFields {
            date: doc.date.clone(),
            sector: doc.sector.clone(),
            name: doc.name.clone(),
            participants: doc.participants.clone(),
            description: doc.description.clone(),
            trigger: doc.trigger.clone(),
            documentation_ref: doc.documentation_ref.clone(),
            primary_actors: doc.actors.primary.clone(),
            secondary_actors: doc.actors.secondary.clone(),
            preconditions: doc.preconditions.clone(),
            successful_results: doc.successful_results.clone(),
            failed_results: doc.failed_results.clone(),
            conditions: doc.conditions.clone(),
            input: doc.input.clone(),
            output: doc.output.clone(),
            notes: doc.notes.clone(),
            status: doc.status,
        },
        flows: doc.flows.iter().map(new_flow).collect(),
    }
}
