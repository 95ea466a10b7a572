//! Seed values for new documents and for elements appended while editing.
//!
//! Generic over the identity policy so the same seeds serve create payloads
//! (`NoId`) and the editable form (`Option<RecordId>`).

use chrono::Utc;

use crate::models::{Actors, Flow, FlowDetail, FlowType, Identity, UseCase, UseCaseStatus};

/// Frequency given to a freshly appended flow.
pub const DEFAULT_FREQUENCY: i32 = 100;

/// Today's date as `YYYY-MM-DD` (UTC).
pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Empty flow detail numbered `step`.
pub fn flow_detail_defaults<I: Identity + Default>(step: i32) -> FlowDetail<I> {
    FlowDetail {
        id: I::default(),
        step,
        actor: String::new(),
        action: String::new(),
        system_response: String::new(),
        conditions: Vec::new(),
        exceptions: Vec::new(),
        notes: String::new(),
    }
}

/// Empty main flow; always seeded with one detail at step 1.
pub fn flow_defaults<I: Identity + Default>() -> Flow<I> {
    Flow {
        id: I::default(),
        name: String::new(),
        flow_type: FlowType::Main,
        frequency: DEFAULT_FREQUENCY,
        description: String::new(),
        flow_details: vec![flow_detail_defaults(1)],
    }
}

/// Empty draft document dated today with one seeded flow.
pub fn use_case_defaults<I: Identity + Default>() -> UseCase<I> {
    UseCase {
        id: I::default(),
        date: today(),
        sector: String::new(),
        name: String::new(),
        participants: Vec::new(),
        description: String::new(),
        trigger: String::new(),
        documentation_ref: Vec::new(),
        use_case_ref: Vec::new(),
        actors: Actors::default(),
        preconditions: Vec::new(),
        successful_results: Vec::new(),
        failed_results: Vec::new(),
        conditions: Vec::new(),
        flows: vec![flow_defaults()],
        input: Vec::new(),
        output: Vec::new(),
        notes: String::new(),
        status: UseCaseStatus::Draft,
    }
}

/// Step number for a detail appended after `details` existing ones.
pub fn next_step<I: Identity>(details: &[FlowDetail<I>]) -> i32 {
    i32::try_from(details.len()).map_or(i32::MAX, |len| len.saturating_add(1))
}
