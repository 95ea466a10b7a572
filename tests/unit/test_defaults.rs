//! Unit tests for default values of new documents and appended elements

use use_case_api::models::{
    CreateUseCase, FlowType, FormFlow, FormFlowDetail, FormUseCase, UseCaseStatus, Validate,
};
use use_case_api::services::defaults::{DEFAULT_FREQUENCY, today};
use use_case_api::services::{flow_defaults, flow_detail_defaults, next_step, use_case_defaults};

#[test]
fn test_use_case_defaults_are_a_draft_dated_today() {
    let doc: FormUseCase = use_case_defaults();
    assert_eq!(doc.id, None);
    assert_eq!(doc.status, UseCaseStatus::Draft);
    assert_eq!(doc.date, today());
    assert!(doc.name.is_empty());
    assert!(doc.participants.is_empty());
    assert!(doc.use_case_ref.is_empty());
    assert!(doc.actors.primary.is_empty() && doc.actors.secondary.is_empty());
}

#[test]
fn test_use_case_defaults_seed_one_flow_with_one_detail() {
    let doc: FormUseCase = use_case_defaults();
    assert_eq!(doc.flows.len(), 1);
    let flow = &doc.flows[0];
    assert_eq!(flow.flow_type, FlowType::Main);
    assert_eq!(flow.frequency, DEFAULT_FREQUENCY);
    assert_eq!(flow.flow_details.len(), 1);
    assert_eq!(flow.flow_details[0].step, 1);
}

#[test]
fn test_defaults_only_miss_required_text() {
    let doc: CreateUseCase = use_case_defaults();
    let errors = doc.validate().unwrap_err();

    assert!(!errors.contains("flows"));
    assert!(!errors.contains("flows[0].flowDetails"));
    assert!(!errors.contains("flows[0].frequency"));
    assert!(!errors.contains("date"));
    assert!(errors.contains("name"));
    assert!(errors.contains("flows[0].flowDetails[0].actor"));
}

#[test]
fn test_flow_detail_defaults_take_the_given_step() {
    let detail: FormFlowDetail = flow_detail_defaults(4);
    assert_eq!(detail.step, 4);
    assert!(detail.conditions.is_empty());
    assert!(detail.exceptions.is_empty());
    assert!(detail.notes.is_empty());
}

#[test]
fn test_next_step_follows_the_number_of_details() {
    let mut flow: FormFlow = flow_defaults();
    assert_eq!(next_step(&flow.flow_details), 2);

    let step = next_step(&flow.flow_details);
    flow.flow_details.push(flow_detail_defaults(step));
    assert_eq!(next_step(&flow.flow_details), 3);

    flow.flow_details.clear();
    assert_eq!(next_step(&flow.flow_details), 1);
}
