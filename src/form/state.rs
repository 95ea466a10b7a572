//! Form engine state container.
//!
//! A [`FormState`] is never mutated in place: [`FormState::apply`] and the two
//! submission steps return a new state, so any earlier value can be kept as a
//! snapshot. Every element of every dynamic array carries a stable
//! [`ElementKey`] that survives edits and removals of its siblings.

use std::collections::BTreeMap;

use thiserror::Error;

use super::preview::UseCasePreview;
use crate::models::{
    ArrayField, ElementKind, FieldPath, FlowType, FormFlowDetail, FormUseCase,
    RecordId, SaveResponse, UpsertUseCase, UseCaseFull, UseCaseRef, UseCaseStatus, Validate,
    ValidationErrors,
};
use crate::services::{flow_defaults, flow_detail_defaults, next_step, use_case_defaults};

/// Identity of one array element, stable for the element's lifetime.
pub type ElementKey = u64;

/// Lifecycle of one editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Freshly seeded, untouched
    Seeded,
    Editing,
    /// Submit requested; waiting for [`FormState::validate_submission`]
    Validating,
    /// Payload handed to the gateway; edits are disabled
    Submitting,
    /// Saved successfully
    Committed,
}

/// Scalar text fields of the document root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootText {
    Date,
    Sector,
    Name,
    Description,
    Trigger,
    Notes,
}

impl RootText {
    pub fn path(&self) -> FieldPath {
        let key = match self {
            RootText::Date => "date",
            RootText::Sector => "sector",
            RootText::Name => "name",
            RootText::Description => "description",
            RootText::Trigger => "trigger",
            RootText::Notes => "notes",
        };
        FieldPath::root().key(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowText {
    Name,
    Description,
}

impl FlowText {
    fn key(&self) -> &'static str {
        match self {
            FlowText::Name => "name",
            FlowText::Description => "description",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailText {
    Actor,
    Action,
    SystemResponse,
    Notes,
}

impl DetailText {
    fn key(&self) -> &'static str {
        match self {
            DetailText::Actor => "actor",
            DetailText::Action => "action",
            DetailText::SystemResponse => "systemResponse",
            DetailText::Notes => "notes",
        }
    }
}

/// One user operation on the form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormAction {
    SetText { field: RootText, value: String },
    SetFlowText { flow: usize, field: FlowText, value: String },
    SetDetailText {
        flow: usize,
        detail: usize,
        field: DetailText,
        value: String,
    },
    /// Replace one element of a text array
    SetItem {
        array: ArrayField,
        index: usize,
        value: String,
    },
    SetRefName { index: usize, value: String },
    SetRefId { index: usize, id: RecordId },
    SetStatus(UseCaseStatus),
    SetFlowType { flow: usize, flow_type: FlowType },
    SetFrequency { flow: usize, frequency: i32 },
    SetStep { flow: usize, detail: usize, step: i32 },
    Append(ArrayField),
    Remove(ArrayField, usize),
    /// Validate the subtree rooted at the path, without editing it
    Blur(FieldPath),
    OpenPreview,
    ClosePreview,
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("a submission is already in flight")]
    Busy,
    #[error("the form is showing its preview")]
    Previewing,
    #[error("{action} is not allowed while {phase:?}")]
    InvalidTransition { action: &'static str, phase: Phase },
    #[error("no element at {0}")]
    NoSuchElement(FieldPath),
    #[error("{0} does not hold text items")]
    NotTextArray(FieldPath),
}

/// Result of a submission reported back by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Saved(SaveResponse),
    /// Server-side validation failures, keyed like client-side ones
    Rejected(ValidationErrors),
    /// Any other failure, as a message for the user
    Failed(String),
}

/// Result of [`FormState::validate_submission`].
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Valid; `payload` goes to the gateway and `state` is `Submitting`
    Ready {
        state: FormState,
        payload: UpsertUseCase,
    },
    /// Invalid; the state is back to `Editing` with the error tree attached
    Invalid(FormState),
}

/// Editable document plus everything the form tracks about it.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    doc: FormUseCase,
    origin: Option<RecordId>,
    phase: Phase,
    errors: ValidationErrors,
    keys: BTreeMap<FieldPath, Vec<ElementKey>>,
    next_key: ElementKey,
    attempted: bool,
    previewing: bool,
    submit_error: Option<String>,
    saved: Option<SaveResponse>,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormState {
    /// Blank form for a new use case.
    pub fn new() -> Self {
        Self::seeded(use_case_defaults(), None)
    }

    /// Form seeded from a stored use case; submitting it updates that use case.
    pub fn edit(doc: UseCaseFull) -> Self {
        let origin = Some(doc.id);
        Self::seeded(doc.into_form(), origin)
    }

    fn seeded(doc: FormUseCase, origin: Option<RecordId>) -> Self {
        let mut state = Self {
            doc,
            origin,
            phase: Phase::Seeded,
            errors: ValidationErrors::new(),
            keys: BTreeMap::new(),
            next_key: 0,
            attempted: false,
            previewing: false,
            submit_error: None,
            saved: None,
        };
        let arrays = ArrayField::all_in(&state.doc);
        state.seed_keys(&arrays);
        state
    }

    pub fn document(&self) -> &FormUseCase {
        &self.doc
    }

    /// Identity the form was seeded from, if it edits a stored use case.
    pub fn origin(&self) -> Option<RecordId> {
        self.origin
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn is_previewing(&self) -> bool {
        self.previewing
    }

    /// True while a submit is outstanding; the submit control must be disabled.
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Validating | Phase::Submitting)
    }

    /// Message of the last failed submission, cleared by the next submit.
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn saved(&self) -> Option<&SaveResponse> {
        self.saved.as_ref()
    }

    /// Stable keys of `array`, in element order.
    pub fn keys(&self, array: ArrayField) -> &[ElementKey] {
        self.keys
            .get(&array.path())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Read-only view of the current, possibly invalid, document.
    pub fn preview(&self) -> UseCasePreview<'_> {
        UseCasePreview::new(&self.doc)
    }

    /// Apply one action, returning the next state.
    pub fn apply(&self, action: FormAction) -> Result<FormState, FormError> {
        match action {
            FormAction::OpenPreview => {
                if self.is_busy() {
                    return Err(FormError::Busy);
                }
                let mut next = self.clone();
                next.previewing = true;
                Ok(next)
            }
            FormAction::ClosePreview => {
                if !self.previewing {
                    return Err(FormError::InvalidTransition {
                        action: "close preview",
                        phase: self.phase,
                    });
                }
                let mut next = self.clone();
                next.previewing = false;
                Ok(next)
            }
            FormAction::Submit => {
                self.ensure_editable("submit")?;
                let mut next = self.clone();
                next.phase = Phase::Validating;
                next.attempted = true;
                next.submit_error = None;
                Ok(next)
            }
            FormAction::Blur(path) => {
                self.ensure_editable("blur")?;
                let mut next = self.clone();
                next.revalidate(&path);
                Ok(next)
            }
            edit => {
                self.ensure_editable("edit")?;
                let mut next = self.clone();
                let touched = next.mutate(edit)?;
                next.phase = Phase::Editing;
                if next.attempted {
                    next.revalidate(&touched);
                }
                Ok(next)
            }
        }
    }

    /// Check the whole document and build the tagged payload.
    ///
    /// A form seeded from a stored use case submits an `update`, every other
    /// form a `create` with all identities stripped.
    pub fn validate_submission(&self) -> Result<Submission, FormError> {
        if self.phase != Phase::Validating {
            return Err(FormError::InvalidTransition {
                action: "validate submission",
                phase: self.phase,
            });
        }

        let mut next = self.clone();
        next.phase = Phase::Editing;
        if let Err(errors) = self.doc.validate() {
            next.errors = errors;
            return Ok(Submission::Invalid(next));
        }

        let payload = match self.origin {
            None => UpsertUseCase::Create(self.doc.clone().into_create()),
            Some(id) => match self.doc.clone().into_update(id) {
                Ok(doc) => UpsertUseCase::Update(doc),
                Err(errors) => {
                    next.errors = errors;
                    return Ok(Submission::Invalid(next));
                }
            },
        };

        next.errors = ValidationErrors::new();
        next.phase = Phase::Submitting;
        Ok(Submission::Ready {
            state: next,
            payload,
        })
    }

    /// Record the gateway's answer to the outstanding submission.
    ///
    /// A save adopts the server-issued identity. Failures keep every edit and
    /// return the form to `Editing`.
    pub fn resolve(&self, outcome: SubmitOutcome) -> Result<FormState, FormError> {
        if self.phase != Phase::Submitting {
            return Err(FormError::InvalidTransition {
                action: "resolve",
                phase: self.phase,
            });
        }
        let mut next = self.clone();
        match outcome {
            SubmitOutcome::Saved(response) => {
                // The issued identity replaces whatever the form was seeded with.
                next.origin = Some(response.id);
                next.doc.id = Some(response.id);
                next.phase = Phase::Committed;
                next.saved = Some(response);
            }
            SubmitOutcome::Rejected(errors) => {
                next.phase = Phase::Editing;
                next.errors = errors;
            }
            SubmitOutcome::Failed(message) => {
                next.phase = Phase::Editing;
                next.submit_error = Some(message);
            }
        }
        Ok(next)
    }

    fn ensure_editable(&self, action: &'static str) -> Result<(), FormError> {
        if self.previewing {
            return Err(FormError::Previewing);
        }
        match self.phase {
            Phase::Seeded | Phase::Editing => Ok(()),
            Phase::Validating | Phase::Submitting => Err(FormError::Busy),
            Phase::Committed => Err(FormError::InvalidTransition {
                action,
                phase: self.phase,
            }),
        }
    }

    /// Replace the errors under `prefix` with a fresh check of the document.
    fn revalidate(&mut self, prefix: &FieldPath) {
        let fresh = self.doc.validate().err().unwrap_or_default();
        self.errors.replace_subtree(prefix, &fresh);
    }

    fn fresh_key(&mut self) -> ElementKey {
        self.next_key += 1;
        self.next_key
    }

    /// Give every element of `arrays` a new key, replacing any it had.
    fn seed_keys(&mut self, arrays: &[ArrayField]) {
        for array in arrays {
            let len = array.len(&self.doc).unwrap_or(0);
            let keys = (0..len).map(|_| self.fresh_key()).collect();
            self.keys.insert(array.path(), keys);
        }
    }

    fn detail_mut(&mut self, flow: usize, detail: usize) -> Result<&mut FormFlowDetail, FormError> {
        self.doc
            .flows
            .get_mut(flow)
            .and_then(|f| f.flow_details.get_mut(detail))
            .ok_or_else(|| FormError::NoSuchElement(detail_path(flow, detail)))
    }

    /// Apply an edit to the document; returns the path it touched.
    fn mutate(&mut self, action: FormAction) -> Result<FieldPath, FormError> {
        match action {
            FormAction::SetText { field, value } => {
                let slot = match field {
                    RootText::Date => &mut self.doc.date,
                    RootText::Sector => &mut self.doc.sector,
                    RootText::Name => &mut self.doc.name,
                    RootText::Description => &mut self.doc.description,
                    RootText::Trigger => &mut self.doc.trigger,
                    RootText::Notes => &mut self.doc.notes,
                };
                *slot = value;
                Ok(field.path())
            }
            FormAction::SetFlowText { flow, field, value } => {
                let target = self
                    .doc
                    .flows
                    .get_mut(flow)
                    .ok_or_else(|| FormError::NoSuchElement(flow_path(flow)))?;
                match field {
                    FlowText::Name => target.name = value,
                    FlowText::Description => target.description = value,
                }
                Ok(flow_path(flow).key(field.key()))
            }
            FormAction::SetDetailText {
                flow,
                detail,
                field,
                value,
            } => {
                let target = self.detail_mut(flow, detail)?;
                match field {
                    DetailText::Actor => target.actor = value,
                    DetailText::Action => target.action = value,
                    DetailText::SystemResponse => target.system_response = value,
                    DetailText::Notes => target.notes = value,
                }
                Ok(detail_path(flow, detail).key(field.key()))
            }
            FormAction::SetItem {
                array,
                index,
                value,
            } => {
                let path = array.path();
                if array.element() != ElementKind::Text {
                    return Err(FormError::NotTextArray(path));
                }
                let slot = array
                    .text_items_mut(&mut self.doc)
                    .and_then(|items| items.get_mut(index))
                    .ok_or_else(|| FormError::NoSuchElement(path.index(index)))?;
                *slot = value;
                Ok(path.index(index))
            }
            FormAction::SetRefName { index, value } => {
                self.reference_mut(index)?.name = value;
                Ok(reference_path(index).key("name"))
            }
            FormAction::SetRefId { index, id } => {
                self.reference_mut(index)?.id = id;
                Ok(reference_path(index).key("id"))
            }
            FormAction::SetStatus(status) => {
                self.doc.status = status;
                Ok(FieldPath::root().key("status"))
            }
            FormAction::SetFlowType { flow, flow_type } => {
                self.doc
                    .flows
                    .get_mut(flow)
                    .ok_or_else(|| FormError::NoSuchElement(flow_path(flow)))?
                    .flow_type = flow_type;
                Ok(flow_path(flow).key("type"))
            }
            FormAction::SetFrequency { flow, frequency } => {
                self.doc
                    .flows
                    .get_mut(flow)
                    .ok_or_else(|| FormError::NoSuchElement(flow_path(flow)))?
                    .frequency = frequency;
                Ok(flow_path(flow).key("frequency"))
            }
            FormAction::SetStep { flow, detail, step } => {
                self.detail_mut(flow, detail)?.step = step;
                Ok(detail_path(flow, detail).key("step"))
            }
            FormAction::Append(array) => self.append(array),
            FormAction::Remove(array, index) => self.remove(array, index),
            FormAction::Blur(_)
            | FormAction::OpenPreview
            | FormAction::ClosePreview
            | FormAction::Submit => Err(FormError::InvalidTransition {
                action: "edit",
                phase: self.phase,
            }),
        }
    }

    fn reference_mut(&mut self, index: usize) -> Result<&mut UseCaseRef, FormError> {
        self.doc
            .use_case_ref
            .get_mut(index)
            .ok_or_else(|| FormError::NoSuchElement(reference_path(index)))
    }

    /// Append the default element of `array`.
    ///
    /// A new flow comes with one detail at step 1; a new detail is numbered
    /// after the details already present.
    fn append(&mut self, array: ArrayField) -> Result<FieldPath, FormError> {
        let path = array.path();
        let len = array
            .len(&self.doc)
            .ok_or_else(|| FormError::NoSuchElement(path.clone()))?;

        match array {
            ArrayField::UseCaseRef => self.doc.use_case_ref.push(UseCaseRef::default()),
            ArrayField::Flows => {
                self.doc.flows.push(flow_defaults());
                self.seed_keys(&ArrayField::within_flow(len, 1));
            }
            ArrayField::FlowDetails { flow } => {
                let details = &mut self
                    .doc
                    .flows
                    .get_mut(flow)
                    .ok_or_else(|| FormError::NoSuchElement(path.clone()))?
                    .flow_details;
                let detail: FormFlowDetail = flow_detail_defaults(next_step(details));
                details.push(detail);
                self.seed_keys(&ArrayField::within_detail(flow, len));
            }
            text => text
                .text_items_mut(&mut self.doc)
                .ok_or_else(|| FormError::NoSuchElement(path.clone()))?
                .push(String::new()),
        }

        let key = self.fresh_key();
        self.keys.entry(path.clone()).or_default().push(key);
        Ok(path)
    }

    /// Remove element `index` of `array`; later siblings move up by one,
    /// carrying their keys and errors with them.
    fn remove(&mut self, array: ArrayField, index: usize) -> Result<FieldPath, FormError> {
        let path = array.path();
        let len = array
            .len(&self.doc)
            .ok_or_else(|| FormError::NoSuchElement(path.clone()))?;
        if index >= len {
            return Err(FormError::NoSuchElement(path.index(index)));
        }

        match array {
            ArrayField::UseCaseRef => {
                self.doc.use_case_ref.remove(index);
            }
            ArrayField::Flows => {
                self.doc.flows.remove(index);
            }
            ArrayField::FlowDetails { flow } => {
                if let Some(target) = self.doc.flows.get_mut(flow) {
                    target.flow_details.remove(index);
                }
            }
            text => {
                if let Some(items) = text.text_items_mut(&mut self.doc) {
                    items.remove(index);
                }
            }
        }

        if let Some(keys) = self.keys.get_mut(&path) {
            if index < keys.len() {
                keys.remove(index);
            }
        }
        let keys = std::mem::take(&mut self.keys);
        self.keys = keys
            .into_iter()
            .filter_map(|(p, k)| p.after_removal(&path, index).map(|p| (p, k)))
            .collect();
        self.errors.shift_after_removal(&path, index);
        Ok(path)
    }
}

fn flow_path(flow: usize) -> FieldPath {
    FieldPath::root().key("flows").index(flow)
}

fn detail_path(flow: usize, detail: usize) -> FieldPath {
    flow_path(flow).key("flowDetails").index(detail)
}

fn reference_path(index: usize) -> FieldPath {
    FieldPath::root().key("useCaseRef").index(index)
}
