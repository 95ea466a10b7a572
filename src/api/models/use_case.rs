//! Use case document schema.
//!
//! One generic shape serves the three variants of the document. The identity
//! policy `I` decides how `id` behaves at the root, on every flow and on every
//! flow detail:
//!
//! * [`NoId`] for documents being created (no identity anywhere),
//! * [`RecordId`] for updates and reads (identity required and positive),
//! * `Option<RecordId>` for the editable form, which serves both.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use utoipa::ToSchema;

use super::enums::{FlowType, UseCaseStatus};
use super::validation::{FieldPath, Validate, ValidationErrors, decode_json, require_text};

/// Server-issued identity of a persisted row.
pub type RecordId = i64;

pub const ID_MIN_MESSAGE: &str = "El ID debe ser al menos 1";

/// How a document variant treats identity fields.
pub trait Identity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    fn record_id(&self) -> Option<RecordId>;

    fn is_absent(&self) -> bool {
        self.record_id().is_none()
    }
}

/// Identity of a document that has not been persisted yet.
///
/// Serializes to nothing and swallows whatever `id` a client may send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoId;

impl Serialize for NoId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_none()
    }
}

impl<'de> Deserialize<'de> for NoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<IgnoredAny>::deserialize(deserializer).map(|_| NoId)
    }
}

impl Identity for NoId {
    fn record_id(&self) -> Option<RecordId> {
        None
    }
}

impl Identity for RecordId {
    fn record_id(&self) -> Option<RecordId> {
        Some(*self)
    }
}

impl Identity for Option<RecordId> {
    fn record_id(&self) -> Option<RecordId> {
        *self
    }
}

fn check_identity<I: Identity>(id: &I, path: &FieldPath, errors: &mut ValidationErrors) {
    if let Some(value) = id.record_id() {
        if value < 1 {
            errors.add(path.key("id"), ID_MIN_MESSAGE);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Actors {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
}

/// Soft reference to another use case. No referential integrity is enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UseCaseRef {
    pub id: RecordId,
    pub name: String,
}

/// One numbered step of a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = ""))]
pub struct FlowDetail<I: Identity> {
    #[serde(skip_serializing_if = "Identity::is_absent")]
    pub id: I,
    pub step: i32,
    pub actor: String,
    pub action: String,
    pub system_response: String,
    pub conditions: Vec<String>,
    pub exceptions: Vec<String>,
    pub notes: String,
}

/// One path through a use case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = ""))]
pub struct Flow<I: Identity> {
    #[serde(skip_serializing_if = "Identity::is_absent")]
    pub id: I,
    pub name: String,
    #[serde(rename = "type")]
    pub flow_type: FlowType,
    pub frequency: i32,
    pub description: String,
    pub flow_details: Vec<FlowDetail<I>>,
}

/// Root use case document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = ""))]
pub struct UseCase<I: Identity> {
    #[serde(skip_serializing_if = "Identity::is_absent")]
    pub id: I,
    pub date: String,
    pub sector: String,
    pub name: String,
    pub participants: Vec<String>,
    pub description: String,
    pub trigger: String,
    pub documentation_ref: Vec<String>,
    pub use_case_ref: Vec<UseCaseRef>,
    pub actors: Actors,
    pub preconditions: Vec<String>,
    // Wire name keeps the historical spelling clients already send.
    #[serde(rename = "succuesfulResults")]
    pub successful_results: Vec<String>,
    pub failed_results: Vec<String>,
    pub conditions: Vec<String>,
    pub flows: Vec<Flow<I>>,
    pub input: Vec<String>,
    pub output: Vec<String>,
    pub notes: String,
    pub status: UseCaseStatus,
}

pub type CreateUseCase = UseCase<NoId>;
pub type UpdateUseCase = UseCase<RecordId>;
pub type FormUseCase = UseCase<Option<RecordId>>;
/// Shape returned by every read.
pub type UseCaseFull = UpdateUseCase;

pub type CreateFlow = Flow<NoId>;
pub type UpdateFlow = Flow<RecordId>;
pub type FormFlow = Flow<Option<RecordId>>;

pub type CreateFlowDetail = FlowDetail<NoId>;
pub type UpdateFlowDetail = FlowDetail<RecordId>;
pub type FormFlowDetail = FlowDetail<Option<RecordId>>;

impl<I: Identity> FlowDetail<I> {
    pub fn map_identity<J: Identity>(self, id: J) -> FlowDetail<J> {
        FlowDetail {
            id,
            step: self.step,
            actor: self.actor,
            action: self.action,
            system_response: self.system_response,
            conditions: self.conditions,
            exceptions: self.exceptions,
            notes: self.notes,
        }
    }
}

impl<I: Identity> Flow<I> {
    /// Rebuild the flow under another identity policy.
    ///
    /// `child` receives each detail's old identity together with its path
    /// relative to this flow.
    pub fn map_identity<J: Identity>(
        self,
        id: J,
        path: &FieldPath,
        child: &mut impl FnMut(I, &FieldPath) -> J,
    ) -> Flow<J> {
        let details_path = path.key("flowDetails");
        let flow_details = self
            .flow_details
            .into_iter()
            .enumerate()
            .map(|(index, detail)| {
                let detail_id = child(detail.id.clone(), &details_path.index(index));
                detail.map_identity(detail_id)
            })
            .collect();
        Flow {
            id,
            name: self.name,
            flow_type: self.flow_type,
            frequency: self.frequency,
            description: self.description,
            flow_details,
        }
    }
}

impl<I: Identity> UseCase<I> {
    /// Rebuild the document under another identity policy.
    ///
    /// `child` maps every flow and flow detail identity; it is handed the
    /// element path so failures can be reported against the right control.
    pub fn map_identity<J: Identity>(
        self,
        id: J,
        mut child: impl FnMut(I, &FieldPath) -> J,
    ) -> UseCase<J> {
        let flows_path = FieldPath::root().key("flows");
        let flows = self
            .flows
            .into_iter()
            .enumerate()
            .map(|(index, flow)| {
                let flow_path = flows_path.index(index);
                let flow_id = child(flow.id.clone(), &flow_path);
                flow.map_identity(flow_id, &flow_path, &mut child)
            })
            .collect();
        UseCase {
            id,
            date: self.date,
            sector: self.sector,
            name: self.name,
            participants: self.participants,
            description: self.description,
            trigger: self.trigger,
            documentation_ref: self.documentation_ref,
            use_case_ref: self.use_case_ref,
            actors: self.actors,
            preconditions: self.preconditions,
            successful_results: self.successful_results,
            failed_results: self.failed_results,
            conditions: self.conditions,
            flows,
            input: self.input,
            output: self.output,
            notes: self.notes,
            status: self.status,
        }
    }

    /// Editable copy that keeps every known identity.
    pub fn into_form(self) -> FormUseCase {
        let id = self.id.record_id();
        self.map_identity(id, |child, _| child.record_id())
    }
}

impl FormUseCase {
    /// Drop every identity; the server assigns them on create.
    pub fn into_create(self) -> CreateUseCase {
        self.map_identity(NoId, |_, _| NoId)
    }

    /// Require an identity on the root and on every child.
    ///
    /// Children appended while editing carry none; they are reported at
    /// `flows[i].id` / `flows[i].flowDetails[j].id`. No form control edits an
    /// identity, so such a document cannot be saved as an update.
    pub fn into_update(self, id: RecordId) -> Result<UpdateUseCase, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let update = self.map_identity(id, |child, path| match child {
            Some(value) => value,
            None => {
                errors.add(path.key("id"), ID_MIN_MESSAGE);
                0
            }
        });
        errors.into_result().map(|()| update)
    }
}

/// Create-or-update submission, dispatched on its `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UpsertUseCase {
    Create(CreateUseCase),
    Update(UpdateUseCase),
}

impl UpsertUseCase {
    /// Decode a request body, reporting type errors at the offending field.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ValidationErrors> {
        let tag = FieldPath::root().key("type");
        match value.get("type").map(|t| t.as_str()) {
            Some(Some("create")) => decode_json(value).map(UpsertUseCase::Create),
            Some(Some("update")) => decode_json(value).map(UpsertUseCase::Update),
            Some(_) => {
                let mut errors = ValidationErrors::new();
                errors.add(tag, "unknown variant, expected `create` or `update`");
                Err(errors)
            }
            None => {
                let mut errors = ValidationErrors::new();
                errors.add(tag, "missing field `type`");
                Err(errors)
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            UpsertUseCase::Create(_) => "create",
            UpsertUseCase::Update(_) => "update",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            UpsertUseCase::Create(doc) => &doc.name,
            UpsertUseCase::Update(doc) => &doc.name,
        }
    }
}

fn validate_text_list(
    items: &[String],
    path: FieldPath,
    message: &str,
    errors: &mut ValidationErrors,
) {
    for (index, item) in items.iter().enumerate() {
        require_text(item, path.index(index), message, errors);
    }
}

impl<I: Identity> Validate for FlowDetail<I> {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        check_identity(&self.id, path, errors);
        if self.step < 1 {
            errors.add(path.key("step"), "El paso debe ser al menos 1");
        }
        require_text(&self.actor, path.key("actor"), "El actor es obligatorio", errors);
        require_text(&self.action, path.key("action"), "La acción es obligatoria", errors);
        require_text(
            &self.system_response,
            path.key("systemResponse"),
            "La respuesta del sistema es obligatoria",
            errors,
        );
        validate_text_list(
            &self.conditions,
            path.key("conditions"),
            "La condición no puede estar vacía",
            errors,
        );
        validate_text_list(
            &self.exceptions,
            path.key("exceptions"),
            "La excepción no puede estar vacía",
            errors,
        );
    }
}

impl<I: Identity> Validate for Flow<I> {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        check_identity(&self.id, path, errors);
        require_text(&self.name, path.key("name"), "El nombre del flujo es obligatorio", errors);
        if !(0..=100).contains(&self.frequency) {
            errors.add(path.key("frequency"), "La frecuencia debe estar entre 0 y 100");
        }
        require_text(
            &self.description,
            path.key("description"),
            "La descripción es obligatoria",
            errors,
        );
        let details_path = path.key("flowDetails");
        if self.flow_details.is_empty() {
            errors.add(details_path.clone(), "Se requiere al menos un detalle del flujo");
        }
        for (index, detail) in self.flow_details.iter().enumerate() {
            detail.validate_at(&details_path.index(index), errors);
        }
    }
}

impl Validate for UseCaseRef {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        if self.id < 1 {
            errors.add(path.key("id"), "El ID de referencia debe ser al menos 1");
        }
        require_text(
            &self.name,
            path.key("name"),
            "El nombre de la referencia es obligatorio",
            errors,
        );
    }
}

impl<I: Identity> Validate for UseCase<I> {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        check_identity(&self.id, path, errors);
        require_text(&self.date, path.key("date"), "La fecha es obligatoria", errors);
        require_text(&self.sector, path.key("sector"), "El sector es obligatorio", errors);
        require_text(
            &self.name,
            path.key("name"),
            "El nombre del caso de uso es obligatorio",
            errors,
        );
        require_text(
            &self.description,
            path.key("description"),
            "La descripción es obligatoria",
            errors,
        );
        require_text(&self.trigger, path.key("trigger"), "El disparador es obligatorio", errors);

        for field in super::fields::ROOT_TEXT_LISTS {
            if let Some(items) = field.text_items(self) {
                validate_text_list(items, field.path(), field.blank_message(), errors);
            }
        }

        let refs_path = path.key("useCaseRef");
        for (index, reference) in self.use_case_ref.iter().enumerate() {
            reference.validate_at(&refs_path.index(index), errors);
        }

        let flows_path = path.key("flows");
        if self.flows.is_empty() {
            errors.add(flows_path.clone(), "Se requiere al menos un flujo");
        }
        for (index, flow) in self.flows.iter().enumerate() {
            flow.validate_at(&flows_path.index(index), errors);
        }
    }
}

impl Validate for UpsertUseCase {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        match self {
            UpsertUseCase::Create(doc) => doc.validate_at(path, errors),
            UpsertUseCase::Update(doc) => doc.validate_at(path, errors),
        }
    }
}
