//! Closed set of the document's dynamic arrays.
//!
//! Every array the form can grow or shrink is named here together with its
//! path, its element kind and the message used when a text element is blank.
//! Validation and the form engine both drive arrays through these descriptors.

use super::use_case::{Identity, UseCase};
use super::validation::FieldPath;

/// What an array holds, which decides the element appended by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Text,
    Reference,
    Flow,
    FlowDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayField {
    Participants,
    DocumentationRef,
    Preconditions,
    SuccessfulResults,
    FailedResults,
    Conditions,
    Input,
    Output,
    PrimaryActors,
    SecondaryActors,
    UseCaseRef,
    Flows,
    FlowDetails { flow: usize },
    DetailConditions { flow: usize, detail: usize },
    DetailExceptions { flow: usize, detail: usize },
}

/// Root-level string lists, in form order.
pub const ROOT_TEXT_LISTS: [ArrayField; 10] = [
    ArrayField::Participants,
    ArrayField::DocumentationRef,
    ArrayField::PrimaryActors,
    ArrayField::SecondaryActors,
    ArrayField::Preconditions,
    ArrayField::SuccessfulResults,
    ArrayField::FailedResults,
    ArrayField::Conditions,
    ArrayField::Input,
    ArrayField::Output,
];

impl ArrayField {
    pub fn path(&self) -> FieldPath {
        let root = FieldPath::root();
        match self {
            ArrayField::Participants => root.key("participants"),
            ArrayField::DocumentationRef => root.key("documentationRef"),
            ArrayField::Preconditions => root.key("preconditions"),
            ArrayField::SuccessfulResults => root.key("succuesfulResults"),
            ArrayField::FailedResults => root.key("failedResults"),
            ArrayField::Conditions => root.key("conditions"),
            ArrayField::Input => root.key("input"),
            ArrayField::Output => root.key("output"),
            ArrayField::PrimaryActors => root.key("actors").key("primary"),
            ArrayField::SecondaryActors => root.key("actors").key("secondary"),
            ArrayField::UseCaseRef => root.key("useCaseRef"),
            ArrayField::Flows => root.key("flows"),
            ArrayField::FlowDetails { flow } => root.key("flows").index(*flow).key("flowDetails"),
            ArrayField::DetailConditions { flow, detail } => root
                .key("flows")
                .index(*flow)
                .key("flowDetails")
                .index(*detail)
                .key("conditions"),
            ArrayField::DetailExceptions { flow, detail } => root
                .key("flows")
                .index(*flow)
                .key("flowDetails")
                .index(*detail)
                .key("exceptions"),
        }
    }

    pub fn element(&self) -> ElementKind {
        match self {
            ArrayField::UseCaseRef => ElementKind::Reference,
            ArrayField::Flows => ElementKind::Flow,
            ArrayField::FlowDetails { .. } => ElementKind::FlowDetail,
            _ => ElementKind::Text,
        }
    }

    /// Smallest length the schema accepts.
    pub fn min_len(&self) -> usize {
        match self {
            ArrayField::Flows | ArrayField::FlowDetails { .. } => 1,
            _ => 0,
        }
    }

    /// Message for a blank element of a text array.
    pub fn blank_message(&self) -> &'static str {
        match self {
            ArrayField::Participants => "El nombre del participante no puede estar vacío",
            ArrayField::DocumentationRef => "La referencia de documentación no puede estar vacía",
            ArrayField::Preconditions => "La precondición no puede estar vacía",
            ArrayField::SuccessfulResults => "El resultado exitoso no puede estar vacío",
            ArrayField::FailedResults => "El resultado fallido no puede estar vacío",
            ArrayField::Conditions | ArrayField::DetailConditions { .. } => {
                "La condición no puede estar vacía"
            }
            ArrayField::Input => "La entrada no puede estar vacía",
            ArrayField::Output => "La salida no puede estar vacía",
            ArrayField::PrimaryActors => "El actor principal no puede estar vacío",
            ArrayField::SecondaryActors => "El actor secundario no puede estar vacío",
            ArrayField::DetailExceptions { .. } => "La excepción no puede estar vacía",
            ArrayField::UseCaseRef | ArrayField::Flows | ArrayField::FlowDetails { .. } => "",
        }
    }

    /// Borrow the items of a text array; `None` for other kinds or a dangling index.
    pub fn text_items<'a, I: Identity>(&self, doc: &'a UseCase<I>) -> Option<&'a Vec<String>> {
        match self {
            ArrayField::Participants => Some(&doc.participants),
            ArrayField::DocumentationRef => Some(&doc.documentation_ref),
            ArrayField::Preconditions => Some(&doc.preconditions),
            ArrayField::SuccessfulResults => Some(&doc.successful_results),
            ArrayField::FailedResults => Some(&doc.failed_results),
            ArrayField::Conditions => Some(&doc.conditions),
            ArrayField::Input => Some(&doc.input),
            ArrayField::Output => Some(&doc.output),
            ArrayField::PrimaryActors => Some(&doc.actors.primary),
            ArrayField::SecondaryActors => Some(&doc.actors.secondary),
            ArrayField::DetailConditions { flow, detail } => doc
                .flows
                .get(*flow)
                .and_then(|f| f.flow_details.get(*detail))
                .map(|d| &d.conditions),
            ArrayField::DetailExceptions { flow, detail } => doc
                .flows
                .get(*flow)
                .and_then(|f| f.flow_details.get(*detail))
                .map(|d| &d.exceptions),
            ArrayField::UseCaseRef | ArrayField::Flows | ArrayField::FlowDetails { .. } => None,
        }
    }

    pub fn text_items_mut<'a, I: Identity>(
        &self,
        doc: &'a mut UseCase<I>,
    ) -> Option<&'a mut Vec<String>> {
        match self {
            ArrayField::Participants => Some(&mut doc.participants),
            ArrayField::DocumentationRef => Some(&mut doc.documentation_ref),
            ArrayField::Preconditions => Some(&mut doc.preconditions),
            ArrayField::SuccessfulResults => Some(&mut doc.successful_results),
            ArrayField::FailedResults => Some(&mut doc.failed_results),
            ArrayField::Conditions => Some(&mut doc.conditions),
            ArrayField::Input => Some(&mut doc.input),
            ArrayField::Output => Some(&mut doc.output),
            ArrayField::PrimaryActors => Some(&mut doc.actors.primary),
            ArrayField::SecondaryActors => Some(&mut doc.actors.secondary),
            ArrayField::DetailConditions { flow, detail } => doc
                .flows
                .get_mut(*flow)
                .and_then(|f| f.flow_details.get_mut(*detail))
                .map(|d| &mut d.conditions),
            ArrayField::DetailExceptions { flow, detail } => doc
                .flows
                .get_mut(*flow)
                .and_then(|f| f.flow_details.get_mut(*detail))
                .map(|d| &mut d.exceptions),
            ArrayField::UseCaseRef | ArrayField::Flows | ArrayField::FlowDetails { .. } => None,
        }
    }

    /// Current length, or `None` when the array's parent element does not exist.
    pub fn len<I: Identity>(&self, doc: &UseCase<I>) -> Option<usize> {
        match self {
            ArrayField::UseCaseRef => Some(doc.use_case_ref.len()),
            ArrayField::Flows => Some(doc.flows.len()),
            ArrayField::FlowDetails { flow } => doc.flows.get(*flow).map(|f| f.flow_details.len()),
            _ => self.text_items(doc).map(Vec::len),
        }
    }

    /// Every array instance present in `doc`, parents before children.
    pub fn all_in<I: Identity>(doc: &UseCase<I>) -> Vec<ArrayField> {
        let mut fields: Vec<ArrayField> = ROOT_TEXT_LISTS.to_vec();
        fields.push(ArrayField::UseCaseRef);
        fields.push(ArrayField::Flows);
        for (flow, f) in doc.flows.iter().enumerate() {
            fields.extend(Self::within_flow(flow, f.flow_details.len()));
        }
        fields
    }

    /// Arrays nested under flow `flow`, including its detail list.
    pub fn within_flow(flow: usize, details: usize) -> Vec<ArrayField> {
        let mut fields = vec![ArrayField::FlowDetails { flow }];
        for detail in 0..details {
            fields.extend(Self::within_detail(flow, detail));
        }
        fields
    }

    pub fn within_detail(flow: usize, detail: usize) -> [ArrayField; 2] {
        [
            ArrayField::DetailConditions { flow, detail },
            ArrayField::DetailExceptions { flow, detail },
        ]
    }
}
