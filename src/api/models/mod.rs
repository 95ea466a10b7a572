// Models module - contains the use case document schema, its validation and request bodies

pub mod enums;
pub mod fields;
pub mod requests;
pub mod use_case;
pub mod validation;

pub use enums::{FlowType, UseCaseStatus};
pub use fields::{ArrayField, ElementKind};
pub use requests::{DeleteRequest, DeleteResponse, ListQuery, SaveResponse, UseCaseQuery};
pub use use_case::{
    Actors, CreateFlow, CreateFlowDetail, CreateUseCase, Flow, FlowDetail, FormFlow,
    FormFlowDetail, FormUseCase, Identity, NoId, RecordId, UpdateFlow, UpdateFlowDetail,
    UpdateUseCase, UpsertUseCase, UseCase, UseCaseFull, UseCaseRef,
};
pub use validation::{FieldPath, PathSegment, Validate, ValidationErrors, decode_json};
