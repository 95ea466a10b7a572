//! Request and response bodies of the use case endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::use_case::RecordId;

/// Result of a successful `saveUseCase`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SaveResponse {
    pub success: bool,
    pub id: RecordId,
    pub message: String,
}

/// Body of `deleteUseCase`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub id: RecordId,
    /// Remove rows instead of marking the document deleted
    #[serde(default)]
    pub hard_delete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Input of `getUseCase`; at least one field must be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UseCaseQuery {
    pub id: Option<RecordId>,
    pub name: Option<String>,
}

/// Listing filters; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListQuery {
    /// Case-insensitive match on name, description, sector or participants
    pub search: Option<String>,
    /// Exact status match
    pub status: Option<String>,
    /// Exact sector match
    pub sector: Option<String>,
}
