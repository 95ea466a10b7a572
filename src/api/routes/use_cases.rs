//! Use case routes.
//!
//! Handlers for saving, reading, listing, deleting and exporting use cases.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};
use utoipa::IntoParams;

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::ApiError;
use crate::models::{
    DeleteRequest, DeleteResponse, ListQuery, RecordId, SaveResponse, UpsertUseCase,
    UseCaseFull, UseCaseQuery, decode_json,
};
use crate::services::{ExportService, FilterService};

/// Create the use case router
pub fn use_cases_router() -> Router<AppState> {
    Router::new()
        .route("/use-cases", post(save_use_case).get(list_use_cases))
        .route("/use-cases/lookup", get(lookup_use_case))
        .route("/use-cases/sectors", get(list_sectors))
        .route("/use-cases/delete", post(delete_use_case))
        .route(
            "/use-cases/{id}",
            get(get_use_case).delete(delete_use_case_by_path),
        )
        .route("/use-cases/{id}/export", get(export_use_case))
}

/// Parse a path or query identifier.
fn parse_id(raw: &str) -> Result<RecordId, ApiError> {
    raw.trim()
        .parse::<RecordId>()
        .map_err(|_| ApiError::invalid_identifier(format!("Invalid use case id: {}", raw)))
}

/// Query parameters of the lookup route
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LookupParams {
    /// Use case id; takes precedence over `name`
    pub id: Option<String>,
    /// Case-insensitive name fragment
    pub name: Option<String>,
}

/// Query parameters of the path-based delete route
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct DeleteParams {
    /// Remove rows instead of marking the use case deleted
    #[serde(default)]
    pub hard_delete: bool,
}

/// POST /use-cases - Create or fully replace a use case
#[utoipa::path(
    post,
    path = "/use-cases",
    tag = "Use Cases",
    request_body(content = Object, description = "Use case tagged with `type`: `create` or `update`"),
    responses(
        (status = 200, description = "Use case saved", body = SaveResponse),
        (status = 400, description = "Body is not valid JSON"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Use case not found or not owned by the caller"),
        (status = 415, description = "Body is not sent as application/json"),
        (status = 422, description = "Validation failed"),
        (status = 500, description = "Failed to save use case")
    ),
    security(("bearer_auth" = []))
)]
pub async fn save_use_case(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let Json(body) = payload?;
    let input = UpsertUseCase::from_json(body).map_err(ApiError::validation)?;
    info!(
        "Saving use case '{}' ({}) for {} in session {}",
        input.name(),
        input.kind(),
        auth.user_context.user_id,
        auth.session_id
    );
    let response = state.use_cases.save_use_case(&auth.user_context, input).await?;
    Ok(Json(response))
}

/// GET /use-cases - List use cases, optionally filtered
#[utoipa::path(
    get,
    path = "/use-cases",
    tag = "Use Cases",
    params(
        ("search" = Option<String>, Query, description = "Matches name, description, sector or participants"),
        ("status" = Option<String>, Query, description = "Exact status"),
        ("sector" = Option<String>, Query, description = "Exact sector")
    ),
    responses(
        (status = 200, description = "Use cases ordered by id", body = Object),
        (status = 500, description = "Failed to fetch use cases")
    )
)]
pub async fn list_use_cases(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<UseCaseFull>>, ApiError> {
    let all = state.use_cases.get_all_use_cases().await?;
    Ok(Json(FilterService::filter_use_cases(all, &query)))
}

/// GET /use-cases/sectors - Distinct sectors of live use cases
#[utoipa::path(
    get,
    path = "/use-cases/sectors",
    tag = "Use Cases",
    responses(
        (status = 200, description = "Sorted distinct sectors", body = Vec<String>),
        (status = 500, description = "Failed to fetch use cases")
    )
)]
pub async fn list_sectors(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let all = state.use_cases.get_all_use_cases().await?;
    Ok(Json(FilterService::sectors(&all)))
}

/// GET /use-cases/lookup - Find one use case by id or name
#[utoipa::path(
    get,
    path = "/use-cases/lookup",
    tag = "Use Cases",
    params(LookupParams),
    responses(
        (status = 200, description = "Use case found", body = Object),
        (status = 400, description = "Neither id nor name given, or id malformed"),
        (status = 404, description = "Use case not found")
    )
)]
pub async fn lookup_use_case(
    State(state): State<AppState>,
    params: Result<Query<LookupParams>, QueryRejection>,
) -> Result<Json<UseCaseFull>, ApiError> {
    let Query(params) = params?;
    let id = params
        .id
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(parse_id)
        .transpose()?;
    let doc = state
        .use_cases
        .get_use_case(UseCaseQuery {
            id,
            name: params.name,
        })
        .await?;
    Ok(Json(doc))
}

/// GET /use-cases/{id} - Get one use case
#[utoipa::path(
    get,
    path = "/use-cases/{id}",
    tag = "Use Cases",
    params(("id" = String, Path, description = "Use case id")),
    responses(
        (status = 200, description = "Use case found", body = Object),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Use case not found")
    )
)]
pub async fn get_use_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UseCaseFull>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.use_cases.get_use_case_by_id(id).await?))
}

/// DELETE /use-cases/{id} - Soft or hard delete a use case
#[utoipa::path(
    delete,
    path = "/use-cases/{id}",
    tag = "Use Cases",
    params(
        ("id" = String, Path, description = "Use case id"),
        DeleteParams
    ),
    responses(
        (status = 200, description = "Use case deleted", body = DeleteResponse),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Use case not found or not owned by the caller")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_use_case_by_path(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Query(params) = params?;
    let request = DeleteRequest {
        id: parse_id(&id)?,
        hard_delete: params.hard_delete,
    };
    let response = state
        .use_cases
        .delete_use_case(&auth.user_context, request)
        .await?;
    Ok(Json(response))
}

/// POST /use-cases/delete - Soft or hard delete a use case
#[utoipa::path(
    post,
    path = "/use-cases/delete",
    tag = "Use Cases",
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "Use case deleted", body = DeleteResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Use case not found or not owned by the caller"),
        (status = 400, description = "Body is not valid JSON"),
        (status = 415, description = "Body is not sent as application/json"),
        (status = 422, description = "Body does not match the delete request")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_use_case(
    State(state): State<AppState>,
    auth: AuthContext,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Json(body) = payload?;
    let request: DeleteRequest = decode_json(body).map_err(ApiError::validation)?;
    let response = state
        .use_cases
        .delete_use_case(&auth.user_context, request)
        .await?;
    Ok(Json(response))
}

/// GET /use-cases/{id}/export - Download a use case as JSON
#[utoipa::path(
    get,
    path = "/use-cases/{id}/export",
    tag = "Use Cases",
    params(("id" = String, Path, description = "Use case id")),
    responses(
        (status = 200, description = "JSON attachment named use-case-{id}-{slug}.json", body = Object),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Use case not found")
    )
)]
pub async fn export_use_case(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let doc = state.use_cases.get_use_case_by_id(id).await?;
    let export = ExportService::export_json(&doc).map_err(|e| {
        error!("Failed to serialize use case {}: {}", id, e);
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "persistence",
            "Failed to export use case",
        )
    })?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        export.file_name
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response())
}
