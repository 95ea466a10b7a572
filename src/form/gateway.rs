//! Gateways carrying form submissions to the use case service.
//!
//! [`LocalGateway`] calls the service in-process on behalf of one caller;
//! [`HttpGateway`] talks to a running API with a bearer token. Both report
//! failures with the same coarse [`GatewayError`] kinds.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{
    RecordId, SaveResponse, UpsertUseCase, UseCaseFull, ValidationErrors,
};
use crate::services::{ServiceError, UseCaseService};
use crate::storage::UserContext;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidIdentifier(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Persistence(String),
    /// The request never produced an answer from the service
    #[error("request failed: {0}")]
    Transport(String),
}

impl From<ServiceError> for GatewayError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Validation(errors) => GatewayError::Validation(errors),
            ServiceError::NotFound(message) => GatewayError::NotFound(message),
            ServiceError::InvalidIdentifier(message) => GatewayError::InvalidIdentifier(message),
            ServiceError::Persistence(message) => GatewayError::Persistence(message),
        }
    }
}

/// The two calls the form needs: load a document to edit, save a submission.
#[async_trait]
pub trait UseCaseGateway: Send + Sync {
    async fn fetch(&self, id: RecordId) -> Result<UseCaseFull, GatewayError>;

    async fn save(&self, payload: UpsertUseCase) -> Result<SaveResponse, GatewayError>;
}

/// In-process gateway acting as a fixed caller.
#[derive(Clone)]
pub struct LocalGateway {
    service: UseCaseService,
    caller: UserContext,
}

impl LocalGateway {
    pub fn new(service: UseCaseService, caller: UserContext) -> Self {
        Self { service, caller }
    }
}

#[async_trait]
impl UseCaseGateway for LocalGateway {
    async fn fetch(&self, id: RecordId) -> Result<UseCaseFull, GatewayError> {
        Ok(self.service.get_use_case_by_id(id).await?)
    }

    async fn save(&self, payload: UpsertUseCase) -> Result<SaveResponse, GatewayError> {
        Ok(self.service.save_use_case(&self.caller, payload).await?)
    }
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    kind: String,
    #[serde(default)]
    fields: Option<ValidationErrors>,
}

/// Gateway for a remote API rooted at `base_url` (e.g. `http://host:8081/api/v1`).
#[derive(Clone)]
pub struct HttpGateway {
    base_url: String,
    token: Arc<str>,
    http_client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Arc::from(token.into()),
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a success body, or map the API's error body onto a gateway error.
    async fn read<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| GatewayError::Transport(format!("Failed to parse response: {}", e)));
        }

        let text = response.text().await.unwrap_or_default();
        let Ok(body) = serde_json::from_str::<ErrorBody>(&text) else {
            warn!("Use case API answered {} without an error body", status);
            return Err(GatewayError::Transport(format!(
                "Unexpected status {}: {}",
                status, text
            )));
        };

        Err(match body.kind.as_str() {
            "validation" => GatewayError::Validation(
                body.fields
                    .unwrap_or_else(|| ValidationErrors::single(body.error)),
            ),
            "not_found" => GatewayError::NotFound(body.error),
            "invalid_identifier" => GatewayError::InvalidIdentifier(body.error),
            "unauthorized" => GatewayError::Unauthorized(body.error),
            "invalid_body" | "unsupported_media_type" => GatewayError::Transport(body.error),
            _ => GatewayError::Persistence(body.error),
        })
    }
}

#[async_trait]
impl UseCaseGateway for HttpGateway {
    async fn fetch(&self, id: RecordId) -> Result<UseCaseFull, GatewayError> {
        let response = self
            .http_client
            .get(self.url(&format!("/use-cases/{}", id)))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Self::read(response).await
    }

    async fn save(&self, payload: UpsertUseCase) -> Result<SaveResponse, GatewayError> {
        info!("Sending {} of '{}' to {}", payload.kind(), payload.name(), self.base_url);
        let response = self
            .http_client
            .post(self.url("/use-cases"))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Self::read(response).await
    }
}
