//! One editing session: a [`FormState`] bound to a gateway.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::gateway::{GatewayError, UseCaseGateway};
use super::state::{FormAction, FormError, FormState, SubmitOutcome, Submission};
use crate::models::{RecordId, SaveResponse};

type Completion = Box<dyn Fn(&SaveResponse) + Send + Sync>;

pub struct FormSession {
    id: Uuid,
    state: FormState,
    gateway: Arc<dyn UseCaseGateway>,
    on_success: Option<Completion>,
}

impl fmt::Debug for FormSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl FormSession {
    /// Session creating a new use case from defaults.
    pub fn create(gateway: Arc<dyn UseCaseGateway>) -> Self {
        Self::with_state(gateway, FormState::new())
    }

    /// Session editing the stored use case `id`.
    pub async fn open(gateway: Arc<dyn UseCaseGateway>, id: RecordId) -> Result<Self, GatewayError> {
        let doc = gateway.fetch(id).await?;
        Ok(Self::with_state(gateway, FormState::edit(doc)))
    }

    fn with_state(gateway: Arc<dyn UseCaseGateway>, state: FormState) -> Self {
        let id = Uuid::new_v4();
        info!(session = %id, origin = ?state.origin(), "Opened form session");
        Self {
            id,
            state,
            gateway,
            on_success: None,
        }
    }

    /// Callback run once for every successful save.
    pub fn on_success(mut self, callback: impl Fn(&SaveResponse) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Apply an edit; the state is left untouched when it fails.
    pub fn apply(&mut self, action: FormAction) -> Result<(), FormError> {
        self.state = self.state.apply(action)?;
        Ok(())
    }

    /// Validate, send and resolve one submission.
    ///
    /// Produces exactly one outcome. Client-side failures never reach the
    /// gateway; every failure keeps the edits in place.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, FormError> {
        let validating = self.state.apply(FormAction::Submit)?;
        let (submitting, payload) = match validating.validate_submission()? {
            Submission::Ready { state, payload } => (state, payload),
            Submission::Invalid(state) => {
                info!(
                    session = %self.id,
                    "Submission blocked: {} invalid field(s)",
                    state.errors().len()
                );
                let errors = state.errors().clone();
                self.state = state;
                return Ok(SubmitOutcome::Rejected(errors));
            }
        };
        self.state = submitting;

        let outcome = match self.gateway.save(payload).await {
            Ok(response) => SubmitOutcome::Saved(response),
            Err(GatewayError::Validation(errors)) => {
                warn!(session = %self.id, "Submission rejected by the service");
                SubmitOutcome::Rejected(errors)
            }
            Err(e) => {
                warn!(session = %self.id, "Submission failed: {}", e);
                SubmitOutcome::Failed(e.to_string())
            }
        };

        self.state = self.state.resolve(outcome.clone())?;
        if let SubmitOutcome::Saved(response) = &outcome {
            info!(session = %self.id, "Saved use case {}", response.id);
            if let Some(callback) = &self.on_success {
                callback(response);
            }
        }
        Ok(outcome)
    }
}
