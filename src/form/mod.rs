//! Form engine for editing use case documents.
//!
//! [`FormState`] is a pure reducer over the editable document; [`FormSession`]
//! drives it through a submission against a [`UseCaseGateway`].

pub mod gateway;
pub mod preview;
pub mod session;
pub mod state;

pub use gateway::{GatewayError, HttpGateway, LocalGateway, UseCaseGateway};
pub use preview::UseCasePreview;
pub use session::FormSession;
pub use state::{
    DetailText, ElementKey, FlowText, FormAction, FormError, FormState, Phase, RootText,
    SubmitOutcome, Submission,
};
