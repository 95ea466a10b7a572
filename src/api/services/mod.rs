//! Services module - contains the use case business logic.

pub mod defaults;
pub mod export_service;
pub mod filter_service;
pub mod jwt_service;
pub mod transform;
pub mod use_case_service;

// Re-export for convenience
pub use defaults::{flow_defaults, flow_detail_defaults, next_step, use_case_defaults};
pub use export_service::{ExportService, JsonExport};
pub use filter_service::FilterService;
pub use jwt_service::{Claims, IssuedToken, JwtService, SharedJwtService, TokenType};
pub use transform::{TransformError, to_document, write_plan};
pub use use_case_service::{ServiceError, UseCaseService};
