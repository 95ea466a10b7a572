//! OpenAPI specification definition.
//!
//! Aggregates all route handlers and schemas for OpenAPI documentation generation.

use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Use cases
        crate::routes::use_cases::save_use_case,
        crate::routes::use_cases::list_use_cases,
        crate::routes::use_cases::list_sectors,
        crate::routes::use_cases::lookup_use_case,
        crate::routes::use_cases::get_use_case,
        crate::routes::use_cases::delete_use_case_by_path,
        crate::routes::use_cases::delete_use_case,
        crate::routes::use_cases::export_use_case,
        // OpenAPI
        crate::routes::openapi::serve_openapi_json,
    ),
    components(schemas(
        crate::models::SaveResponse,
        crate::models::DeleteRequest,
        crate::models::DeleteResponse,
        crate::models::UseCaseQuery,
        crate::models::ListQuery,
        crate::models::UseCaseStatus,
        crate::models::FlowType,
        crate::models::Actors,
        crate::models::UseCaseRef,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Use Cases", description = "Use case authoring, lookup, deletion and export"),
        (name = "OpenAPI", description = "OpenAPI specification"),
    ),
    info(
        title = "Use Case API",
        description = "REST API for authoring and browsing structured use case documents",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8081/api/v1", description = "Local development server")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        // Update version to match Cargo.toml version
        openapi.info.version = env!("CARGO_PKG_VERSION").to_string();

        use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
        openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::new)
            .add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
    }
}
