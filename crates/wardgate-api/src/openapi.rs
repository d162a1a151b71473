//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented handlers into one OpenAPI document served
//! at `/openapi.json`. The document sits behind the auth middleware like
//! every other `/v1` route but is not gated, so anonymous callers can read it.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wardgate API",
        version = "0.1.0",
        description = "Credential resolution and organization-scoped access for dependents.",
        license(name = "Apache-2.0")
    ),
    paths(
        crate::routes::principal::whoami,
        crate::routes::organization::get_organization,
        crate::routes::organization::list_dependents,
        crate::routes::organization::get_dependent,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::principal::PrincipalResponse,
        crate::routes::organization::OrganizationResponse,
        crate::routes::organization::DependentResponse,
        crate::routes::organization::DependentListResponse,
    )),
    tags(
        (name = "principal", description = "Resolved principal introspection"),
        (name = "organization", description = "Organization-scoped resources"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI JSON at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/v1/me",
            "/v1/organization",
            "/v1/organization/dependents",
            "/v1/organization/dependents/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn document_serializes() {
        let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert_eq!(json["info"]["title"], "Wardgate API");
    }
}
