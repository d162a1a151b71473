//! # Organization-Scoped Resources
//!
//! Every handler here takes an [`OrganizationScope`], so the access gate has
//! already run, and queries the directory relative to that organization
//! only. A dependent id belonging to another organization is reported as
//! not found.
//!
//! ## Endpoints
//!
//! - `GET /v1/organization`: the caller's organization
//! - `GET /v1/organization/dependents`: its dependents
//! - `GET /v1/organization/dependents/:id`: one of its dependents

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use wardgate_core::{Dependent, DependentId, Organization};

use crate::auth::OrganizationScope;
use crate::error::AppError;
use crate::state::AppState;

// ── Response DTOs ───────────────────────────────────────────────────

/// An organization.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<&Organization> for OrganizationResponse {
    fn from(org: &Organization) -> Self {
        Self {
            id: *org.id.as_uuid(),
            name: org.name.clone(),
        }
    }
}

/// A dependent of the caller's organization.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DependentResponse {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub display_name: String,
    pub admitted_at: DateTime<Utc>,
}

impl From<Dependent> for DependentResponse {
    fn from(d: Dependent) -> Self {
        Self {
            id: *d.id.as_uuid(),
            organization_id: *d.organization_id.as_uuid(),
            display_name: d.display_name,
            admitted_at: d.admitted_at,
        }
    }
}

/// Dependent listing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DependentListResponse {
    pub organization_id: Uuid,
    pub dependents: Vec<DependentResponse>,
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/organization", get(get_organization))
        .route("/v1/organization/dependents", get(list_dependents))
        .route("/v1/organization/dependents/:id", get(get_dependent))
}

// ── Handlers ────────────────────────────────────────────────────────

/// GET /v1/organization: The organization the caller acts for.
///
/// Re-reads the record from the directory so a rename is visible without
/// reissuing credentials.
#[utoipa::path(
    get,
    path = "/v1/organization",
    responses(
        (status = 200, description = "Caller's organization", body = OrganizationResponse),
        (status = 401, description = "No credential or unknown credential", body = crate::error::ErrorBody),
        (status = 403, description = "Principal has no organization", body = crate::error::ErrorBody),
    ),
    tag = "organization"
)]
pub(crate) async fn get_organization(
    State(state): State<AppState>,
    scope: OrganizationScope,
) -> Result<Json<OrganizationResponse>, AppError> {
    let organization = state
        .directory
        .organization(scope.id())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("organization {}", scope.id())))?;
    Ok(Json(OrganizationResponse::from(&organization)))
}

/// GET /v1/organization/dependents: List the caller's dependents.
#[utoipa::path(
    get,
    path = "/v1/organization/dependents",
    responses(
        (status = 200, description = "Dependents of the caller's organization", body = DependentListResponse),
        (status = 401, description = "No credential or unknown credential", body = crate::error::ErrorBody),
        (status = 403, description = "Principal has no organization", body = crate::error::ErrorBody),
    ),
    tag = "organization"
)]
pub(crate) async fn list_dependents(
    State(state): State<AppState>,
    scope: OrganizationScope,
) -> Result<Json<DependentListResponse>, AppError> {
    let dependents = state.directory.dependents(scope.id()).await?;
    tracing::debug!(
        organization_id = %scope.id(),
        count = dependents.len(),
        "listed dependents"
    );
    Ok(Json(DependentListResponse {
        organization_id: *scope.id().as_uuid(),
        dependents: dependents.into_iter().map(DependentResponse::from).collect(),
    }))
}

/// GET /v1/organization/dependents/:id: One of the caller's dependents.
#[utoipa::path(
    get,
    path = "/v1/organization/dependents/{id}",
    params(("id" = Uuid, Path, description = "Dependent ID")),
    responses(
        (status = 200, description = "Dependent", body = DependentResponse),
        (status = 401, description = "No credential or unknown credential", body = crate::error::ErrorBody),
        (status = 403, description = "Principal has no organization", body = crate::error::ErrorBody),
        (status = 404, description = "No such dependent in this organization", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed dependent ID", body = crate::error::ErrorBody),
    ),
    tag = "organization"
)]
pub(crate) async fn get_dependent(
    State(state): State<AppState>,
    scope: OrganizationScope,
    Path(id): Path<String>,
) -> Result<Json<DependentResponse>, AppError> {
    let id: DependentId = id.parse()?;
    let dependent = state
        .directory
        .dependent(scope.id(), &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("dependent {id}")))?;
    Ok(Json(DependentResponse::from(dependent)))
}
