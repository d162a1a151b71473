//! # Principal Introspection
//!
//! `GET /v1/me` reports the principal the request resolved to. It is not
//! gated, so an anonymous caller sees `is_authenticated: false`.

use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use wardgate_core::{Principal, PrincipalCapabilities};

use crate::auth::CurrentPrincipal;
use crate::routes::organization::OrganizationResponse;
use crate::state::AppState;

/// The resolved principal.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrincipalResponse {
    /// `anonymous`, `user`, or `organization`.
    pub kind: String,
    pub is_authenticated: bool,
    /// User id for `user` principals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// The organization the principal acts for, or null.
    pub organization: Option<OrganizationResponse>,
}

impl From<&Principal> for PrincipalResponse {
    fn from(principal: &Principal) -> Self {
        let user_id = match principal {
            Principal::User(user) => Some(user.user_id.clone()),
            _ => None,
        };
        Self {
            kind: principal.kind().as_str().to_string(),
            is_authenticated: principal.is_authenticated(),
            user_id,
            organization: principal.organization().map(OrganizationResponse::from),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/me", get(whoami))
}

/// GET /v1/me: Describe the resolved principal.
#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Resolved principal", body = PrincipalResponse),
        (status = 503, description = "Credential store unavailable", body = crate::error::ErrorBody),
    ),
    tag = "principal"
)]
pub(crate) async fn whoami(CurrentPrincipal(principal): CurrentPrincipal) -> Json<PrincipalResponse> {
    Json(PrincipalResponse::from(&principal))
}
