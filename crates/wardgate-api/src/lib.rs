//! # wardgate-api: Organization-Scoped API Access
//!
//! Resolves API credentials to organizations and serves organization-scoped
//! resources. A request carrying a known credential acts as a synthetic,
//! always-authenticated organization principal; the access gate then lets
//! handlers query only that organization's data.
//!
//! ## API Surface
//!
//! | Path                                   | Module                      | Gated |
//! |----------------------------------------|-----------------------------|-------|
//! | `/v1/me`                               | [`routes::principal`]       | no    |
//! | `/v1/organization`                     | [`routes::organization`]    | yes   |
//! | `/v1/organization/dependents`          | [`routes::organization`]    | yes   |
//! | `/v1/organization/dependents/:id`      | [`routes::organization`]    | yes   |
//! | `/openapi.json`                        | [`openapi`]                 | no    |
//! | `/health/liveness`, `/health/readiness`| this module                 | no    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → auth_middleware → Handler (OrganizationScope gate)
//! ```
//!
//! ## OpenAPI
//!
//! Generated via utoipa derive macros, served at `/openapi.json`.

pub mod auth;
pub mod bootstrap;
pub mod db;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod store;

use axum::middleware::from_fn;
use axum::Router;

use crate::auth::Authenticator;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware so
/// they never touch the credential store.
pub fn app(state: AppState) -> Router {
    let authenticator = Authenticator::new(
        state.credentials.clone(),
        state.config.operator_token.clone(),
    );

    let api = Router::new()
        .merge(routes::principal::router())
        .merge(routes::organization::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(middleware::tracing_layer::layer())
        .layer(axum::Extension(authenticator))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe.
async fn readiness() -> &'static str {
    "ready"
}
