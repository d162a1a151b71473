//! # Authentication Middleware & Principal Extractors
//!
//! Resolves the request's [`Principal`] from an API credential and gates
//! organization-scoped handlers.
//!
//! ## Credential Carriers
//!
//! ```text
//! Authorization: Bearer {credential}    (checked first)
//! X-Api-Key: {credential}               (fallback)
//! ```
//!
//! A non-Bearer `Authorization` header is not a carrier and falls through
//! to `X-Api-Key`. A Bearer header with a malformed value does not.
//!
//! ## Resolution
//!
//! 1. No usable credential → `Principal::Anonymous`.
//! 2. Credential equals the configured operator token → operator user.
//! 3. Credential digest found in the [`CredentialStore`] → synthetic
//!    organization principal.
//! 4. Otherwise → `Principal::Anonymous`.
//!
//! The middleware never rejects for a bad credential: it attaches the
//! anonymous principal and lets the gate decide. Only a store failure stops
//! the request (503).
//!
//! Handlers read the outcome through [`CurrentPrincipal`] (never rejects) or
//! [`OrganizationScope`] (runs the access gate).

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use wardgate_core::{
    authorize, Credential, CredentialError, Organization, OrganizationId, Principal,
    PrincipalKind, UserPrincipal,
};

use crate::error::AppError;
use crate::store::{CredentialStore, StoreError};

/// Header carrying an API key when `Authorization` is not used.
pub const API_KEY_HEADER: &str = "x-api-key";

// ── Credential extraction ───────────────────────────────────────────────────

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carrier {
    /// `Authorization: Bearer …`
    Bearer,
    /// `X-Api-Key: …`
    ApiKeyHeader,
}

impl Carrier {
    /// Return the string representation used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bearer => "bearer",
            Self::ApiKeyHeader => "x-api-key",
        }
    }
}

/// Outcome of inspecting request headers for a credential.
#[derive(Debug, PartialEq, Eq)]
pub enum ExtractedCredential {
    /// No carrier held a credential.
    Absent,
    /// A carrier held a value that is not a valid credential.
    Malformed {
        carrier: Carrier,
        reason: CredentialError,
    },
    /// A syntactically valid credential.
    Present {
        carrier: Carrier,
        credential: Credential,
    },
}

/// Inspect headers for a credential, in carrier priority order.
///
/// The `Authorization` scheme is read from the raw header bytes, so a Bearer
/// header whose value is not visible ASCII is still a Bearer carrier.
pub fn extract_credential(headers: &HeaderMap) -> ExtractedCredential {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let raw = value.as_bytes();
        let split = raw
            .iter()
            .position(u8::is_ascii_whitespace)
            .unwrap_or(raw.len());
        let (scheme, rest) = raw.split_at(split);
        if scheme.eq_ignore_ascii_case(b"bearer") {
            return classify(Carrier::Bearer, trim_ascii_start(rest));
        }
        tracing::debug!("authorization header uses a non-Bearer scheme; ignoring");
    }

    if let Some(value) = headers.get(API_KEY_HEADER) {
        return classify(Carrier::ApiKeyHeader, value.as_bytes());
    }

    ExtractedCredential::Absent
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

fn classify(carrier: Carrier, raw: &[u8]) -> ExtractedCredential {
    let parsed = match std::str::from_utf8(raw) {
        Ok(raw) => Credential::parse(raw),
        Err(e) => Err(CredentialError::InvalidCharacter {
            position: e.valid_up_to(),
        }),
    };
    match parsed {
        Ok(credential) => ExtractedCredential::Present {
            carrier,
            credential,
        },
        Err(reason) => ExtractedCredential::Malformed { carrier, reason },
    }
}

// ── Authenticator ───────────────────────────────────────────────────────────

/// Credential resolver injected into request extensions.
///
/// Custom `Debug` redacts the operator token to prevent credential leakage
/// in logs.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    operator_token: Option<String>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("store", &self.store)
            .field(
                "operator_token",
                &self.operator_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Authenticator {
    /// Create an authenticator over a credential store.
    pub fn new(store: Arc<dyn CredentialStore>, operator_token: Option<String>) -> Self {
        Self {
            store,
            operator_token,
        }
    }

    /// Resolve the principal for a request from its headers.
    ///
    /// Only a store failure is an error; every other outcome is a principal.
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<Principal, StoreError> {
        let (carrier, credential) = match extract_credential(headers) {
            ExtractedCredential::Absent => return Ok(Principal::Anonymous),
            ExtractedCredential::Malformed { carrier, reason } => {
                tracing::warn!(
                    carrier = carrier.as_str(),
                    reason = %reason,
                    "authentication failed: malformed credential"
                );
                return Ok(Principal::Anonymous);
            }
            ExtractedCredential::Present {
                carrier,
                credential,
            } => (carrier, credential),
        };

        if let Some(expected) = &self.operator_token {
            if credential.matches_secret(expected) {
                tracing::debug!(carrier = carrier.as_str(), "operator token accepted");
                return Ok(Principal::User(UserPrincipal::operator()));
            }
        }

        match self.store.resolve(&credential.digest()).await? {
            Some(organization) => {
                tracing::debug!(
                    carrier = carrier.as_str(),
                    organization_id = %organization.id,
                    "credential resolved to organization"
                );
                Ok(Principal::for_organization(organization))
            }
            None => {
                tracing::warn!(
                    carrier = carrier.as_str(),
                    "authentication failed: unknown credential"
                );
                Ok(Principal::Anonymous)
            }
        }
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Resolve the request's principal and attach it to request extensions.
///
/// When no [`Authenticator`] is installed every request is anonymous.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let authenticator = request.extensions().get::<Authenticator>().cloned();

    let principal = match authenticator {
        Some(authenticator) => match authenticator.resolve(request.headers()).await {
            Ok(principal) => principal,
            Err(err) => {
                tracing::error!(error = %err, "credential store lookup failed");
                return AppError::from(err).into_response();
            }
        },
        None => Principal::Anonymous,
    };

    request.extensions_mut().insert(principal);
    next.run(request).await
}

// ── Extractors ──────────────────────────────────────────────────────────────

/// The principal resolved for this request.
///
/// Never rejects: a request the middleware did not see is anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentPrincipal(pub Principal);

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CurrentPrincipal {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<Principal>()
                .cloned()
                .unwrap_or_default(),
        ))
    }
}

/// The organization an admitted request is scoped to.
///
/// Extracting this runs the access gate: 401 for an absent or anonymous
/// principal, 403 for an authenticated principal without an organization.
/// Handlers never learn which principal variant supplied the organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationScope {
    organization: Organization,
}

impl OrganizationScope {
    /// The organization to scope queries to.
    pub fn organization(&self) -> &Organization {
        &self.organization
    }

    /// Shorthand for `organization().id`.
    pub fn id(&self) -> &OrganizationId {
        &self.organization.id
    }
}

/// Run the access gate on an optional principal.
pub fn require_organization(principal: Option<&Principal>) -> Result<OrganizationScope, AppError> {
    match authorize(principal) {
        Ok(organization) => Ok(OrganizationScope {
            organization: organization.clone(),
        }),
        Err(denied) => {
            tracing::warn!(
                principal = %principal.map_or(PrincipalKind::Anonymous, Principal::kind),
                reason = %denied,
                "access denied"
            );
            Err(denied.into())
        }
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for OrganizationScope {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_organization(parts.extensions.get::<Principal>())
    }
}
