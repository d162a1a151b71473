//! # Credential Store & Organization Directory
//!
//! The two collaborators the authentication flow reads from:
//!
//! - [`CredentialStore`] maps a credential digest to the organization it was
//!   provisioned for.
//! - [`OrganizationDirectory`] answers organization-scoped queries (the
//!   organization record and its dependents).
//!
//! Both are read-only from this service's perspective and must tolerate
//! concurrent reads. Two backends are provided: [`MemoryBackend`] (seeded
//! from a manifest, used in development and tests) and [`PostgresBackend`].

pub mod memory;
pub mod postgres;

pub use memory::MemoryBackend;
pub use postgres::PostgresBackend;

use async_trait::async_trait;
use thiserror::Error;
use wardgate_core::{CredentialDigest, Dependent, DependentId, Organization, OrganizationId};

/// Failures reading from a backing store.
///
/// A credential that simply does not match is not an error; lookups return
/// `Ok(None)` for that.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The database driver reported a failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store returned data that violates its own invariants.
    #[error("corrupt store data: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether the failure is a connectivity problem rather than bad data.
    ///
    /// Decode and row-shape errors are corrupt data, not an outage.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Database(err) => matches!(
                err,
                sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::WorkerCrashed
            ),
            Self::Corrupt(_) => false,
        }
    }
}

/// Lookup from credential digest to organization.
#[async_trait]
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    /// Resolve a credential digest to the organization it belongs to.
    ///
    /// Returns `Ok(None)` when no active credential has this digest.
    async fn resolve(&self, digest: &CredentialDigest) -> Result<Option<Organization>, StoreError>;
}

/// Organization-scoped queries.
#[async_trait]
pub trait OrganizationDirectory: Send + Sync + std::fmt::Debug {
    /// Fetch an organization record.
    async fn organization(&self, id: &OrganizationId) -> Result<Option<Organization>, StoreError>;

    /// List the dependents owned by `organization`, oldest admission first.
    async fn dependents(&self, organization: &OrganizationId) -> Result<Vec<Dependent>, StoreError>;

    /// Fetch one dependent, only if it belongs to `organization`.
    async fn dependent(
        &self,
        organization: &OrganizationId,
        id: &DependentId,
    ) -> Result<Option<Dependent>, StoreError> {
        Ok(self
            .dependents(organization)
            .await?
            .into_iter()
            .find(|d| &d.id == id))
    }
}
