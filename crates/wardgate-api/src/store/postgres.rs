//! Postgres backend.
//!
//! Credentials are stored by SHA-256 digest in `api_credentials`; a row with
//! `revoked_at` set never resolves. The schema lives in `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use wardgate_core::{CredentialDigest, Dependent, DependentId, Organization, OrganizationId};

use super::{CredentialStore, OrganizationDirectory, StoreError};

/// Credential store and organization directory backed by Postgres.
#[derive(Debug, Clone)]
pub struct PostgresBackend(PgPool);

impl PostgresBackend {
    /// Create a backend over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self(pool)
    }
}

/// Active credential lookup. Revoked rows are filtered in SQL.
const RESOLVE_CREDENTIAL_SQL: &str = "SELECT o.id, o.name \
     FROM api_credentials c \
     JOIN organizations o ON o.id = c.organization_id \
     WHERE c.key_sha256 = $1 AND c.revoked_at IS NULL";

#[derive(sqlx::FromRow)]
struct OrganizationRow {
    id: Uuid,
    name: String,
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Organization::new(OrganizationId::from_uuid(row.id), row.name)
    }
}

#[derive(sqlx::FromRow)]
struct DependentRow {
    id: Uuid,
    organization_id: Uuid,
    display_name: String,
    admitted_at: DateTime<Utc>,
}

impl From<DependentRow> for Dependent {
    fn from(row: DependentRow) -> Self {
        Dependent {
            id: DependentId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            display_name: row.display_name,
            admitted_at: row.admitted_at,
        }
    }
}

#[async_trait]
impl CredentialStore for PostgresBackend {
    #[tracing::instrument(name = "Resolve API credential", level = tracing::Level::DEBUG, skip_all)]
    async fn resolve(&self, digest: &CredentialDigest) -> Result<Option<Organization>, StoreError> {
        let row = sqlx::query_as::<_, OrganizationRow>(RESOLVE_CREDENTIAL_SQL)
            .bind(digest.to_hex())
            .fetch_optional(&self.0)
            .await?;

        Ok(row.map(Organization::from))
    }
}

#[async_trait]
impl OrganizationDirectory for PostgresBackend {
    async fn organization(&self, id: &OrganizationId) -> Result<Option<Organization>, StoreError> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            "SELECT id, name FROM organizations WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.0)
        .await?;

        Ok(row.map(Organization::from))
    }

    async fn dependents(&self, organization: &OrganizationId) -> Result<Vec<Dependent>, StoreError> {
        let rows = sqlx::query_as::<_, DependentRow>(
            "SELECT id, organization_id, display_name, admitted_at \
             FROM dependents \
             WHERE organization_id = $1 \
             ORDER BY admitted_at ASC, id ASC",
        )
        .bind(*organization.as_uuid())
        .fetch_all(&self.0)
        .await?;

        Ok(rows.into_iter().map(Dependent::from).collect())
    }

    async fn dependent(
        &self,
        organization: &OrganizationId,
        id: &DependentId,
    ) -> Result<Option<Dependent>, StoreError> {
        let row = sqlx::query_as::<_, DependentRow>(
            "SELECT id, organization_id, display_name, admitted_at \
             FROM dependents \
             WHERE organization_id = $1 AND id = $2",
        )
        .bind(*organization.as_uuid())
        .bind(*id.as_uuid())
        .fetch_optional(&self.0)
        .await?;

        Ok(row.map(Dependent::from))
    }
}
