//! # Startup Bootstrap
//!
//! Builds the [`AppState`] the server runs with.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Pick backend**: Postgres when a pool is supplied, otherwise in-memory.
//! 2. **Load seed manifest**: in-memory mode only; parse YAML and validate
//!    the whole document, collecting every error before failing.
//! 3. **Seed**: organizations first, then dependents, then credential
//!    digests. Plaintext keys are hashed here and then dropped.
//! 4. **Log banner**: structured startup summary.
//!
//! With neither a database nor `SEED_MANIFEST`, the server starts with an
//! empty in-memory backend: every credential is unknown and only the
//! operator token (if configured) resolves.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use wardgate_core::{Credential, CredentialDigest, Dependent, DependentId, Organization, OrganizationId};

use crate::state::{AppConfig, AppState};
use crate::store::{MemoryBackend, PostgresBackend, StoreError};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors during bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Seed manifest file not found at the given path.
    #[error("seed manifest not found: {path}")]
    ManifestNotFound { path: String },

    /// Seed manifest is not valid YAML for the expected shape.
    #[error("seed manifest could not be parsed: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Seed manifest parsed but failed validation.
    #[error("invalid seed manifest: {errors:?}")]
    InvalidManifest { errors: Vec<String> },

    /// The backend rejected seed data.
    #[error("seeding failed: {0}")]
    Store(#[from] StoreError),

    /// IO error during bootstrap.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Manifest shape
// ---------------------------------------------------------------------------

/// Top-level seed manifest.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedManifest {
    #[serde(default)]
    pub organizations: Vec<SeedOrganization>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedOrganization {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub credentials: Vec<SeedCredential>,
    #[serde(default)]
    pub dependents: Vec<SeedDependent>,
}

/// Exactly one of `key` (plaintext) or `key_sha256` (hex digest) must be set.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCredential {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub key_sha256: Option<String>,
}

impl std::fmt::Debug for SeedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedCredential")
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .field("key_sha256", &self.key_sha256)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedDependent {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub display_name: String,
    #[serde(default)]
    pub admitted_at: Option<DateTime<Utc>>,
}

/// Validated, ready-to-insert seed data.
#[derive(Debug, Default)]
pub struct SeedPlan {
    pub organizations: Vec<Organization>,
    pub dependents: Vec<Dependent>,
    pub credentials: Vec<(CredentialDigest, OrganizationId)>,
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

/// Read and parse a seed manifest from disk.
pub fn load_manifest(path: &Path) -> Result<SeedManifest, BootstrapError> {
    if !path.exists() {
        return Err(BootstrapError::ManifestNotFound {
            path: path.display().to_string(),
        });
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&raw)?)
}

impl SeedManifest {
    /// Validate the manifest into a [`SeedPlan`].
    ///
    /// Dependents without `admitted_at` are stamped with `now`. Dependents
    /// without `id` get a fresh one.
    pub fn validate(self, now: DateTime<Utc>) -> Result<SeedPlan, BootstrapError> {
        let mut errors = Vec::new();
        let mut plan = SeedPlan::default();
        let mut seen_orgs = HashSet::new();
        let mut seen_dependents = HashSet::new();
        let mut digest_owner: HashMap<CredentialDigest, OrganizationId> = HashMap::new();

        for (i, org) in self.organizations.into_iter().enumerate() {
            let org_id = OrganizationId::from_uuid(org.id);
            let at = format!("organizations[{i}] ({org_id})");

            if !seen_orgs.insert(org_id) {
                errors.push(format!("{at}: duplicate organization id"));
            }
            if org.name.trim().is_empty() {
                errors.push(format!("{at}: name must not be empty"));
            }

            for (j, cred) in org.credentials.iter().enumerate() {
                let digest = match credential_digest(cred) {
                    Ok(digest) => digest,
                    Err(reason) => {
                        errors.push(format!("{at}.credentials[{j}]: {reason}"));
                        continue;
                    }
                };
                match digest_owner.get(&digest) {
                    Some(owner) if *owner != org_id => errors.push(format!(
                        "{at}.credentials[{j}]: credential already assigned to organization {owner}"
                    )),
                    Some(_) => {}
                    None => {
                        digest_owner.insert(digest, org_id);
                        plan.credentials.push((digest, org_id));
                    }
                }
            }

            for (j, dep) in org.dependents.into_iter().enumerate() {
                if dep.display_name.trim().is_empty() {
                    errors.push(format!("{at}.dependents[{j}]: display_name must not be empty"));
                }
                let id = dep.id.map(DependentId::from_uuid).unwrap_or_default();
                if !seen_dependents.insert(id) {
                    errors.push(format!("{at}.dependents[{j}]: duplicate dependent id {id}"));
                }
                plan.dependents.push(Dependent {
                    id,
                    organization_id: org_id,
                    display_name: dep.display_name,
                    admitted_at: dep.admitted_at.unwrap_or(now),
                });
            }

            plan.organizations.push(Organization::new(org_id, org.name));
        }

        if errors.is_empty() {
            Ok(plan)
        } else {
            Err(BootstrapError::InvalidManifest { errors })
        }
    }
}

fn credential_digest(cred: &SeedCredential) -> Result<CredentialDigest, String> {
    match (&cred.key, &cred.key_sha256) {
        (Some(key), None) => Credential::parse(key)
            .map(|c| c.digest())
            .map_err(|e| format!("malformed key: {e}")),
        (None, Some(hex)) => CredentialDigest::from_hex(hex).map_err(|e| e.to_string()),
        (None, None) => Err("one of key or key_sha256 is required".into()),
        (Some(_), Some(_)) => Err("key and key_sha256 are mutually exclusive".into()),
    }
}

/// Insert a validated plan into an in-memory backend.
pub fn seed(backend: &MemoryBackend, plan: SeedPlan) -> Result<(), StoreError> {
    for organization in plan.organizations {
        backend.insert_organization(organization);
    }
    for dependent in plan.dependents {
        backend.insert_dependent(dependent)?;
    }
    for (digest, organization) in plan.credentials {
        backend.register_credential(digest, organization)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Build the application state.
///
/// A supplied pool selects the Postgres backends; `SEED_MANIFEST` is then
/// ignored. Otherwise the in-memory backend is seeded from the manifest,
/// if one is configured.
pub fn bootstrap(config: AppConfig, db_pool: Option<PgPool>) -> Result<AppState, BootstrapError> {
    let operator_enabled = config.operator_token.is_some();

    if let Some(pool) = db_pool {
        if let Some(path) = &config.seed_manifest {
            tracing::warn!(
                path = %path.display(),
                "SEED_MANIFEST ignored: credentials are read from PostgreSQL"
            );
        }
        tracing::info!(backend = "postgres", operator_enabled, "wardgate bootstrapped");
        return Ok(AppState::postgres(config, PostgresBackend::new(pool)));
    }

    let backend = MemoryBackend::new();
    if let Some(path) = &config.seed_manifest {
        let plan = load_manifest(path)?.validate(Utc::now())?;
        seed(&backend, plan)?;
        tracing::info!(path = %path.display(), "seed manifest loaded");
    } else {
        tracing::warn!("SEED_MANIFEST not set: starting with no organizations");
    }

    tracing::info!(
        backend = "memory",
        organizations = backend.organization_count(),
        credentials = backend.credential_count(),
        operator_enabled,
        "wardgate bootstrapped"
    );
    Ok(AppState::in_memory(config, backend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const H1: &str = "6f9619ff-8b86-d011-b42d-00c04fc964ff";
    const H2: &str = "1b4e28ba-2fa1-11d2-883f-0016d3cca427";

    fn write_manifest(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    fn parse(body: &str) -> SeedManifest {
        serde_yaml::from_str(body).unwrap()
    }

    fn errors_of(result: Result<SeedPlan, BootstrapError>) -> Vec<String> {
        match result {
            Err(BootstrapError::InvalidManifest { errors }) => errors,
            other => panic!("expected InvalidManifest, got {other:?}"),
        }
    }

    #[test]
    fn valid_manifest_produces_plan() {
        let manifest = parse(&format!(
            r#"
organizations:
  - id: {H1}
    name: St. Mary's Hospital
    credentials:
      - key: hosp-key-123
      - key_sha256: {hex}
    dependents:
      - display_name: Jane Doe
        admitted_at: 2024-03-01T09:00:00Z
      - display_name: John Roe
"#,
            hex = "ab".repeat(32)
        ));
        let now = Utc::now();
        let plan = manifest.validate(now).unwrap();
        assert_eq!(plan.organizations.len(), 1);
        assert_eq!(plan.organizations[0].name, "St. Mary's Hospital");
        assert_eq!(plan.credentials.len(), 2);
        assert_eq!(
            plan.credentials[0].0,
            Credential::parse("hosp-key-123").unwrap().digest()
        );
        assert_eq!(plan.dependents.len(), 2);
        assert_eq!(plan.dependents[1].admitted_at, now);
    }

    #[test]
    fn empty_manifest_is_valid() {
        let plan = parse("organizations: []").validate(Utc::now()).unwrap();
        assert!(plan.organizations.is_empty());
    }

    #[test]
    fn collects_every_error() {
        let manifest = parse(&format!(
            r#"
organizations:
  - id: {H1}
    name: ""
    credentials:
      - {{}}
      - key: "has space"
      - key: a
        key_sha256: {hex}
      - key_sha256: nothex
  - id: {H1}
    name: Duplicate
"#,
            hex = "00".repeat(32)
        ));
        let errors = errors_of(manifest.validate(Utc::now()));
        assert_eq!(errors.len(), 6, "{errors:#?}");
        assert!(errors.iter().any(|e| e.contains("duplicate organization id")));
        assert!(errors.iter().any(|e| e.contains("name must not be empty")));
        assert!(errors.iter().any(|e| e.contains("is required")));
        assert!(errors.iter().any(|e| e.contains("malformed key")));
        assert!(errors.iter().any(|e| e.contains("mutually exclusive")));
    }

    #[test]
    fn signed_hex_digest_is_rejected() {
        let manifest = parse(&format!(
            "organizations:\n  - id: {H1}\n    name: H1\n    credentials:\n      - key_sha256: \"{hex}\"\n",
            hex = "+a".repeat(32)
        ));
        let errors = errors_of(manifest.validate(Utc::now()));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("invalid credential digest"), "{}", errors[0]);
    }

    #[test]
    fn same_credential_for_two_organizations_is_rejected() {
        let manifest = parse(&format!(
            r#"
organizations:
  - id: {H1}
    name: H1
    credentials: [{{ key: shared }}]
  - id: {H2}
    name: H2
    credentials: [{{ key: shared }}]
"#
        ));
        let errors = errors_of(manifest.validate(Utc::now()));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("already assigned"));
        assert!(!errors[0].contains("shared"), "plaintext leaked: {}", errors[0]);
    }

    #[test]
    fn repeated_credential_within_one_organization_is_tolerated() {
        let manifest = parse(&format!(
            r#"
organizations:
  - id: {H1}
    name: H1
    credentials: [{{ key: k1 }}, {{ key: k1 }}]
"#
        ));
        let plan = manifest.validate(Utc::now()).unwrap();
        assert_eq!(plan.credentials.len(), 1);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<SeedManifest, _> =
            serde_yaml::from_str(&format!("organizations:\n  - id: {H1}\n    name: H1\n    secret: x\n"));
        assert!(result.is_err());
    }

    #[test]
    fn missing_manifest_file() {
        let err = load_manifest(Path::new("/nonexistent/wardgate-seed.yaml")).unwrap_err();
        assert!(matches!(err, BootstrapError::ManifestNotFound { .. }));
    }

    #[test]
    fn unparseable_manifest_file() {
        let file = write_manifest("organizations: {not: a list");
        assert!(matches!(
            load_manifest(file.path()).unwrap_err(),
            BootstrapError::Parse(_)
        ));
    }

    #[tokio::test]
    async fn bootstrap_seeds_memory_backend() {
        let file = write_manifest(&format!(
            r#"
organizations:
  - id: {H1}
    name: H1
    credentials: [{{ key: hosp-key-123 }}]
    dependents: [{{ display_name: Jane Doe }}]
"#
        ));
        let config = AppConfig {
            seed_manifest: Some(file.path().to_path_buf()),
            ..AppConfig::default()
        };
        let state = bootstrap(config, None).unwrap();

        let digest = Credential::parse("hosp-key-123").unwrap().digest();
        let org = state.credentials.resolve(&digest).await.unwrap().unwrap();
        assert_eq!(org.id.to_string(), H1);
        assert_eq!(state.directory.dependents(&org.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bootstrap_without_manifest_is_empty() {
        let state = bootstrap(AppConfig::default(), None).unwrap();
        let digest = Credential::parse("hosp-key-123").unwrap().digest();
        assert!(state.credentials.resolve(&digest).await.unwrap().is_none());
    }

    #[test]
    fn bootstrap_reports_invalid_manifest() {
        let file = write_manifest(&format!("organizations:\n  - id: {H1}\n    name: \"\"\n"));
        let config = AppConfig {
            seed_manifest: Some(file.path().to_path_buf()),
            ..AppConfig::default()
        };
        assert!(matches!(
            bootstrap(config, None).unwrap_err(),
            BootstrapError::InvalidManifest { .. }
        ));
    }

    #[test]
    fn seed_credential_debug_redacts_key() {
        let cred = SeedCredential {
            key: Some("hosp-key-123".into()),
            key_sha256: None,
        };
        assert!(!format!("{cred:?}").contains("hosp-key-123"));
    }
}
