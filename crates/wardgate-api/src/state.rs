//! # Application State & Configuration
//!
//! [`AppState`] is shared with every route handler via the `State`
//! extractor. It holds the credential store and organization directory as
//! trait objects so the same router serves either backend.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::store::{CredentialStore, MemoryBackend, OrganizationDirectory, PostgresBackend};

// -- Configuration ------------------------------------------------------------

/// Errors reading configuration from the environment.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `PORT` is set but is not a valid port number.
    #[error("PORT must be a number between 1 and 65535, got '{0}'")]
    InvalidPort(String),
}

/// Application configuration.
///
/// Custom `Debug` redacts the operator token to prevent credential leakage
/// in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Secret that resolves to the operator user principal.
    /// If `None`, no operator principal can be resolved.
    pub operator_token: Option<String>,
    /// Path to a YAML seed manifest for the in-memory backend.
    pub seed_manifest: Option<PathBuf>,
    /// Postgres connection string. When set, Postgres backends are used.
    pub database_url: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "operator_token",
                &self.operator_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("seed_manifest", &self.seed_manifest)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            operator_token: None,
            seed_manifest: None,
            database_url: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORT` (default: 8080)
    /// - `OPERATOR_TOKEN` (optional; empty means unset)
    /// - `SEED_MANIFEST` (optional path)
    /// - `DATABASE_URL` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) if port != 0 => port,
                _ => return Err(ConfigError::InvalidPort(raw)),
            },
            None => AppConfig::default().port,
        };

        Ok(Self {
            port,
            operator_token: non_empty("OPERATOR_TOKEN"),
            seed_manifest: non_empty("SEED_MANIFEST").map(PathBuf::from),
            database_url: non_empty("DATABASE_URL"),
        })
    }
}

// -- AppState -----------------------------------------------------------------

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly: the backends sit behind `Arc`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Credential digest → organization lookup.
    pub credentials: Arc<dyn CredentialStore>,
    /// Organization-scoped queries.
    pub directory: Arc<dyn OrganizationDirectory>,
    /// Application configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Build state from explicit backends.
    pub fn new(
        config: AppConfig,
        credentials: Arc<dyn CredentialStore>,
        directory: Arc<dyn OrganizationDirectory>,
    ) -> Self {
        Self {
            credentials,
            directory,
            config,
        }
    }

    /// State over a single in-memory backend serving both roles.
    pub fn in_memory(config: AppConfig, backend: MemoryBackend) -> Self {
        let backend = Arc::new(backend);
        Self::new(config, backend.clone(), backend)
    }

    /// State over Postgres serving both roles.
    pub fn postgres(config: AppConfig, backend: PostgresBackend) -> Self {
        let backend = Arc::new(backend);
        Self::new(config, backend.clone(), backend)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory(AppConfig::default(), MemoryBackend::new())
    }
}
