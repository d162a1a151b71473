//! In-memory backend.
//!
//! Holds organizations, dependents, and credential digests in
//! `parking_lot::RwLock` maps. Locks are never held across `.await`.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use wardgate_core::organization::sort_for_listing;
use wardgate_core::{CredentialDigest, Dependent, DependentId, Organization, OrganizationId};

use super::{CredentialStore, OrganizationDirectory, StoreError};

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// `parking_lot::RwLock` is non-poisonable: a panicking writer does not
/// permanently corrupt the store.
#[derive(Debug)]
pub struct Store<K, T> {
    data: Arc<RwLock<HashMap<K, T>>>,
}

impl<K, T> Clone for Store<K, T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K: Eq + Hash, T: Clone> Store<K, T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, key: K, value: T) -> Option<T> {
        self.data.write().insert(key, value)
    }

    /// Retrieve a record by key.
    pub fn get(&self, key: &K) -> Option<T> {
        self.data.read().get(key).cloned()
    }

    /// Collect every record matching `pred`.
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|v| pred(v))
            .cloned()
            .collect()
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash, T: Clone> Default for Store<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- MemoryBackend -------------------------------------------------------------

/// Credential store and organization directory backed by process memory.
///
/// Clones share the same underlying maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    organizations: Store<OrganizationId, Organization>,
    dependents: Store<DependentId, Dependent>,
    credentials: Store<CredentialDigest, OrganizationId>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an organization.
    pub fn insert_organization(&self, organization: Organization) -> Option<Organization> {
        self.organizations.insert(organization.id, organization)
    }

    /// Add or replace a dependent.
    ///
    /// Fails if the owning organization is not present.
    pub fn insert_dependent(&self, dependent: Dependent) -> Result<(), StoreError> {
        if self.organizations.get(&dependent.organization_id).is_none() {
            return Err(StoreError::Corrupt(format!(
                "dependent {} references unknown organization {}",
                dependent.id, dependent.organization_id
            )));
        }
        self.dependents.insert(dependent.id, dependent);
        Ok(())
    }

    /// Bind a credential digest to an organization.
    ///
    /// Returns the organization the digest was previously bound to, if any.
    pub fn register_credential(
        &self,
        digest: CredentialDigest,
        organization: OrganizationId,
    ) -> Result<Option<OrganizationId>, StoreError> {
        if self.organizations.get(&organization).is_none() {
            return Err(StoreError::Corrupt(format!(
                "credential {digest} references unknown organization {organization}"
            )));
        }
        Ok(self.credentials.insert(digest, organization))
    }

    /// Number of organizations held.
    pub fn organization_count(&self) -> usize {
        self.organizations.len()
    }

    /// Number of active credentials held.
    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryBackend {
    async fn resolve(&self, digest: &CredentialDigest) -> Result<Option<Organization>, StoreError> {
        let Some(organization_id) = self.credentials.get(digest) else {
            return Ok(None);
        };
        self.organizations
            .get(&organization_id)
            .map(Some)
            .ok_or_else(|| {
                StoreError::Corrupt(format!(
                    "credential {digest} bound to missing organization {organization_id}"
                ))
            })
    }
}

#[async_trait]
impl OrganizationDirectory for MemoryBackend {
    async fn organization(&self, id: &OrganizationId) -> Result<Option<Organization>, StoreError> {
        Ok(self.organizations.get(id))
    }

    async fn dependents(&self, organization: &OrganizationId) -> Result<Vec<Dependent>, StoreError> {
        let mut list = self.dependents.filter(|d| d.belongs_to(organization));
        sort_for_listing(&mut list);
        Ok(list)
    }

    async fn dependent(
        &self,
        organization: &OrganizationId,
        id: &DependentId,
    ) -> Result<Option<Dependent>, StoreError> {
        Ok(self.dependents.get(id).filter(|d| d.belongs_to(organization)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wardgate_core::Credential;

    fn digest(raw: &str) -> CredentialDigest {
        Credential::parse(raw).unwrap().digest()
    }

    fn seeded() -> (MemoryBackend, Organization, Organization) {
        let backend = MemoryBackend::new();
        let h1 = Organization::new(OrganizationId::new(), "H1");
        let h2 = Organization::new(OrganizationId::new(), "H2");
        backend.insert_organization(h1.clone());
        backend.insert_organization(h2.clone());
        backend
            .register_credential(digest("hosp-key-123"), h1.id)
            .unwrap();
        backend.register_credential(digest("h2-key"), h2.id).unwrap();
        (backend, h1, h2)
    }

    fn patient(org: OrganizationId, name: &str) -> Dependent {
        Dependent {
            id: DependentId::new(),
            organization_id: org,
            display_name: name.to_string(),
            admitted_at: Utc::now(),
        }
    }

    #[test]
    fn store_clone_shares_data() {
        let store: Store<u8, String> = Store::new();
        let clone = store.clone();
        store.insert(1, "a".into());
        assert_eq!(clone.get(&1).as_deref(), Some("a"));
        assert_eq!(clone.len(), 1);
        assert!(!store.is_empty());
    }

    #[tokio::test]
    async fn resolves_registered_credential() {
        let (backend, h1, _) = seeded();
        let resolved = backend.resolve(&digest("hosp-key-123")).await.unwrap();
        assert_eq!(resolved, Some(h1));
    }

    #[tokio::test]
    async fn unknown_credential_resolves_to_none() {
        let (backend, _, _) = seeded();
        assert_eq!(backend.resolve(&digest("unknown-key")).await.unwrap(), None);
    }

    #[test]
    fn register_credential_requires_known_organization() {
        let backend = MemoryBackend::new();
        let err = backend
            .register_credential(digest("k"), OrganizationId::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn insert_dependent_requires_known_organization() {
        let backend = MemoryBackend::new();
        let err = backend
            .insert_dependent(patient(OrganizationId::new(), "orphan"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[tokio::test]
    async fn dependents_are_scoped_to_organization() {
        let (backend, h1, h2) = seeded();
        backend.insert_dependent(patient(h1.id, "Jane")).unwrap();
        backend.insert_dependent(patient(h1.id, "John")).unwrap();
        backend.insert_dependent(patient(h2.id, "Other")).unwrap();

        let list = backend.dependents(&h1.id).await.unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|d| d.organization_id == h1.id));
    }

    #[tokio::test]
    async fn dependent_lookup_does_not_cross_organizations() {
        let (backend, h1, h2) = seeded();
        let foreign = patient(h2.id, "Other");
        backend.insert_dependent(foreign.clone()).unwrap();

        assert_eq!(backend.dependent(&h1.id, &foreign.id).await.unwrap(), None);
        assert_eq!(
            backend.dependent(&h2.id, &foreign.id).await.unwrap(),
            Some(foreign)
        );
    }

    #[tokio::test]
    async fn organization_lookup() {
        let (backend, h1, _) = seeded();
        assert_eq!(backend.organization(&h1.id).await.unwrap(), Some(h1));
        assert_eq!(
            backend.organization(&OrganizationId::new()).await.unwrap(),
            None
        );
        assert_eq!(backend.organization_count(), 2);
    }
}
