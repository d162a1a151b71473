//! # Identifier Newtypes
//!
//! Every identifier is a distinct type wrapping a UUID. Parsing from strings
//! goes through [`std::str::FromStr`] and reports [`ValidationError`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// OrganizationId
// ---------------------------------------------------------------------------

/// Identifier of an organization (hospital) that API credentials resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(Uuid);

impl OrganizationId {
    /// Create a new random organization identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an organization identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrganizationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OrganizationId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid(s).map(Self)
    }
}

// ---------------------------------------------------------------------------
// DependentId
// ---------------------------------------------------------------------------

/// Identifier of a dependent record (patient) owned by an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependentId(Uuid);

impl DependentId {
    /// Create a new random dependent identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a dependent identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DependentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DependentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DependentId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uuid(s).map(Self)
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(s.trim()).map_err(|e| ValidationError::InvalidIdentifier {
        value: s.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organization_ids_are_unique() {
        assert_ne!(OrganizationId::new(), OrganizationId::new());
    }

    #[test]
    fn organization_id_round_trips_through_display() {
        let id = OrganizationId::new();
        let parsed: OrganizationId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn dependent_id_rejects_garbage() {
        let err = "patient-7".parse::<DependentId>().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidIdentifier { .. }));
    }

    #[test]
    fn ids_serialize_as_bare_uuid_strings() {
        let uuid = Uuid::parse_str("6f9619ff-8b86-d011-b42d-00c04fc964ff").unwrap();
        let id = OrganizationId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"6f9619ff-8b86-d011-b42d-00c04fc964ff\"");
        assert_eq!(id.as_uuid(), &uuid);
    }
}
