//! # Organizations and Dependents
//!
//! An [`Organization`] is the business entity a synthetic principal is scoped
//! to (a hospital). A [`Dependent`] is a record owned by exactly one
//! organization (a patient). The authentication flow reads both and never
//! mutates either.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{DependentId, OrganizationId};

/// An organization that API credentials resolve to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Organization {
    /// Stable identifier.
    pub id: OrganizationId,
    /// Display name, e.g. "St. Mary's Hospital".
    pub name: String,
}

impl Organization {
    /// Create an organization record.
    pub fn new(id: OrganizationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A record owned by a single organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependent {
    /// Stable identifier.
    pub id: DependentId,
    /// The organization that owns this record.
    pub organization_id: OrganizationId,
    /// Display name of the dependent.
    pub display_name: String,
    /// When the dependent was admitted to the organization.
    pub admitted_at: DateTime<Utc>,
}

impl Dependent {
    /// Whether this record belongs to the given organization.
    pub fn belongs_to(&self, organization: &OrganizationId) -> bool {
        &self.organization_id == organization
    }
}

/// Order dependents for listing: oldest admission first, ties broken by id.
///
/// Every directory backend returns dependents in this order so that
/// listings are stable regardless of storage.
pub fn sort_for_listing(dependents: &mut [Dependent]) {
    dependents.sort_by(|a, b| {
        a.admitted_at
            .cmp(&b.admitted_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dependent(org: OrganizationId, name: &str, hour: u32) -> Dependent {
        Dependent {
            id: DependentId::new(),
            organization_id: org,
            display_name: name.to_string(),
            admitted_at: Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn belongs_to_matches_owner_only() {
        let h1 = OrganizationId::new();
        let h2 = OrganizationId::new();
        let d = dependent(h1, "Jane Doe", 9);
        assert!(d.belongs_to(&h1));
        assert!(!d.belongs_to(&h2));
    }

    #[test]
    fn listing_order_is_by_admission() {
        let org = OrganizationId::new();
        let mut list = vec![
            dependent(org, "late", 15),
            dependent(org, "early", 8),
            dependent(org, "mid", 11),
        ];
        sort_for_listing(&mut list);
        let names: Vec<&str> = list.iter().map(|d| d.display_name.as_str()).collect();
        assert_eq!(names, ["early", "mid", "late"]);
    }

    #[test]
    fn listing_order_breaks_ties_by_id() {
        let org = OrganizationId::new();
        let mut list = vec![dependent(org, "a", 9), dependent(org, "b", 9)];
        sort_for_listing(&mut list);
        assert!(list[0].id < list[1].id);
    }
}
