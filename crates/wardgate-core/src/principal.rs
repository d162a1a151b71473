//! # Request Principals
//!
//! The principal is the entity a request acts on behalf of. It is a tagged
//! variant:
//!
//! | Variant          | `is_authenticated` | `organization`            |
//! |------------------|--------------------|---------------------------|
//! | `Anonymous`      | false              | `None`                    |
//! | `User`           | true               | whatever the user carries |
//! | `Organization`   | true               | always `Some`             |
//!
//! The `Organization` variant is the synthetic principal: built in memory
//! from a resolved [`Organization`], alive for one request, never persisted.
//! Each variant implements [`PrincipalCapabilities`], and so does the
//! [`Principal`] enum itself, so downstream code depends only on the
//! capability set.

use serde::{Deserialize, Serialize};

use crate::organization::Organization;

/// The capability set every principal variant exposes.
pub trait PrincipalCapabilities {
    /// Whether the principal was resolved by authentication.
    fn is_authenticated(&self) -> bool;

    /// The organization this principal acts for, if any.
    fn organization(&self) -> Option<&Organization>;
}

// ── Variants ────────────────────────────────────────────────────────────────

/// A framework-level authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPrincipal {
    /// Stable user identifier.
    pub user_id: String,
    /// Organization the user belongs to, if any.
    pub organization: Option<Organization>,
}

impl UserPrincipal {
    /// User id assigned to the principal resolved from the operator token.
    pub const OPERATOR_ID: &'static str = "operator";

    /// The operator user: authenticated, bound to no organization.
    pub fn operator() -> Self {
        Self {
            user_id: Self::OPERATOR_ID.to_string(),
            organization: None,
        }
    }
}

impl PrincipalCapabilities for UserPrincipal {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn organization(&self) -> Option<&Organization> {
        self.organization.as_ref()
    }
}

/// Synthetic principal acting on behalf of an organization.
///
/// It has no identity of its own beyond the organization. The field is
/// private so the only way to build one is [`OrganizationPrincipal::new`],
/// which requires a resolved organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationPrincipal {
    organization: Organization,
}

impl OrganizationPrincipal {
    /// Wrap a resolved organization.
    pub fn new(organization: Organization) -> Self {
        Self { organization }
    }

    /// The organization this principal acts for.
    pub fn organization(&self) -> &Organization {
        &self.organization
    }
}

impl PrincipalCapabilities for OrganizationPrincipal {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn organization(&self) -> Option<&Organization> {
        Some(&self.organization)
    }
}

// ── Principal ───────────────────────────────────────────────────────────────

/// The principal resolved for a request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Principal {
    /// No credential, or a credential that did not resolve.
    #[default]
    Anonymous,
    /// A framework-level authenticated user.
    User(UserPrincipal),
    /// Synthetic principal resolved from an organization credential.
    Organization(OrganizationPrincipal),
}

/// Discriminant of [`Principal`], for logs and API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    /// [`Principal::Anonymous`].
    Anonymous,
    /// [`Principal::User`].
    User,
    /// [`Principal::Organization`].
    Organization,
}

impl PrincipalKind {
    /// Return the string representation of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::User => "user",
            Self::Organization => "organization",
        }
    }
}

impl std::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Principal {
    /// Build the synthetic principal for a resolved organization.
    pub fn for_organization(organization: Organization) -> Self {
        Self::Organization(OrganizationPrincipal::new(organization))
    }

    /// Which variant this is.
    pub fn kind(&self) -> PrincipalKind {
        match self {
            Self::Anonymous => PrincipalKind::Anonymous,
            Self::User(_) => PrincipalKind::User,
            Self::Organization(_) => PrincipalKind::Organization,
        }
    }
}

impl PrincipalCapabilities for Principal {
    fn is_authenticated(&self) -> bool {
        match self {
            Self::Anonymous => false,
            Self::User(user) => user.is_authenticated(),
            Self::Organization(org) => PrincipalCapabilities::is_authenticated(org),
        }
    }

    fn organization(&self) -> Option<&Organization> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => PrincipalCapabilities::organization(user),
            Self::Organization(org) => PrincipalCapabilities::organization(org),
        }
    }
}
