//! # Organization Access Gate
//!
//! A request may touch organization-scoped data iff its principal exists
//! and carries an organization reference. Nothing else is consulted: there
//! are no roles among organization principals.

use thiserror::Error;

use crate::organization::Organization;
use crate::principal::PrincipalCapabilities;

/// Why the gate refused a principal.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// No principal, or one that is not authenticated.
    #[error("authentication required")]
    Unauthenticated,

    /// The principal is authenticated but acts for no organization.
    #[error("principal is not bound to an organization")]
    NoOrganization,
}

/// Decide whether `principal` may access organization-scoped data.
///
/// Returns the organization to scope queries to.
pub fn authorize<P>(principal: Option<&P>) -> Result<&Organization, AccessDenied>
where
    P: PrincipalCapabilities + ?Sized,
{
    let principal = principal.ok_or(AccessDenied::Unauthenticated)?;
    match principal.organization() {
        Some(organization) => Ok(organization),
        None if principal.is_authenticated() => Err(AccessDenied::NoOrganization),
        None => Err(AccessDenied::Unauthenticated),
    }
}
