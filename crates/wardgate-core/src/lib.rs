#![deny(missing_docs)]

//! # wardgate-core: Foundational Types for wardgate
//!
//! wardgate authenticates requests made on behalf of an *organization*
//! (a hospital) rather than a stored user. A bearer credential resolves to
//! the organization, the organization is wrapped in a synthetic principal
//! that is always authenticated, and an access gate admits requests whose
//! principal carries an organization reference.
//!
//! This crate holds the framework-agnostic half of that flow. It has no
//! internal crate dependencies and knows nothing about HTTP.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** You cannot pass a [`DependentId`]
//!    where an [`OrganizationId`] is expected.
//!
//! 2. **Credentials are never stored in plaintext.** A [`Credential`] is
//!    reduced to a [`CredentialDigest`] (SHA-256) before any lookup, and its
//!    `Debug` output is redacted.
//!
//! 3. **One principal type.** [`Principal`] is a tagged variant over the
//!    anonymous, user, and synthetic organization principals. Code written
//!    against [`PrincipalCapabilities`] does not care which variant it holds.
//!
//! 4. **The gate is a single function.** [`authorize`] is the only place that
//!    decides organization access.

pub mod access;
pub mod credential;
pub mod error;
pub mod identity;
pub mod organization;
pub mod principal;

// Re-export primary types at crate root for ergonomic imports.
pub use access::{authorize, AccessDenied};
pub use credential::{Credential, CredentialDigest, MAX_CREDENTIAL_LEN};
pub use error::{CredentialError, ValidationError};
pub use identity::{DependentId, OrganizationId};
pub use organization::{Dependent, Organization};
pub use principal::{
    OrganizationPrincipal, Principal, PrincipalCapabilities, PrincipalKind, UserPrincipal,
};
