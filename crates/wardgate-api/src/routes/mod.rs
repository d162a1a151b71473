//! # API Routes
//!
//! - [`principal`]: who the request resolved to (ungated).
//! - [`organization`]: organization-scoped resources (gated).

pub mod organization;
pub mod principal;
