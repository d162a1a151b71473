//! # Middleware
//!
//! Request tracing. Credential resolution lives in [`crate::auth`].

pub mod tracing_layer;
