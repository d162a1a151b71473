//! # Error Hierarchy
//!
//! Structured error types for the core domain, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.

use thiserror::Error;

/// Rejection reasons for a raw credential string.
///
/// A credential that fails to parse is never looked up. The authentication
/// layer treats it exactly like a missing credential.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The carrier was present but held no value.
    #[error("credential is empty")]
    Empty,

    /// The credential exceeds the maximum accepted length.
    #[error("credential is {len} bytes, maximum is {max}")]
    TooLong {
        /// Length of the rejected value in bytes.
        len: usize,
        /// Maximum accepted length in bytes.
        max: usize,
    },

    /// The credential contains a byte outside visible ASCII.
    #[error("credential contains an invalid character at byte {position}")]
    InvalidCharacter {
        /// Byte offset of the first offending character.
        position: usize,
    },
}

/// Validation failures for domain primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A hex-encoded credential digest could not be decoded.
    #[error("invalid credential digest: {0}")]
    InvalidDigest(String),

    /// An identifier string is not a valid UUID.
    #[error("invalid identifier '{value}': {reason}")]
    InvalidIdentifier {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_error_messages_name_the_problem() {
        assert_eq!(CredentialError::Empty.to_string(), "credential is empty");
        assert!(CredentialError::TooLong { len: 600, max: 512 }
            .to_string()
            .contains("600"));
        assert!(CredentialError::InvalidCharacter { position: 3 }
            .to_string()
            .contains("byte 3"));
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError::InvalidIdentifier {
            value: "nope".into(),
            reason: "bad uuid".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("nope"));
        assert!(msg.contains("bad uuid"));
    }
}
