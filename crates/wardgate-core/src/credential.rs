//! # API Credentials
//!
//! A [`Credential`] is the opaque bearer value a caller presents. It is
//! validated for shape, then reduced to a [`CredentialDigest`] which is the
//! only form stores ever see.
//!
//! ## Accepted syntax
//!
//! ```text
//! 1..=512 bytes, each in 0x21..=0x7E (visible ASCII, no whitespace)
//! ```
//!
//! Anything else is rejected with [`CredentialError`] and never looked up.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{CredentialError, ValidationError};

/// Maximum accepted credential length in bytes.
pub const MAX_CREDENTIAL_LEN: usize = 512;

/// A validated bearer credential.
///
/// Custom `Debug` redacts the value to prevent credential leakage in logs.
/// There is deliberately no `Display` impl.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Validate a raw credential string.
    ///
    /// Surrounding whitespace is not trimmed: a value with a trailing space
    /// is a different (and invalid) credential.
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        if raw.is_empty() {
            return Err(CredentialError::Empty);
        }
        if raw.len() > MAX_CREDENTIAL_LEN {
            return Err(CredentialError::TooLong {
                len: raw.len(),
                max: MAX_CREDENTIAL_LEN,
            });
        }
        if let Some(position) = raw.bytes().position(|b| !(0x21..=0x7E).contains(&b)) {
            return Err(CredentialError::InvalidCharacter { position });
        }
        Ok(Self(raw.to_string()))
    }

    /// Access the raw value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// SHA-256 digest of the credential, the lookup key for stores.
    pub fn digest(&self) -> CredentialDigest {
        let hash = Sha256::digest(self.0.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        CredentialDigest(bytes)
    }

    /// Constant-time comparison against an expected secret.
    ///
    /// When lengths differ, performs a dummy comparison so timing does not
    /// depend on how much of the secret matched.
    pub fn matches_secret(&self, expected: &str) -> bool {
        let provided = self.0.as_bytes();
        let expected = expected.as_bytes();
        if provided.len() != expected.len() {
            let _ = expected.ct_eq(expected);
            return false;
        }
        provided.ct_eq(expected).into()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential").field(&"[REDACTED]").finish()
    }
}

/// SHA-256 digest of a credential.
///
/// Stores index credentials by this value. Rendered as 64 lowercase hex
/// characters in manifests and database rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CredentialDigest([u8; 32]);

impl CredentialDigest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Access the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Return the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        if s.len() != 64 {
            return Err(ValidationError::InvalidDigest(format!(
                "expected 64 hex characters, got {}",
                s.len()
            )));
        }
        if let Some(pos) = s.bytes().position(|b| !b.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidDigest(format!(
                "non-hex character at position {pos}"
            )));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &s[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|e| {
                ValidationError::InvalidDigest(format!("invalid hex at position {}: {e}", i * 2))
            })?;
        }
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for CredentialDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_accepts_typical_api_key() {
        let cred = Credential::parse("hosp-key-123").unwrap();
        assert_eq!(cred.expose(), "hosp-key-123");
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(Credential::parse(""), Err(CredentialError::Empty));
    }

    #[test]
    fn parse_rejects_whitespace() {
        assert_eq!(
            Credential::parse("hosp key"),
            Err(CredentialError::InvalidCharacter { position: 4 })
        );
        assert_eq!(
            Credential::parse("key "),
            Err(CredentialError::InvalidCharacter { position: 3 })
        );
    }

    #[test]
    fn parse_rejects_non_ascii() {
        assert!(matches!(
            Credential::parse("clé"),
            Err(CredentialError::InvalidCharacter { position: 2 })
        ));
    }

    #[test]
    fn parse_enforces_length_limit() {
        let max = "k".repeat(MAX_CREDENTIAL_LEN);
        assert!(Credential::parse(&max).is_ok());
        let over = "k".repeat(MAX_CREDENTIAL_LEN + 1);
        assert_eq!(
            Credential::parse(&over),
            Err(CredentialError::TooLong {
                len: MAX_CREDENTIAL_LEN + 1,
                max: MAX_CREDENTIAL_LEN
            })
        );
    }

    #[test]
    fn debug_redacts_value() {
        let cred = Credential::parse("super-secret-key").unwrap();
        let rendered = format!("{cred:?}");
        assert!(!rendered.contains("super-secret-key"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn digest_is_sha256_of_value() {
        // sha256("abc")
        let cred = Credential::parse("abc").unwrap();
        assert_eq!(
            cred.digest().to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_hex_round_trip() {
        let digest = Credential::parse("hosp-key-123").unwrap().digest();
        let parsed = CredentialDigest::from_hex(&digest.to_hex()).unwrap();
        assert_eq!(parsed, digest);
    }

    #[test]
    fn digest_from_hex_accepts_uppercase() {
        let lower = Credential::parse("abc").unwrap().digest();
        let upper = CredentialDigest::from_hex(&lower.to_hex().to_uppercase()).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn digest_from_hex_rejects_wrong_length() {
        assert!(matches!(
            CredentialDigest::from_hex("abcd"),
            Err(ValidationError::InvalidDigest(_))
        ));
    }

    #[test]
    fn digest_from_hex_rejects_sign_characters() {
        for bad in ["+a".repeat(32), "-a".repeat(32), format!("+{}", "a".repeat(63))] {
            assert!(matches!(
                CredentialDigest::from_hex(&bad),
                Err(ValidationError::InvalidDigest(_))
            ));
        }
    }

    #[test]
    fn digest_from_hex_rejects_bad_characters() {
        let bad = "zz".repeat(32);
        assert!(CredentialDigest::from_hex(&bad).is_err());
    }

    #[test]
    fn digest_display_is_tagged() {
        let digest = CredentialDigest::from_bytes([0u8; 32]);
        assert_eq!(digest.to_string(), format!("sha256:{}", "0".repeat(64)));
    }

    #[test]
    fn matches_secret_identical() {
        let cred = Credential::parse("operator-token").unwrap();
        assert!(cred.matches_secret("operator-token"));
    }

    #[test]
    fn matches_secret_rejects_prefix_and_wrong_value() {
        let cred = Credential::parse("operator").unwrap();
        assert!(!cred.matches_secret("operator-token"));
        assert!(!cred.matches_secret("operatoR"));
        assert!(!cred.matches_secret(""));
    }

    proptest! {
        #[test]
        fn visible_ascii_always_parses(raw in "[!-~]{1,512}") {
            let cred = Credential::parse(&raw).unwrap();
            prop_assert_eq!(cred.expose(), raw.as_str());
        }

        #[test]
        fn distinct_credentials_have_distinct_digests(
            a in "[!-~]{1,64}",
            b in "[!-~]{1,64}",
        ) {
            prop_assume!(a != b);
            let da = Credential::parse(&a).unwrap().digest();
            let db = Credential::parse(&b).unwrap().digest();
            prop_assert_ne!(da, db);
        }
    }
}
