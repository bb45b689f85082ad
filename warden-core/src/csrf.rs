//! Anti-forgery tokens
//!
//! Tokens are opaque 32-byte random values, hex-encoded. This module
//! only issues and compares them; expiry and session binding belong to
//! the external cookie/session layer.

use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::error::CredentialError;

const TOKEN_LEN: usize = 32;

/// Generate a fresh CSRF token.
pub fn generate_token() -> Result<String, CredentialError> {
    let mut bytes = [0u8; TOKEN_LEN];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CredentialError::Entropy(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Compare the session-held token against the submitted one.
///
/// False when either is empty. Equal-length values are compared in
/// constant time; a length mismatch is rejected outright, which leaks
/// nothing an attacker does not already control.
pub fn validate_token(expected: &str, submitted: &str) -> bool {
    if expected.is_empty() || submitted.is_empty() {
        return false;
    }
    if expected.len() != submitted.len() {
        return false;
    }
    expected.as_bytes().ct_eq(submitted.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_64_hex_chars() {
        let token = generate_token().unwrap();
        assert_eq!(token.len(), 64);
        assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_token().unwrap(), generate_token().unwrap());
    }

    #[test]
    fn test_validate_rejects_empty_sides() {
        assert!(!validate_token("", "x"));
        assert!(!validate_token("x", ""));
        assert!(!validate_token("", ""));
    }

    #[test]
    fn test_validate_matches_exactly() {
        assert!(validate_token("abc", "abc"));
        assert!(!validate_token("abc", "abd"));
        assert!(!validate_token("abc", "abcd"));
    }
}
