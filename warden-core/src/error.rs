//! Shared error types for the trust-and-safety core
//!
//! Every kind here is terminal for the call that produced it: nothing in
//! this core retries internally. Validation and admission failures are
//! expected outcomes and must stay cheap to construct and match on.

use std::net::IpAddr;
use thiserror::Error;

/// Form-field validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("must be at least {min} characters")]
    TooShort { min: usize },

    #[error("must be no more than {max} characters")]
    TooLong { max: usize },

    #[error("is required")]
    Empty,
}

/// Errors from identity generation and password hashing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The system entropy source failed. There is no safe fallback, so
    /// the operation is abandoned.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    /// The encoded hash record could not be parsed. Verification paths
    /// treat this as a failed match rather than surfacing it.
    #[error("malformed hash record")]
    MalformedHashRecord,

    #[error("invalid key derivation parameters: {0}")]
    Params(String),
}

/// Admission rejection from the rate limiter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    #[error("rate limit exceeded for {key}")]
    Exceeded { key: String },
}

/// Errors from the link-preview fetch state machine
///
/// Each stage of the fetch produces a disjoint kind, so callers can map
/// failures to user-facing messages without string matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    #[error("unsupported URL scheme: {0}")]
    InvalidScheme(String),

    #[error("URL has no usable hostname")]
    InvalidHost,

    #[error("could not resolve host: {0}")]
    UnresolvableHost(String),

    #[error("resolved to a private or internal address: {0}")]
    PrivateAddressRejected(IpAddr),

    #[error("fetch timed out after {0} seconds")]
    FetchTimeout(u64),

    /// Reserved by the error contract for callers that refuse oversized
    /// bodies outright. The built-in fetch path truncates instead.
    #[error("response body too large")]
    ResponseTooLarge,

    #[error("remote returned HTTP {0}")]
    NonSuccessStatus(u16),

    #[error("fetch failed: {0}")]
    Fetch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::TooShort { min: 8 };
        assert_eq!(err.to_string(), "must be at least 8 characters");
        assert_eq!(ValidationError::Empty.to_string(), "is required");
    }

    #[test]
    fn test_preview_kinds_are_distinct() {
        let a = PreviewError::InvalidHost;
        let b = PreviewError::NonSuccessStatus(404);
        assert_ne!(a, b);
        assert_eq!(b.to_string(), "remote returned HTTP 404");
    }
}
