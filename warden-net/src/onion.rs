//! Onion address validation
//!
//! The platform itself is reachable as an onion service through an
//! external Tor-capable listener. This module validates the addresses
//! that listener is configured with; it takes no part in preview
//! fetching, where onion hosts simply fail to resolve.

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OnionAddressError {
    #[error("host is not a .onion address: {0}")]
    NotOnion(String),

    #[error("onion label has invalid length {0}, expected 16 or 56")]
    BadLength(usize),

    #[error("onion label contains invalid character {0:?}")]
    BadCharacter(char),

    #[error("not a valid http(s) URL: {0}")]
    BadUrl(String),
}

/// Validate a bare `.onion` hostname (v2: 16-char label, v3: 56-char).
pub fn validate_onion_host(host: &str) -> Result<(), OnionAddressError> {
    let Some(label) = host.strip_suffix(".onion") else {
        return Err(OnionAddressError::NotOnion(host.to_string()));
    };

    if label.len() != 16 && label.len() != 56 {
        return Err(OnionAddressError::BadLength(label.len()));
    }

    // base32 alphabet, lowercased in practice
    for c in label.chars() {
        if !c.is_ascii_alphanumeric() {
            return Err(OnionAddressError::BadCharacter(c));
        }
    }

    Ok(())
}

/// Validate a full http(s) URL whose host must be a `.onion` address.
pub fn validate_onion_url(raw: &str) -> Result<(), OnionAddressError> {
    let url = Url::parse(raw).map_err(|e| OnionAddressError::BadUrl(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(OnionAddressError::BadUrl(format!("scheme {other}"))),
    }

    match url.host_str() {
        Some(host) => validate_onion_host(host),
        None => Err(OnionAddressError::BadUrl("missing host".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V3: &str = "2gzyxa5ihm7nsggfxnu52rck2vv4rvmdlkiu3zzui5du4xyclen53wid.onion";

    #[test]
    fn test_accepts_v2_and_v3_hosts() {
        assert!(validate_onion_host("expyuzz4wqqyqhjn.onion").is_ok());
        assert!(validate_onion_host(V3).is_ok());
    }

    #[test]
    fn test_rejects_non_onion_and_bad_labels() {
        assert!(matches!(
            validate_onion_host("example.com"),
            Err(OnionAddressError::NotOnion(_))
        ));
        assert_eq!(
            validate_onion_host("short.onion"),
            Err(OnionAddressError::BadLength(5))
        );
        assert!(matches!(
            validate_onion_host("expyuzz4wqqyqhj!.onion"),
            Err(OnionAddressError::BadCharacter('!'))
        ));
    }

    #[test]
    fn test_url_form() {
        assert!(validate_onion_url(&format!("http://{V3}/board")).is_ok());
        assert!(validate_onion_url("http://example.com/").is_err());
        assert!(validate_onion_url(&format!("ftp://{V3}/")).is_err());
    }
}
