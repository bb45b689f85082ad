//! Security response headers
//!
//! Framework-free name/value pairs for the surrounding HTTP layer to
//! apply on every response. Kept as data so the same set serves both
//! server stacks without pulling a web framework into this crate.

/// Headers applied to every response.
pub const STANDARD_HEADERS: &[(&str, &str)] = &[
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("X-XSS-Protection", "1; mode=block"),
    ("Referrer-Policy", "no-referrer"),
    (
        "Content-Security-Policy",
        "default-src 'self'; script-src 'self' 'unsafe-inline'; \
         style-src 'self' 'unsafe-inline'; img-src 'self' data:; \
         connect-src 'self'; font-src 'self'; object-src 'none'; \
         media-src 'none'; frame-src 'none';",
    ),
];

/// Extra headers for pages that must never be cached.
pub const NO_STORE_HEADERS: &[(&str, &str)] = &[
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

/// Whether a request path serves account-sensitive content and needs
/// [`NO_STORE_HEADERS`] on top of the standard set.
pub fn is_sensitive_path(path: &str) -> bool {
    path.contains("admin") || path.contains("profile")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_headers_cover_the_basics() {
        let names: Vec<&str> = STANDARD_HEADERS.iter().map(|(n, _)| *n).collect();
        assert!(names.contains(&"X-Frame-Options"));
        assert!(names.contains(&"Content-Security-Policy"));
    }

    #[test]
    fn test_sensitive_paths() {
        assert!(is_sensitive_path("/admin/reports"));
        assert!(is_sensitive_path("/profile"));
        assert!(!is_sensitive_path("/post/42"));
    }
}
