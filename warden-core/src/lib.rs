//! Warden Core - shared trust-and-safety primitives
//!
//! This crate provides the platform's request-independent safety logic:
//! - Token-bucket rate limiting with a background idle sweep
//! - Anonymous identity generation and Argon2id credential hashing
//! - CSRF token issuance and constant-time verification
//! - Security response-header sets for the surrounding HTTP layer
//!
//! Everything here is a pure library boundary: the web layer composes
//! rate-limit keys, holds sessions, and stores credentials; this crate
//! only decides.

pub mod credentials;
pub mod csrf;
pub mod error;
pub mod headers;
pub mod ratelimit;

pub use credentials::*;
pub use csrf::{generate_token, validate_token};
pub use error::*;
pub use ratelimit::*;
