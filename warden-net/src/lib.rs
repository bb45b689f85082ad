//! Warden Net - SSRF-guarded outbound fetching
//!
//! The only part of the trust-and-safety core that touches the network:
//! - Link-preview fetching with per-hop private-address screening
//! - Bounded metadata extraction from truncated bodies
//! - Onion address validation for the external Tor listener

pub mod addr;
pub mod extract;
pub mod onion;
pub mod preview;

pub use addr::is_private_addr;
pub use onion::*;
pub use preview::*;

pub use warden_core::error::PreviewError;
