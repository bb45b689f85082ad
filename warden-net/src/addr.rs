//! Private address classification for SSRF defense
//!
//! A preview fetch must never reach loopback, link-local, RFC1918, or
//! IPv6 unique-local space, no matter what the attacker's DNS says.
//! Classification is applied to every resolved address of every hop.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// True when `ip` points at internal or non-routable space.
pub fn is_private_addr(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => {
            // `::ffff:10.0.0.1` reaches the same place 10.0.0.1 does;
            // unwrap mapped addresses before classifying.
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_private_v4(mapped);
            }
            is_private_v6(v6)
        }
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }
    let segments = ip.segments();
    // fe80::/10 link-local
    if segments[0] & 0xffc0 == 0xfe80 {
        return true;
    }
    // fc00::/7 unique-local
    if segments[0] & 0xfe00 == 0xfc00 {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(s: &str) -> bool {
        is_private_addr(s.parse().unwrap())
    }

    #[test]
    fn test_rejects_internal_vectors() {
        for addr in [
            "127.0.0.1",
            "10.0.0.5",
            "172.16.0.1",
            "172.31.255.255",
            "192.168.1.1",
            "169.254.1.1",
            "0.0.0.0",
            "::1",
            "::",
            "fc00::1",
            "fdab::12",
            "fe80::1",
        ] {
            assert!(rejected(addr), "should reject {addr}");
        }
    }

    #[test]
    fn test_accepts_public_vectors() {
        for addr in ["8.8.8.8", "93.184.216.34", "1.1.1.1", "2606:4700::1111", "172.32.0.1"] {
            assert!(!rejected(addr), "should accept {addr}");
        }
    }

    #[test]
    fn test_rejects_mapped_ipv4() {
        assert!(rejected("::ffff:10.0.0.1"));
        assert!(rejected("::ffff:127.0.0.1"));
        assert!(!rejected("::ffff:8.8.8.8"));
    }
}
