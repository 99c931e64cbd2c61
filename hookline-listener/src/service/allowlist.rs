//! Source address allow-listing

use ipnet::IpNet;
use std::net::IpAddr;

/// Address ranges events are accepted from
#[derive(Debug, Clone)]
pub struct SourceAllowlist {
    ranges: Vec<IpNet>,
}

impl SourceAllowlist {
    pub fn new(ranges: Vec<IpNet>) -> Self {
        Self { ranges }
    }

    pub fn allows(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        self.ranges.iter().any(|range| range.contains(&ip))
    }
}

/// Resolves the address an event came from
///
/// The first `X-Forwarded-For` entry wins over the peer address. A forwarded
/// entry that is not an address yields `None` rather than falling back.
pub fn source_ip(forwarded_for: Option<&str>, peer: Option<IpAddr>) -> Option<IpAddr> {
    let forwarded = forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|entry| !entry.is_empty());

    match forwarded {
        Some(entry) => entry.parse().ok(),
        None => peer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowlist() -> SourceAllowlist {
        SourceAllowlist::new(vec![
            "192.30.252.0/22".parse().unwrap(),
            "2a0a:a440::/29".parse().unwrap(),
        ])
    }

    #[test]
    fn test_allows_addresses_in_range() {
        let list = allowlist();
        assert!(list.allows("192.30.252.41".parse().unwrap()));
        assert!(list.allows("2a0a:a440::1".parse().unwrap()));
        assert!(!list.allows("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn test_ipv4_mapped_peer() {
        assert!(allowlist().allows("::ffff:192.30.252.41".parse().unwrap()));
    }

    #[test]
    fn test_source_ip_prefers_forwarded() {
        let peer: IpAddr = "10.0.0.5".parse().unwrap();

        assert_eq!(
            source_ip(Some("192.30.252.41, 10.1.1.1"), Some(peer)),
            Some("192.30.252.41".parse().unwrap())
        );
        assert_eq!(source_ip(None, Some(peer)), Some(peer));
        assert_eq!(source_ip(Some(" "), Some(peer)), Some(peer));
        assert_eq!(source_ip(Some("garbage"), Some(peer)), None);
        assert_eq!(source_ip(None, None), None);
    }
}
