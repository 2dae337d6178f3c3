use std::net::Ipv4Addr;

use super::RangeMatcher;
use crate::types::IpRange;

/// Octet-wise range membership.
///
/// Octets are compared left to right. Each octet must lie within the bounds
/// at its position; the first octet that differs from the range start ends
/// the walk, leaving the remaining octets unconstrained. This is not CIDR or
/// lexicographic containment: `10.5.9.9` is inside `10.0.0.0-10.255.0.0`.
impl RangeMatcher<Ipv4Addr> for IpRange {
    fn matches(&self, addr: Ipv4Addr) -> bool {
        let start = self.start.octets();
        let end = self.end.octets();

        for (i, octet) in addr.octets().into_iter().enumerate() {
            if octet < start[i] || octet > end[i] {
                return false;
            }
            if octet != start[i] {
                break;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: [u8; 4], end: [u8; 4]) -> IpRange {
        IpRange::new(Ipv4Addr::from(start), Ipv4Addr::from(end))
    }

    #[test]
    fn test_single_address() {
        let r = IpRange::single(Ipv4Addr::new(192, 168, 1, 1));
        assert!(r.matches(Ipv4Addr::new(192, 168, 1, 1)));
        assert!(!r.matches(Ipv4Addr::new(192, 168, 1, 2)));
        assert!(!r.matches(Ipv4Addr::new(192, 168, 0, 1)));
    }

    #[test]
    fn test_last_octet_range() {
        let r = range([10, 0, 0, 0], [10, 0, 0, 255]);
        assert!(r.matches(Ipv4Addr::new(10, 0, 0, 5)));
        assert!(r.matches(Ipv4Addr::new(10, 0, 0, 255)));
        assert!(!r.matches(Ipv4Addr::new(10, 0, 1, 5)));
    }

    #[test]
    fn test_divergence_frees_remaining_octets() {
        let r = range([10, 0, 0, 0], [10, 255, 255, 255]);
        assert!(r.matches(Ipv4Addr::new(10, 5, 9, 9)));
        assert!(!r.matches(Ipv4Addr::new(11, 0, 0, 0)));

        // Later octets are not checked against the end bound once the
        // candidate has left the start prefix.
        let r = range([10, 0, 0, 0], [10, 255, 0, 0]);
        assert!(r.matches(Ipv4Addr::new(10, 5, 9, 9)));
    }

    #[test]
    fn test_octet_outside_bounds_fails_before_divergence() {
        let r = range([147, 188, 193, 0], [147, 188, 194, 255]);
        assert!(r.matches(Ipv4Addr::new(147, 188, 193, 15)));
        assert!(r.matches(Ipv4Addr::new(147, 188, 194, 7)));
        assert!(!r.matches(Ipv4Addr::new(147, 188, 195, 0)));
        assert!(!r.matches(Ipv4Addr::new(147, 187, 193, 15)));
    }

    #[test]
    fn test_start_prefix_octets_checked_against_end() {
        // The end bound still applies to octets equal to the start.
        let r = range([1, 1, 1, 9], [1, 1, 1, 5]);
        assert!(!r.matches(Ipv4Addr::new(1, 1, 1, 9)));
    }
}
