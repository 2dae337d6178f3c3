use std::fmt;
use std::net::Ipv4Addr;

/// Rule action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Allow,
    Deny,
}

impl Action {
    /// Map the leading letter of an action token (`A` or `D`).
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'A' => Some(Action::Allow),
            'D' => Some(Action::Deny),
            _ => None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Action::Allow => 'A',
            Action::Deny => 'D',
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// IPv4 address range.
///
/// A single address is stored with `end == start` and `is_range == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpRange {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
    pub is_range: bool,
}

impl IpRange {
    /// Create a range covering one address
    pub fn single(addr: Ipv4Addr) -> Self {
        Self {
            start: addr,
            end: addr,
            is_range: false,
        }
    }

    /// Create a range from two bounds
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> Self {
        Self {
            start,
            end,
            is_range: true,
        }
    }

    /// Structural equality used by rule deletion: the end bound only counts
    /// when both sides are ranges.
    pub fn same_shape(&self, other: &IpRange) -> bool {
        self.is_range == other.is_range
            && self.start == other.start
            && (!self.is_range || self.end == other.end)
    }
}

impl fmt::Display for IpRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_range {
            write!(f, "{}-{}", self.start, self.end)
        } else {
            write!(f, "{}", self.start)
        }
    }
}

/// Port range, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
    pub is_range: bool,
}

impl PortRange {
    /// Create a range covering one port
    pub fn single(port: u16) -> Self {
        Self {
            start: port,
            end: port,
            is_range: false,
        }
    }

    /// Create a range from two bounds. `start > end` is not rejected here.
    pub fn new(start: u16, end: u16) -> Self {
        Self {
            start,
            end,
            is_range: true,
        }
    }

    /// True for a range whose end lies below its start
    pub fn is_inverted(&self) -> bool {
        self.is_range && self.end < self.start
    }

    pub fn same_shape(&self, other: &PortRange) -> bool {
        self.is_range == other.is_range
            && self.start == other.start
            && (!self.is_range || self.end == other.end)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_range {
            write!(f, "{}-{}", self.start, self.end)
        } else {
            write!(f, "{}", self.start)
        }
    }
}

/// Parsed rule text before it enters the store.
///
/// Also used as the descriptor for deletion, where `action` is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSpec {
    pub action: Action,
    pub ip_range: IpRange,
    pub port_range: PortRange,
}

impl RuleSpec {
    /// Check whether `other` addresses the same IP and port ranges
    pub fn same_target(&self, other: &RuleSpec) -> bool {
        self.ip_range.same_shape(&other.ip_range) && self.port_range.same_shape(&other.port_range)
    }
}

/// Stable identifier of a rule in the store.
///
/// Ids are never reused, so a stale id resolves to nothing once its rule is
/// deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) u64);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A connection request that was granted under an Allow rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Query {
    pub address: Ipv4Addr,
    pub port: u16,
    /// Rule that accepted this request
    pub rule: RuleId,
}

/// Outcome of evaluating a connection request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted(RuleId),
    Rejected,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_letters() {
        assert_eq!(Action::from_letter('A'), Some(Action::Allow));
        assert_eq!(Action::from_letter('D'), Some(Action::Deny));
        assert_eq!(Action::from_letter('a'), None);
        assert_eq!(Action::Allow.to_string(), "A");
    }

    #[test]
    fn test_ip_range_display() {
        let single = IpRange::single(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(single.to_string(), "10.0.0.1");

        let range = IpRange::new(Ipv4Addr::new(10, 0, 0, 0), Ipv4Addr::new(10, 0, 0, 255));
        assert_eq!(range.to_string(), "10.0.0.0-10.0.0.255");
    }

    #[test]
    fn test_port_range_display() {
        assert_eq!(PortRange::single(80).to_string(), "80");
        assert_eq!(PortRange::new(80, 90).to_string(), "80-90");
    }

    #[test]
    fn test_same_shape_ignores_end_for_single() {
        let a = IpRange::single(Ipv4Addr::new(1, 2, 3, 4));
        let mut b = a;
        b.end = Ipv4Addr::new(9, 9, 9, 9);
        assert!(a.same_shape(&b));

        // A single value never equals a range, even a degenerate one
        let c = IpRange::new(Ipv4Addr::new(1, 2, 3, 4), Ipv4Addr::new(1, 2, 3, 4));
        assert!(!a.same_shape(&c));
    }

    #[test]
    fn test_port_range_inverted() {
        assert!(PortRange::new(90, 80).is_inverted());
        assert!(!PortRange::new(80, 90).is_inverted());
        assert!(!PortRange::single(80).is_inverted());
    }
}
