use std::net::Ipv4Addr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AclError, Result};
use crate::types::{Action, IpRange, PortRange, RuleSpec};

/// Regex pattern for connection checks
/// Format: C <ip> <port>
static CHECK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^C\s+(\S+)\s+(\S+)").expect("CHECK_PATTERN: hardcoded regex is invalid")
});

/// Parse a dotted-quad IPv4 address.
///
/// The string must contain exactly three dots and four decimal fields in
/// [0, 255]. Leading zeros are accepted.
pub fn parse_address(s: &str) -> Result<Ipv4Addr> {
    if s.bytes().filter(|&b| b == b'.').count() != 3 {
        return Err(AclError::InvalidAddress(s.to_string()));
    }

    let mut octets = [0u8; 4];
    for (octet, field) in octets.iter_mut().zip(s.split('.')) {
        *octet = parse_decimal(field)
            .and_then(|n| u8::try_from(n).ok())
            .ok_or_else(|| AclError::InvalidAddress(s.to_string()))?;
    }

    Ok(Ipv4Addr::from(octets))
}

/// Parse an address or an `<start>-<end>` address range.
pub fn parse_ip_range(s: &str) -> Result<IpRange> {
    if let Some((start_str, end_str)) = s.split_once('-') {
        let start =
            parse_address(start_str).map_err(|_| AclError::InvalidIpRange(s.to_string()))?;
        let end = parse_address(end_str).map_err(|_| AclError::InvalidIpRange(s.to_string()))?;
        Ok(IpRange::new(start, end))
    } else {
        let addr = parse_address(s).map_err(|_| AclError::InvalidIpRange(s.to_string()))?;
        Ok(IpRange::single(addr))
    }
}

/// Parse a port or an `<start>-<end>` port range.
///
/// Every bound must lie in [1, 65535]; anything else is reported as
/// [`AclError::InvalidPortRange`]. An inverted range (`start > end`) is
/// returned as-is for the caller to judge.
pub fn parse_port_range(s: &str) -> Result<PortRange> {
    if let Some((start_str, end_str)) = s.split_once('-') {
        let start = parse_port(start_str).ok_or_else(|| AclError::InvalidPortRange(s.to_string()))?;
        let end = parse_port(end_str).ok_or_else(|| AclError::InvalidPortRange(s.to_string()))?;
        Ok(PortRange::new(start, end))
    } else {
        let port = parse_port(s).ok_or_else(|| AclError::InvalidPortRange(s.to_string()))?;
        Ok(PortRange::single(port))
    }
}

/// Parse rule text: `<action> <ip-spec> <port-spec>`.
///
/// Only the first character of the action token is significant. Tokens after
/// the port spec are ignored.
pub fn parse_rule_spec(line: &str) -> Result<RuleSpec> {
    let mut tokens = line.split_whitespace();

    let action = tokens
        .next()
        .and_then(|t| t.chars().next())
        .and_then(Action::from_letter)
        .ok_or_else(|| AclError::InvalidRule(format!("Unknown action: {}", line)))?;

    let (ip_spec, port_spec) = match (tokens.next(), tokens.next()) {
        (Some(ip), Some(port)) => (ip, port),
        _ => {
            return Err(AclError::InvalidRule(format!(
                "Missing address or port: {}",
                line
            )))
        }
    };

    let ip_range = parse_ip_range(ip_spec).map_err(|e| AclError::InvalidRule(e.to_string()))?;

    let port_range = match parse_port_range(port_spec) {
        Ok(range) => range,
        Err(AclError::InvalidPortRange(spec)) => {
            return Err(AclError::InvalidRule(format!("Port out of range: {}", spec)))
        }
        Err(e) => return Err(e),
    };

    Ok(RuleSpec {
        action,
        ip_range,
        port_range,
    })
}

/// Parse a connection check: `C <ip> <port>`.
///
/// The port only has to be a number no larger than 65535; port 0 passes and
/// simply matches no rule.
pub fn parse_check(line: &str) -> Result<(Ipv4Addr, u16)> {
    let captures = CHECK_PATTERN
        .captures(line)
        .ok_or_else(|| AclError::IllegalQuery(line.to_string()))?;

    let addr = parse_address(&captures[1]).map_err(|_| AclError::IllegalQuery(line.to_string()))?;
    let port = parse_decimal(&captures[2])
        .and_then(|n| u16::try_from(n).ok())
        .ok_or_else(|| AclError::IllegalQuery(line.to_string()))?;

    Ok((addr, port))
}

/// Parse a port number in [1, 65535]
fn parse_port(s: &str) -> Option<u16> {
    parse_decimal(s)
        .and_then(|n| u16::try_from(n).ok())
        .filter(|&port| port >= 1)
}

/// Parse a non-empty string of ASCII digits. Overflow yields `None`.
fn parse_decimal(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_pattern_regex_compiles() {
        assert!(CHECK_PATTERN.is_match("C 1.2.3.4 80"));
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("147.188.193.15").unwrap(), Ipv4Addr::new(147, 188, 193, 15));
        assert_eq!(parse_address("0.0.0.0").unwrap(), Ipv4Addr::UNSPECIFIED);
        assert_eq!(parse_address("255.255.255.255").unwrap(), Ipv4Addr::BROADCAST);
    }

    #[test]
    fn test_parse_address_round_trip() {
        for s in ["1.2.3.4", "10.0.0.255", "192.168.100.7", "0.0.0.0", "255.255.255.255"] {
            assert_eq!(parse_address(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_parse_address_leading_zeros() {
        assert_eq!(parse_address("010.001.0.7").unwrap(), Ipv4Addr::new(10, 1, 0, 7));
    }

    #[test]
    fn test_parse_address_invalid() {
        for s in [
            "",
            "1.2.3",
            "1.2.3.4.5",
            "256.0.0.1",
            "1.2.3.-4",
            "1..3.4",
            "a.b.c.d",
            "1.2.3.4 ",
            "+1.2.3.4",
            "1.2.3.99999999999",
        ] {
            assert!(parse_address(s).is_err(), "{:?} should be rejected", s);
        }
    }

    #[test]
    fn test_parse_ip_range() {
        let range = parse_ip_range("10.0.0.0-10.0.0.255").unwrap();
        assert!(range.is_range);
        assert_eq!(range.start, Ipv4Addr::new(10, 0, 0, 0));
        assert_eq!(range.end, Ipv4Addr::new(10, 0, 0, 255));

        let single = parse_ip_range("10.0.0.7").unwrap();
        assert!(!single.is_range);
        assert_eq!(single.start, single.end);
    }

    #[test]
    fn test_parse_ip_range_invalid() {
        assert!(parse_ip_range("10.0.0.0-").is_err());
        assert!(parse_ip_range("-10.0.0.0").is_err());
        assert!(parse_ip_range("10.0.0.0-10.0.0.1-10.0.0.2").is_err());
        assert!(parse_ip_range("10.0.0").is_err());
    }

    #[test]
    fn test_parse_port_range() {
        assert_eq!(parse_port_range("80").unwrap(), PortRange::single(80));
        assert_eq!(parse_port_range("80-90").unwrap(), PortRange::new(80, 90));
        assert_eq!(parse_port_range("1-65535").unwrap(), PortRange::new(1, 65535));
    }

    #[test]
    fn test_parse_port_range_keeps_inverted() {
        let range = parse_port_range("90-80").unwrap();
        assert!(range.is_inverted());
    }

    #[test]
    fn test_parse_port_range_out_of_bounds() {
        for s in ["0", "65536", "0-80", "80-70000", "abc", "", "-", "99999999999"] {
            assert!(
                matches!(parse_port_range(s), Err(AclError::InvalidPortRange(_))),
                "{:?} should be an invalid port range",
                s
            );
        }
    }

    #[test]
    fn test_parse_rule_spec() {
        let spec = parse_rule_spec("A 147.188.193.0-147.188.194.255 21-22").unwrap();
        assert_eq!(spec.action, Action::Allow);
        assert_eq!(spec.ip_range.to_string(), "147.188.193.0-147.188.194.255");
        assert_eq!(spec.port_range, PortRange::new(21, 22));

        let spec = parse_rule_spec("D\t10.0.0.1\t80").unwrap();
        assert_eq!(spec.action, Action::Deny);
    }

    #[test]
    fn test_parse_rule_spec_action_letter_only() {
        let spec = parse_rule_spec("Allow 10.0.0.1 80").unwrap();
        assert_eq!(spec.action, Action::Allow);
        assert!(parse_rule_spec("X 10.0.0.1 80").is_err());
    }

    #[test]
    fn test_parse_rule_spec_ignores_extra_tokens() {
        assert!(parse_rule_spec("A 10.0.0.1 80 trailing words").is_ok());
    }

    #[test]
    fn test_parse_rule_spec_invalid() {
        for line in ["A", "A 10.0.0.1", "A 10.0.0 80", "A 10.0.0.1 0", "A 10.0.0.1 port", ""] {
            assert!(
                matches!(parse_rule_spec(line), Err(AclError::InvalidRule(_))),
                "{:?} should be an invalid rule",
                line
            );
        }
    }

    #[test]
    fn test_parse_check() {
        let (addr, port) = parse_check("C 10.0.0.5 80").unwrap();
        assert_eq!(addr, Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(port, 80);

        let (_, port) = parse_check("C 10.0.0.5 0").unwrap();
        assert_eq!(port, 0);
    }

    #[test]
    fn test_parse_check_invalid() {
        for line in ["C", "C 10.0.0.5", "C 10.0.0 80", "C 10.0.0.5 65536", "C 10.0.0.5 http"] {
            assert!(
                matches!(parse_check(line), Err(AclError::IllegalQuery(_))),
                "{:?} should be an illegal query",
                line
            );
        }
    }
}
