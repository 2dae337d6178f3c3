use std::net::Ipv4Addr;

use crate::error::{AclError, Result};
use crate::matcher::RangeMatcher;
use crate::parser::parse_rule_spec;
use crate::tracker::QueryTracker;
use crate::types::{Action, IpRange, PortRange, RuleId, RuleSpec, Verdict};

/// A rule in the store
#[derive(Debug, Clone)]
pub struct Rule {
    /// Stable identifier
    pub id: RuleId,
    /// Allow or deny
    pub action: Action,
    /// Addresses covered by this rule
    pub ip_range: IpRange,
    /// Ports covered by this rule
    pub port_range: PortRange,
    /// Requests granted under this rule
    pub queries: QueryTracker,
}

impl Rule {
    fn new(id: RuleId, spec: RuleSpec) -> Self {
        Self {
            id,
            action: spec.action,
            ip_range: spec.ip_range,
            port_range: spec.port_range,
            queries: QueryTracker::new(id),
        }
    }

    /// Check if this rule covers the given address and port
    pub fn matches(&self, addr: Ipv4Addr, port: u16) -> bool {
        self.ip_range.matches(addr) && self.port_range.matches(port)
    }

    /// Rule text without its queries
    pub fn spec(&self) -> RuleSpec {
        RuleSpec {
            action: self.action,
            ip_range: self.ip_range,
            port_range: self.port_range,
        }
    }
}

/// Ordered rule store.
///
/// Evaluation order is insertion order; rules are appended at the tail and
/// never reordered.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    next_id: u64,
    purged_queries: usize,
}

impl RuleSet {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `<action> <ip-spec> <port-spec>` and append the rule.
    pub fn add(&mut self, line: &str) -> Result<RuleId> {
        let spec = parse_rule_spec(line)?;
        self.insert(spec)
    }

    /// Append an already parsed rule.
    pub fn insert(&mut self, spec: RuleSpec) -> Result<RuleId> {
        if spec.port_range.is_inverted() {
            return Err(AclError::InvalidRule(format!(
                "Invalid port range: {} > {}",
                spec.port_range.start, spec.port_range.end
            )));
        }

        let id = RuleId(self.next_id);
        self.next_id += 1;
        self.rules.push(Rule::new(id, spec));
        tracing::debug!(rule = %id, "rule added");
        Ok(id)
    }

    /// Parse a rule descriptor and delete the first rule with the same
    /// address and port ranges. The action letter must be present but does
    /// not take part in matching.
    pub fn delete(&mut self, line: &str) -> Result<Rule> {
        let descriptor = parse_rule_spec(line)
            .map_err(|_| AclError::RuleNotFound(line.to_string()))?;
        self.remove_matching(&descriptor)
    }

    /// Remove the first rule targeting the same ranges as `descriptor`.
    ///
    /// The removed rule's queries go with it.
    pub fn remove_matching(&mut self, descriptor: &RuleSpec) -> Result<Rule> {
        let index = self
            .rules
            .iter()
            .position(|rule| rule.spec().same_target(descriptor))
            .ok_or_else(|| {
                AclError::RuleNotFound(format!(
                    "{} {}",
                    descriptor.ip_range, descriptor.port_range
                ))
            })?;

        let rule = self.rules.remove(index);
        self.purged_queries += rule.queries.len();
        tracing::debug!(rule = %rule.id, queries = rule.queries.len(), "rule deleted");
        Ok(rule)
    }

    /// Evaluate a connection request.
    ///
    /// Rules are walked in order. A matching Deny rule rejects at once. A
    /// matching Allow rule accepts and records the request, unless the same
    /// `(addr, port)` was already recorded under it, in which case the walk
    /// continues. Running off the end rejects.
    pub fn evaluate(&mut self, addr: Ipv4Addr, port: u16) -> Verdict {
        for rule in self.rules.iter_mut() {
            if !rule.matches(addr, port) {
                continue;
            }
            match rule.action {
                Action::Deny => return Verdict::Rejected,
                Action::Allow => {
                    if rule.queries.insert(addr, port) {
                        return Verdict::Accepted(rule.id);
                    }
                }
            }
        }
        Verdict::Rejected
    }

    /// Look up a live rule by id
    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Iterate over rules in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Get the number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Total number of queries discarded together with deleted rules
    pub fn purged_query_count(&self) -> usize {
        self.purged_queries
    }
}
