//! Per-rule record of granted connection requests.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use crate::types::{Query, RuleId};

/// Set of `(address, port)` pairs already accepted under one rule.
///
/// Iteration yields the most recently granted pair first.
#[derive(Debug, Clone)]
pub struct QueryTracker {
    rule: RuleId,
    seen: HashSet<(Ipv4Addr, u16)>,
    order: Vec<(Ipv4Addr, u16)>,
}

impl QueryTracker {
    pub fn new(rule: RuleId) -> Self {
        Self {
            rule,
            seen: HashSet::new(),
            order: Vec::new(),
        }
    }

    /// Check whether the pair was already granted
    pub fn contains(&self, address: Ipv4Addr, port: u16) -> bool {
        self.seen.contains(&(address, port))
    }

    /// Record a pair. Returns `false` if it was already present.
    pub fn insert(&mut self, address: Ipv4Addr, port: u16) -> bool {
        if !self.seen.insert((address, port)) {
            return false;
        }
        self.order.push((address, port));
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate over recorded queries, newest first
    pub fn iter(&self) -> impl Iterator<Item = Query> + '_ {
        self.order.iter().rev().map(move |&(address, port)| Query {
            address,
            port,
            rule: self.rule,
        })
    }
}
