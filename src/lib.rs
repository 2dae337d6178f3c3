//! ACL Server - An IP/port access-control decision service for Rust
//!
//! This library provides:
//! - IPv4 address and port range parsing
//! - An ordered allow/deny rule store with first-match evaluation
//! - Per-rule tracking of granted connection requests
//! - A line-based command processor with an audit log
//! - Interactive and TCP front-ends sharing one engine
//!
//! # Example
//!
//! ```rust
//! use acl_server_r::{CommandProcessor, Outcome};
//!
//! let processor = CommandProcessor::new();
//!
//! let reply = |line: &str| match processor.process(line) {
//!     Outcome::Reply(response) => response.to_string(),
//!     Outcome::Quit => String::new(),
//! };
//!
//! assert_eq!(reply("A 10.0.0.0-10.0.0.255 80"), "Rule added\n");
//! assert_eq!(reply("C 10.0.0.5 80"), "Connection accepted\n");
//! // The same request is not granted twice by the same rule
//! assert_eq!(reply("C 10.0.0.5 80"), "Connection rejected\n");
//! ```
//!
//! # Command Syntax
//!
//! | Command | Example | Description |
//! |---------|---------|-------------|
//! | Add | `A 147.188.192.0-147.188.194.255 21-22` | Append an allow rule (deny rules come from `RuleSet::add`) |
//! | Delete | `D 147.188.193.15 22` | Remove the first rule with the same ranges |
//! | Check | `C 147.188.193.15 22` | Evaluate a connection request |
//! | Report | `R` | Print every command received so far |
//! | List | `L` | Print rules and the requests they granted |
//! | Quit | `Q` | End the session |
//!
//! ## Evaluation
//!
//! Rules are checked in insertion order. A matching deny rule rejects
//! immediately. A matching allow rule accepts and records the request,
//! unless it already recorded the same address and port, in which case
//! later rules are consulted. No match means rejection.

pub mod audit;
pub mod client;
pub mod command;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod parser;
pub mod session;
pub mod tracker;
pub mod types;

// Re-export commonly used items
pub use audit::AuditLog;
pub use command::{Command, CommandProcessor, Outcome, Response};
pub use engine::{Rule, RuleSet};
pub use error::{AclError, Result};
pub use matcher::RangeMatcher;
pub use parser::{parse_address, parse_check, parse_ip_range, parse_port_range, parse_rule_spec};
pub use tracker::QueryTracker;
pub use types::{Action, IpRange, PortRange, Query, RuleId, RuleSpec, Verdict};
