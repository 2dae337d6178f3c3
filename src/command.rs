//! Command parsing and dispatch.
//!
//! One line of text becomes one [`Command`]; [`CommandProcessor::process`]
//! runs it against the shared engine state and returns the reply as a value.

use std::fmt;

use parking_lot::Mutex;

use crate::audit::AuditLog;
use crate::engine::RuleSet;
use crate::parser::parse_check;

/// A parsed command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `A <ip-spec> <port-spec>`
    Add(&'a str),
    /// `D <ip-spec> <port-spec>`
    Delete(&'a str),
    /// `C <ip> <port>`
    Check(&'a str),
    /// `R`
    Report,
    /// `L`
    List,
    /// `Q`
    Quit,
    /// Anything else
    Illegal(&'a str),
}

impl<'a> Command<'a> {
    /// Classify a line by its leading character(s). Case-sensitive.
    pub fn parse(line: &'a str) -> Self {
        if line.starts_with('Q') {
            Command::Quit
        } else if line.starts_with('R') {
            Command::Report
        } else if line.starts_with('A') {
            Command::Add(line)
        } else if line.starts_with("C ") {
            Command::Check(line)
        } else if line.starts_with("D ") {
            Command::Delete(line)
        } else if line.starts_with('L') {
            Command::List
        } else {
            Command::Illegal(line)
        }
    }
}

/// Textual reply to a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    RuleAdded,
    InvalidRule,
    RuleDeleted,
    RuleNotFound,
    ConnectionAccepted,
    ConnectionRejected,
    IllegalQuery,
    IllegalRequest,
    /// Multi-line output of `R` and `L`, one entry per line
    Lines(Vec<String>),
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = match self {
            Response::RuleAdded => "Rule added",
            Response::InvalidRule => "Invalid rule",
            Response::RuleDeleted => "Rule deleted",
            Response::RuleNotFound => "Rule not found",
            Response::ConnectionAccepted => "Connection accepted",
            Response::ConnectionRejected => "Connection rejected",
            Response::IllegalQuery => "Illegal IP address or port specified",
            Response::IllegalRequest => "Illegal request",
            Response::Lines(lines) => {
                for line in lines {
                    writeln!(f, "{}", line)?;
                }
                return Ok(());
            }
        };
        writeln!(f, "{}", line)
    }
}

/// Result of processing one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(Response),
    /// The session should end; nothing is sent back
    Quit,
}

/// State shared by every session
#[derive(Debug, Default)]
struct Engine {
    rules: RuleSet,
    audit: AuditLog,
}

/// Serializes commands from all sessions against one rule set and audit log.
///
/// Each call to [`process`](Self::process) holds the lock for the whole
/// command, so no two commands interleave.
#[derive(Debug, Default)]
pub struct CommandProcessor {
    engine: Mutex<Engine>,
}

impl CommandProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one command line (without its trailing newline)
    pub fn process(&self, line: &str) -> Outcome {
        let command = Command::parse(line);
        if command == Command::Quit {
            return Outcome::Quit;
        }

        // Matching and bookkeeping are CPU-only, so the lock is held for the
        // whole command.
        let mut engine = self.engine.lock();
        engine.audit.append(line);

        let response = match command {
            Command::Add(line) => match engine.rules.add(line) {
                Ok(_) => Response::RuleAdded,
                Err(e) => {
                    tracing::debug!("add rejected: {}", e);
                    Response::InvalidRule
                }
            },
            Command::Delete(line) => match engine.rules.delete(line) {
                Ok(_) => Response::RuleDeleted,
                Err(e) => {
                    tracing::debug!("delete failed: {}", e);
                    Response::RuleNotFound
                }
            },
            Command::Check(line) => match parse_check(line) {
                Ok((addr, port)) => {
                    let verdict = engine.rules.evaluate(addr, port);
                    tracing::debug!(%addr, port, ?verdict, "connection checked");
                    if verdict.is_accepted() {
                        Response::ConnectionAccepted
                    } else {
                        Response::ConnectionRejected
                    }
                }
                Err(e) => {
                    tracing::debug!("check rejected: {}", e);
                    Response::IllegalQuery
                }
            },
            Command::Report => Response::Lines(engine.audit.iter().map(String::from).collect()),
            Command::List => Response::Lines(list_rules(&engine.rules)),
            Command::Illegal(line) => {
                tracing::debug!(line, "illegal request");
                Response::IllegalRequest
            }
            Command::Quit => return Outcome::Quit,
        };

        Outcome::Reply(response)
    }

    /// Number of rules currently stored
    pub fn rule_count(&self) -> usize {
        self.engine.lock().rules.len()
    }

    /// Snapshot of the audit log
    pub fn audit_entries(&self) -> Vec<String> {
        self.engine.lock().audit.iter().map(String::from).collect()
    }

    /// Run `f` with read access to the rule set
    pub fn with_rules<T>(&self, f: impl FnOnce(&RuleSet) -> T) -> T {
        f(&self.engine.lock().rules)
    }
}

/// Render every rule followed by its recorded queries, newest first
fn list_rules(rules: &RuleSet) -> Vec<String> {
    let mut lines = Vec::new();
    for rule in rules.iter() {
        lines.push(format!(
            "Rule: {} {} {}",
            rule.action, rule.ip_range, rule.port_range
        ));
        for query in rule.queries.iter() {
            lines.push(format!("Query: {} {}", query.address, query.port));
        }
    }
    lines
}
