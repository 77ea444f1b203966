// SPDX-FileCopyrightText: 2022 DCsunset
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Command-line-per-line dispatch: tokenizes one input line, validates
//! arity and integer ranges, calls into [`crate::chord::algorithms`], and
//! formats the result per the `"< "`-prefixed output grammar.

use log::debug;

use crate::chord::algorithms;
use crate::chord::ring::ring_size;
use crate::chord::Topology;
use crate::core::{DhtError, DhtResult};

/// What running one line of input produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A line to print, already carrying the `"< "` prefix.
    Output(String),
    /// A comment, blank line, or a command with no textual result.
    Silent,
    /// `end` was read: the driver should stop after this.
    Exit,
}

/// Owns the topology for one simulation run and turns text commands into
/// calls against it.
pub struct Interpreter {
    topology: Topology,
}

impl Interpreter {
    /// `m` is the key size read from the CLI. Kept as `i64` so a
    /// non-positive value (unrepresentable as the node-count exponent)
    /// surfaces as [`DhtError::BadKeySize`] rather than panicking on cast.
    pub fn new(m: i64) -> DhtResult<Interpreter> {
        if m < 1 {
            return Err(DhtError::BadKeySize(m));
        }
        Ok(Interpreter {
            topology: Topology::new(m as u32),
        })
    }

    fn limit(&self) -> u64 {
        ring_size(self.topology.key_size())
    }

    fn parse_id(&self, token: &str) -> Result<u64, DhtError> {
        let value: i64 = token
            .parse()
            .map_err(|_| DhtError::InvalidInteger(token.to_string()))?;
        let limit = self.limit();
        if value < 0 || value as u64 >= limit {
            return Err(DhtError::IdOutOfRange { limit });
        }
        Ok(value as u64)
    }

    fn format_error(&self, err: &DhtError) -> String {
        let prefix = if err.is_syntax_error() {
            "SYNTAX ERROR"
        } else {
            "ERROR"
        };
        format!("< {}: {}", prefix, err)
    }

    fn format_list(&self) -> String {
        let ids: Vec<String> = self.topology.ids_sorted().iter().map(u64::to_string).collect();
        format!("< Nodes: {}", ids.join(", "))
    }

    fn format_show(&self, id: u64) -> Result<String, DhtError> {
        let node = self.topology.get(id)?;
        let finger: Vec<String> = node.finger.iter().map(u64::to_string).collect();
        Ok(format!(
            "< Node {}: suc {}, pre {}: finger {}",
            node.id,
            node.successor(),
            node.predecessor,
            finger.join(",")
        ))
    }

    /// Run a single line of input, returning what happened.
    ///
    /// Arity is checked before any integer is parsed; integer parsing and
    /// range checks happen before the command reaches the ring algorithms,
    /// so no mutation is ever attempted with malformed arguments (§7).
    pub fn execute_line(&mut self, line: &str) -> Outcome {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Outcome::Silent;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let cmd = tokens[0];
        let given = tokens.len() - 1;
        debug!("dispatching {:?} ({} args)", cmd, given);

        let expected = match cmd {
            "end" | "list" => 0,
            "add" | "drop" | "stab" | "fix" | "show" => 1,
            "join" => 2,
            _ => return Outcome::Output(self.format_error(&DhtError::InvalidCommand)),
        };

        if given != expected {
            let err = DhtError::Arity {
                cmd: cmd.to_string(),
                expected,
                given,
            };
            return Outcome::Output(self.format_error(&err));
        }

        if cmd == "end" {
            return Outcome::Exit;
        }

        let result: Result<Option<String>, DhtError> = match cmd {
            "list" => Ok(Some(self.format_list())),
            "add" => self.parse_id(tokens[1]).and_then(|id| {
                algorithms::add(&mut self.topology, id).map(|_| Some(format!("< Added node {}", id)))
            }),
            "drop" => self.parse_id(tokens[1]).and_then(|id| {
                algorithms::drop_node(&mut self.topology, id)
                    .map(|_| Some(format!("< Dropped node {}", id)))
            }),
            "join" => {
                let joiner = self.parse_id(tokens[1]);
                let bootstrap = self.parse_id(tokens[2]);
                joiner.and_then(|j| bootstrap.map(|b| (j, b))).and_then(|(j, b)| {
                    algorithms::join(&mut self.topology, j, b).map(|_| None)
                })
            }
            "stab" => self
                .parse_id(tokens[1])
                .and_then(|id| algorithms::stabilize(&mut self.topology, id).map(|_| None)),
            "fix" => self
                .parse_id(tokens[1])
                .and_then(|id| algorithms::fix_fingers(&mut self.topology, id).map(|_| None)),
            "show" => self.parse_id(tokens[1]).and_then(|id| self.format_show(id).map(Some)),
            _ => unreachable!("unrecognized commands are rejected above"),
        };

        match result {
            Ok(Some(output)) => Outcome::Output(output),
            Ok(None) => Outcome::Silent,
            Err(e) => Outcome::Output(self.format_error(&e)),
        }
    }
}
