// SPDX-FileCopyrightText: 2022 DCsunset
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use thiserror::Error;

/// Every failure the simulator can report, per-command and startup alike.
///
/// Variants map one-to-one onto the error taxonomy the command interpreter
/// is expected to produce; the `#[error(...)]` text is the message the
/// interpreter prints after the `"< ERROR: "` / `"< SYNTAX ERROR: "` prefix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DhtError {
    #[error("invalid command")]
    InvalidCommand,

    #[error("invalid integer {0}")]
    InvalidInteger(String),

    #[error("node id must be in [0,{limit})")]
    IdOutOfRange { limit: u64 },

    #[error("{cmd} expects {expected} parameters not {given}")]
    Arity {
        cmd: String,
        expected: usize,
        given: usize,
    },

    #[error("Node {0} does not exist")]
    NodeNotFound(u64),

    #[error("Node {0} exists")]
    NodeExists(u64),

    #[error("key size must be at least 1, got {0}")]
    BadKeySize(i64),

    #[error("input file {0} not found")]
    InputFileMissing(String),
}

impl DhtError {
    /// Per §6/§7: only `Arity` uses the `SYNTAX ERROR:` prefix, all other
    /// per-command errors use `ERROR:`. Startup-time fatal errors
    /// (`BadKeySize`, `InputFileMissing`) are never routed through this.
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, DhtError::Arity { .. })
    }
}

pub type DhtResult<T> = Result<T, DhtError>;
