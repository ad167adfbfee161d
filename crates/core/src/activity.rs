// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A session's durable, ordered log entries (spec.md §3 "Activity").

use crate::session::SessionId;
use serde::{Deserialize, Serialize};

/// Cause of an error activity, distinguishing recoverable tool-command
/// failures from unrecoverable adapter/process failures (spec.md §4.1
/// "Failure semantics").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCause {
    pub recoverable: bool,
    pub detail: Option<String>,
}

/// The five activity kinds (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityKind {
    /// Free-form agent reasoning/commentary.
    Thought { text: String },
    /// A tool invocation, with its pre-formatted human-readable detail and
    /// an optional result once the tool completes.
    Action {
        name: String,
        parameter: String,
        result: Option<String>,
    },
    /// Assistant text delivered to the human.
    Response { body: String },
    /// An error, either unrecoverable (ends the turn) or a recoverable
    /// tool-command failure (`cause.recoverable == true`).
    Error {
        message: String,
        cause: Option<ErrorCause>,
    },
    /// A request for input from the human (e.g. a stop/select/auth signal
    /// the runner is waiting on).
    Elicitation { prompt: String },
}

/// session id + ordinal + timestamp + {kind, payload} (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub session_id: SessionId,
    pub ordinal: u64,
    pub timestamp_ms: i64,
    #[serde(flatten)]
    pub kind: ActivityKind,
    /// A placeholder to be replaced by the next append for this session
    /// (spec.md §3 invariant (c), §4.2 "ephemeral-replacement rule").
    pub ephemeral: bool,
}

impl Activity {
    pub fn new(
        session_id: SessionId,
        ordinal: u64,
        timestamp_ms: i64,
        kind: ActivityKind,
        ephemeral: bool,
    ) -> Self {
        Self {
            session_id,
            ordinal,
            timestamp_ms,
            kind,
            ephemeral,
        }
    }
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;
