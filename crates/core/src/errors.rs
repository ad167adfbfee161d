// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-module error taxonomy, one `thiserror` enum per component boundary.

use crate::session::SessionId;
use thiserror::Error;

/// Errors surfaced by a Runner Adapter (spec.md §4.1).
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("runner binary not found or failed to spawn: {0}")]
    SpawnFailed(String),

    #[error("runner stream could not be parsed: {0}")]
    ProtocolError(String),

    #[error("runner exited with non-zero status {0}")]
    NonZeroExit(i32),

    #[error("runner does not support streaming input")]
    NotStreaming,

    #[error("runner was cancelled")]
    Cancelled,
}

/// Errors surfaced by the Event Dispatcher / Session Store.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("session {0} already exists")]
    DuplicateSession(SessionId),

    #[error("session {0} does not exist")]
    NoSuchSession(SessionId),

    #[error("illegal status transition for session {session}: {from:?} -> {to:?}")]
    IllegalStatusTransition {
        session: SessionId,
        from: crate::session::SessionStatus,
        to: crate::session::SessionStatus,
    },

    #[error("mutex table in an inconsistent state")]
    MutexTableFailure,
}

/// Errors surfaced by the Prompt Builder.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("no prompt template found for session")]
    MissingTemplate,

    #[error("repository could not be resolved for routing key {0:?}")]
    UnresolvableRepository(Option<String>),
}

/// Errors surfaced by the Persistence Manager.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("state file is corrupt and was quarantined: {0}")]
    Corrupt(String),

    #[error("persist failed after retries: {0}")]
    PersistFailed(String),
}

/// Errors surfaced while validating repository configuration at load time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("team key {team_key:?} matches more than one active repository: {repo_ids:?}")]
    AmbiguousTeamKey {
        team_key: String,
        repo_ids: Vec<String>,
    },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
