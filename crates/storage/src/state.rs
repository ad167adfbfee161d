// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serializable shapes of the two persisted state files (spec.md §4.3).

use ew_core::{ActiveWorkEntry, RunnerSelection, Session, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current schema version written to both files. Bump and register a
/// [`crate::migration::Migration`] when the shape changes.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// `${home}/edge-worker-state.json` (spec.md §4.3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeWorkerState {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub sessions: HashMap<SessionId, Session>,
    #[serde(default)]
    pub runner_selections: HashMap<SessionId, RunnerSelection>,
    #[serde(default)]
    pub finalized_sessions: Vec<SessionId>,
}

impl EdgeWorkerState {
    pub fn new() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            ..Self::default()
        }
    }
}

/// `${home}/active-work.json` (spec.md §4.3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveWorkFile {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub is_working: bool,
    #[serde(default)]
    pub last_updated_ms: i64,
    #[serde(default)]
    pub active_sessions: HashMap<SessionId, ActiveWorkEntry>,
}

impl ActiveWorkFile {
    pub fn new() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            ..Self::default()
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
