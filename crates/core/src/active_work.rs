// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Active-work status: the persisted snapshot of currently running
//! sessions, used to resume or report on crash recovery (spec.md §3
//! "Active-work status", GLOSSARY).

use crate::runner::RunnerFlavor;
use crate::session::SessionId;
use crate::work_item::WorkItemId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of the active-work map: session id → this (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWorkEntry {
    pub work_item_id: WorkItemId,
    pub workspace_path: String,
    pub runner_flavor: RunnerFlavor,
    pub started_at_ms: i64,
}

/// `active-work.json`'s in-memory form (spec.md §4.3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWorkState {
    pub last_updated_ms: i64,
    pub entries: HashMap<SessionId, ActiveWorkEntry>,
}

impl ActiveWorkState {
    /// `isWorking` is a derived boolean (map non-empty) (spec.md §3).
    pub fn is_working(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn insert(&mut self, session_id: SessionId, entry: ActiveWorkEntry, now_ms: i64) {
        self.entries.insert(session_id, entry);
        self.last_updated_ms = now_ms;
    }

    /// Removes a session from active-work (spec.md §4.5 "stop" handler,
    /// step 2).
    pub fn remove(&mut self, session_id: &SessionId, now_ms: i64) -> Option<ActiveWorkEntry> {
        let removed = self.entries.remove(session_id);
        if removed.is_some() {
            self.last_updated_ms = now_ms;
        }
        removed
    }
}

#[cfg(test)]
#[path = "active_work_tests.rs"]
mod tests;
