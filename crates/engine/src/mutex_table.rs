// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session mutex table: a global lock on the table itself, fine-grained
//! locks on each session's entry (spec.md §5 "Shared resources").

use ew_core::SessionId;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// All operations touching a single session (spawn, activity append,
/// status change, stop) execute under this session's mutex; cross-session
/// operations run in parallel (spec.md §4.5 "Per-session serialization").
#[derive(Default)]
pub struct SessionMutexTable {
    entries: SyncMutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionMutexTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires `session_id`'s mutex, creating its entry on first use. The
    /// table lock itself is held only long enough to fetch or insert the
    /// entry (spec.md §5: "global mutex on the table only").
    pub async fn lock(&self, session_id: &SessionId) -> OwnedMutexGuard<()> {
        let entry = {
            let mut entries = self.entries.lock();
            entries
                .entry(session_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        entry.lock_owned().await
    }

    /// Number of sessions with a live entry in the table. Entries are
    /// never removed; a finalized session's entry simply goes unused.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "mutex_table_tests.rs"]
mod tests;
