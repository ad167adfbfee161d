// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Store: in-memory map of sessions, their ordered activity logs,
//! and the ephemeral-activity replacement rule (spec.md §4.2).

use ew_core::{Activity, ActivityKind, Clock, DispatchError, Session, SessionId, SessionStatus};
use ew_storage::{ActiveWorkFile, EdgeWorkerState, CURRENT_SCHEMA_VERSION};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Exclusively owns `Session` records and their activity logs; external
/// callers receive cloned snapshots, never a live reference (spec.md §3
/// "Ownership").
pub struct SessionStore<C: Clock> {
    sessions: Mutex<HashMap<SessionId, Session>>,
    clock: Arc<C>,
}

impl<C: Clock> SessionStore<C> {
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Fails with [`DispatchError::DuplicateSession`] if `id` already
    /// exists (spec.md §4.2).
    pub fn create_session(&self, session: Session) -> Result<Session, DispatchError> {
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(&session.id) {
            return Err(DispatchError::DuplicateSession(session.id));
        }
        let id = session.id.clone();
        let snapshot = session.clone();
        sessions.insert(id, session);
        Ok(snapshot)
    }

    pub fn get_session(&self, id: &SessionId) -> Option<Session> {
        self.sessions.lock().get(id).cloned()
    }

    /// Appends `kind` to `id`'s activity log, assigning the next ordinal
    /// and the current timestamp. If the trailing activity is ephemeral,
    /// it is removed atomically before the new one is appended (spec.md
    /// §4.2 "ephemeral-replacement rule", §9 "must be atomic with the
    /// next append").
    pub fn append_activity(
        &self,
        id: &SessionId,
        kind: ActivityKind,
        ephemeral: bool,
    ) -> Result<Activity, DispatchError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| DispatchError::NoSuchSession(id.clone()))?;

        if session.has_trailing_ephemeral() {
            session.activities.pop();
        }

        let activity = Activity::new(
            id.clone(),
            session.next_ordinal(),
            self.clock.now_ms(),
            kind,
            ephemeral,
        );
        session.activities.push(activity.clone());
        Ok(activity)
    }

    /// Enforces the legal transitions in [`SessionStatus::can_transition_to`].
    pub fn set_status(&self, id: &SessionId, status: SessionStatus) -> Result<(), DispatchError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| DispatchError::NoSuchSession(id.clone()))?;
        session.set_status(status, self.clock.now_ms())
    }

    pub fn mark_finalized(&self, id: &SessionId) -> Result<(), DispatchError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| DispatchError::NoSuchSession(id.clone()))?;
        session.finalized = true;
        Ok(())
    }

    /// Deep-copy snapshot suitable for the Persistence Manager (spec.md
    /// §4.2 `Snapshot()`, §4.3 `edge-worker-state.json` shape).
    pub fn snapshot(&self) -> EdgeWorkerState {
        let sessions = self.sessions.lock();
        let mut state = EdgeWorkerState {
            schema_version: CURRENT_SCHEMA_VERSION,
            sessions: HashMap::new(),
            runner_selections: HashMap::new(),
            finalized_sessions: Vec::new(),
        };
        for (id, session) in sessions.iter() {
            state
                .runner_selections
                .insert(id.clone(), session.runner_selection.clone());
            if session.finalized {
                state.finalized_sessions.push(id.clone());
            }
            state.sessions.insert(id.clone(), session.clone());
        }
        state
    }

    /// Active-work view of the currently non-finalized sessions (spec.md
    /// §4.3 `active-work.json` shape).
    pub fn active_work_snapshot(&self) -> ActiveWorkFile {
        let sessions = self.sessions.lock();
        let mut file = ActiveWorkFile {
            schema_version: CURRENT_SCHEMA_VERSION,
            is_working: false,
            last_updated_ms: self.clock.now_ms(),
            active_sessions: HashMap::new(),
        };
        for (id, session) in sessions.iter() {
            if session.finalized || session.status.is_terminal() {
                continue;
            }
            file.active_sessions.insert(
                id.clone(),
                ew_core::ActiveWorkEntry {
                    work_item_id: session.work_item_id.clone(),
                    workspace_path: session.workspace_path.clone(),
                    runner_flavor: session.runner_selection.flavor,
                    started_at_ms: session.started_at_ms,
                },
            );
        }
        file.is_working = !file.active_sessions.is_empty();
        file
    }

    /// Loads sessions from a previously persisted snapshot (crash
    /// recovery), restoring the finalized flag from `finalized_sessions`.
    pub fn restore(&self, state: EdgeWorkerState) {
        let mut sessions = self.sessions.lock();
        sessions.clear();
        for (id, mut session) in state.sessions {
            session.finalized = state.finalized_sessions.contains(&id);
            sessions.insert(id, session);
        }
    }
}

#[cfg(test)]
#[path = "session_store_tests.rs"]
mod tests;
