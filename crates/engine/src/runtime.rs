// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker: the single explicit value tying the Event Dispatcher, Session
//! Store, and Persistence Manager together, replacing ambient global state
//! (spec.md §9).

use crate::dispatcher::{Dispatcher, PlatformClient, RunnerRegistry, WorkspaceProvisioner};
use crate::session_store::SessionStore;
use ew_core::{Clock, IdGen, InboundEvent, RepositoryConfig, Session, SessionId};
use ew_storage::PersistenceManager;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// The collaborators a [`Worker`] needs beyond its own state (grounded on
/// the donor's `RuntimeDeps<S, A, N>` grouping pattern).
pub struct WorkerDeps<W, P, Reg, Id> {
    pub workspace: Arc<W>,
    pub platform: Arc<P>,
    pub registry: Arc<Reg>,
    pub id_gen: Id,
}

/// Default interval between dirty-tick persistence flushes (spec.md §4.3
/// "the daemon's 500ms timer tick").
pub const DIRTY_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Owns the Session Store, the Event Dispatcher, and the Persistence
/// Manager for one edge worker process.
pub struct Worker<W, P, Reg, Id, C: Clock> {
    dispatcher: Arc<Dispatcher<W, P, Reg, Id, C>>,
    sessions: Arc<SessionStore<C>>,
    persistence: Arc<PersistenceManager>,
}

impl<W, P, Reg, Id, C> Worker<W, P, Reg, Id, C>
where
    W: WorkspaceProvisioner,
    P: PlatformClient,
    Reg: RunnerRegistry,
    Id: IdGen,
    C: Clock,
{
    /// Loads any persisted state from `home_dir` (spec.md §4.3 "Load
    /// protocol", crash recovery) before accepting new events.
    pub fn new(
        home_dir: impl Into<PathBuf>,
        repositories: Vec<RepositoryConfig>,
        templates: HashMap<String, String>,
        clock: Arc<C>,
        deps: WorkerDeps<W, P, Reg, Id>,
    ) -> Self {
        let persistence = Arc::new(PersistenceManager::new(home_dir.into()));
        let sessions = Arc::new(SessionStore::new(clock.clone()));

        let (state, _active_work) = persistence.load();
        sessions.restore(state);

        let dispatcher = Arc::new(Dispatcher::new(
            sessions.clone(),
            repositories,
            templates,
            deps.workspace,
            deps.platform,
            deps.registry,
            clock,
            deps.id_gen,
            persistence.clone(),
        ));

        Self {
            dispatcher,
            sessions,
            persistence,
        }
    }

    /// Routes one inbound event through the dispatcher (spec.md §4.5).
    pub async fn dispatch(&self, event: InboundEvent) {
        self.dispatcher.dispatch(event).await;
    }

    /// A snapshot of one session's current state, if it exists.
    pub fn session(&self, id: &SessionId) -> Option<Session> {
        self.sessions.get_session(id)
    }

    /// Writes whatever was marked dirty since the last flush (spec.md
    /// §4.3 "Write protocol"). Called directly by tests and by the
    /// spawned tick loop in production.
    pub async fn flush(&self) -> Result<(), ew_core::PersistError> {
        let state = self.sessions.snapshot();
        let active_work = self.sessions.active_work_snapshot();
        self.persistence.flush_dirty(&state, &active_work).await
    }

    /// Runs the dirty-tick flush loop until `shutdown` resolves (spec.md
    /// §4.3, §9 "graceful shutdown"). Intended to be spawned as its own
    /// task alongside the event-ingest loop.
    pub async fn run_persistence_tick(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.flush().await {
                tracing::warn!(error = %e, "dirty-tick persistence flush failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
