// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loads the daemon's config and persisted state directly off disk rather
//! than through a live protocol (grounded on `daemon/src/lifecycle.rs`'s
//! `Config::load()` shape; this CLI has no socket to dial, since
//! `ew-workerd` exposes no control protocol — see SPEC_FULL.md's
//! `ew-cli` scope).

use anyhow::{Context, Result};
use ew_daemon::config::{config_path, WorkerConfig};
use ew_storage::{ActiveWorkFile, EdgeWorkerState, PersistenceManager};

pub struct Snapshot {
    pub config: WorkerConfig,
    pub state: EdgeWorkerState,
    pub active_work: ActiveWorkFile,
}

/// Reads the config file and the two persisted state files it points at.
/// Returns an error only on a missing/malformed config — missing state
/// files are treated as an empty, freshly-started daemon (spec.md §4.3
/// "Load protocol").
pub fn load() -> Result<Snapshot> {
    let path = config_path().context("could not resolve config path")?;
    let config = WorkerConfig::load(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    let persistence = PersistenceManager::new(config.state_dir.clone());
    let (state, active_work) = persistence.load();
    Ok(Snapshot {
        config,
        state,
        active_work,
    })
}

impl Snapshot {
    /// Repository display name for a session, falling back to the raw id
    /// when the repository is no longer present in config.
    pub fn repository_name(&self, repository_id: &ew_core::RepositoryId) -> String {
        self.config
            .repositories
            .iter()
            .find(|r| &r.id == repository_id)
            .map(|r| r.display_name.clone())
            .unwrap_or_else(|| repository_id.to_string())
    }
}
