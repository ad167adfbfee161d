// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence Manager: atomic read/write of the two edge-worker state
//! files with crash-recovery load (spec.md §4.3).
//!
//! Write protocol: write to a sibling temp file, fsync, rename over the
//! target (grounded on `storage/src/snapshot.rs::Snapshot::save`'s
//! tmp-then-fsync-then-rename sequence, and `storage/src/checkpoint.rs`'s
//! background-writer shape, simplified to plain JSON — no zstd, no WAL).

use crate::migration::MigrationRegistry;
use crate::state::{ActiveWorkFile, EdgeWorkerState, CURRENT_SCHEMA_VERSION};
use ew_core::PersistError;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::warn;

const MAX_WRITE_ATTEMPTS: u32 = 5;
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);

fn state_file_name() -> &'static str {
    "edge-worker-state.json"
}

fn active_work_file_name() -> &'static str {
    "active-work.json"
}

fn io_err(path: &Path, source: std::io::Error) -> PersistError {
    PersistError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Atomically writes `value` to `path`: serialize, write to a sibling
/// `.tmp` file, fsync, rename over the target (spec.md §4.3 "Write
/// protocol").
fn atomic_write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp_path = path.with_extension("tmp");
    {
        let file = File::create(&tmp_path).map_err(|e| io_err(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        let file = writer
            .into_inner()
            .map_err(|e| io_err(&tmp_path, std::io::Error::other(e.to_string())))?;
        file.sync_all().map_err(|e| io_err(&tmp_path, e))?;
    }
    fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Writes `value` with exponential backoff, surfacing
/// [`PersistError::PersistFailed`] after [`MAX_WRITE_ATTEMPTS`] (spec.md
/// §4.3 "Failure semantics").
async fn write_with_retry<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), PersistError> {
    let mut backoff = INITIAL_BACKOFF;
    let mut last_err = None;
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        match atomic_write_json(path, value) {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!(attempt, error = %e, path = %path.display(), "persistence write failed");
                last_err = Some(e);
                if attempt < MAX_WRITE_ATTEMPTS {
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }
    Err(PersistError::PersistFailed(
        last_err.map(|e| e.to_string()).unwrap_or_default(),
    ))
}

/// Loads a JSON file, quarantining it on parse failure or unrecognized
/// `schemaVersion` (spec.md §4.3 "Load protocol"). Returns `T::default()`
/// for both a missing file and a quarantined one.
fn load_or_quarantine<T>(path: &Path) -> T
where
    T: Default + serde::de::DeserializeOwned,
{
    if !path.exists() {
        return T::default();
    }

    let parsed = File::open(path)
        .map_err(|e| io_err(path, e))
        .and_then(|file| {
            let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))?;
            let registry = MigrationRegistry::new();
            let migrated = registry
                .migrate_to(value, CURRENT_SCHEMA_VERSION)
                .map_err(|e| PersistError::Corrupt(e.to_string()))?;
            serde_json::from_value(migrated).map_err(PersistError::from)
        });

    match parsed {
        Ok(value) => value,
        Err(e) => {
            let quarantine_path = path.with_extension("json.corrupt");
            warn!(
                error = %e,
                path = %path.display(),
                quarantine = %quarantine_path.display(),
                "quarantining unreadable state file",
            );
            let _ = fs::rename(path, &quarantine_path);
            T::default()
        }
    }
}

/// Owns the on-disk state files and is the sole writer (spec.md §4.3
/// "Ownership"). Writes are coalesced by [`dirty`](Self::mark_*_dirty) flags
/// that a caller (the daemon's 500ms timer tick) drains with
/// [`flush_dirty`](Self::flush_dirty).
pub struct PersistenceManager {
    home_dir: PathBuf,
    state_dirty: AtomicBool,
    active_work_dirty: AtomicBool,
}

impl PersistenceManager {
    pub fn new(home_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            state_dirty: AtomicBool::new(false),
            active_work_dirty: AtomicBool::new(false),
        }
    }

    fn state_path(&self) -> PathBuf {
        self.home_dir.join(state_file_name())
    }

    fn active_work_path(&self) -> PathBuf {
        self.home_dir.join(active_work_file_name())
    }

    /// Load protocol: reads both files if present, otherwise treats them as
    /// empty. A corrupt or too-new file is quarantined and treated as empty.
    pub fn load(&self) -> (EdgeWorkerState, ActiveWorkFile) {
        let state = load_or_quarantine(&self.state_path());
        let active_work = load_or_quarantine(&self.active_work_path());
        (state, active_work)
    }

    /// Marks the edge-worker state file dirty; the next [`flush_dirty`]
    /// call will rewrite it.
    pub fn mark_state_dirty(&self) {
        self.state_dirty.store(true, Ordering::Relaxed);
    }

    /// Marks the active-work file dirty; the next [`flush_dirty`] call
    /// will rewrite it.
    pub fn mark_active_work_dirty(&self) {
        self.active_work_dirty.store(true, Ordering::Relaxed);
    }

    /// Writes whichever files were marked dirty since the last flush.
    /// Called on a quiescence boundary or the 500ms dirty-tick timer
    /// (spec.md §4.3 "Write protocol"); consecutive dirty ticks with
    /// nothing new to write are free.
    pub async fn flush_dirty(
        &self,
        state: &EdgeWorkerState,
        active_work: &ActiveWorkFile,
    ) -> Result<(), PersistError> {
        if self.state_dirty.swap(false, Ordering::Relaxed) {
            write_with_retry(&self.state_path(), state).await?;
        }
        if self.active_work_dirty.swap(false, Ordering::Relaxed) {
            write_with_retry(&self.active_work_path(), active_work).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
