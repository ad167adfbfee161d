// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema migration for the two persisted state files.
//!
//! Migrations transform a file's JSON from one `schemaVersion` to the next.
//! The registry chains migrations to reach the current version.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration v{from}→v{to} failed: {reason}")]
    Failed { from: u32, to: u32, reason: String },
    #[error("no migration path from v{0} to v{1}")]
    NoPath(u32, u32),
    #[error("schema version {0} is newer than supported ({1})")]
    TooNew(u32, u32),
}

/// A migration from one schema version to the next.
pub trait Migration: Send + Sync {
    fn source_version(&self) -> u32;
    fn target_version(&self) -> u32;
    fn migrate(&self, doc: &mut Value) -> Result<(), MigrationError>;
}

/// Registry of migrations for upgrading a persisted file's JSON.
#[derive(Default)]
pub struct MigrationRegistry {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRegistry {
    /// Registry with all known migrations. Only version 1 exists today, so
    /// this starts empty; new migrations get pushed here as schemas evolve.
    pub fn new() -> Self {
        Self {
            migrations: Vec::new(),
        }
    }

    /// Migrate `doc`'s `schemaVersion` field to `target`.
    pub fn migrate_to(&self, mut doc: Value, target: u32) -> Result<Value, MigrationError> {
        let current = doc
            .get("schemaVersion")
            .and_then(|v| v.as_u64())
            .unwrap_or(1) as u32;

        if current == target {
            return Ok(doc);
        }
        if current > target {
            return Err(MigrationError::TooNew(current, target));
        }

        let mut version = current;
        while version < target {
            let migration = self
                .migrations
                .iter()
                .find(|m| m.source_version() == version)
                .ok_or(MigrationError::NoPath(version, target))?;

            migration.migrate(&mut doc)?;
            version = migration.target_version();

            if let Some(obj) = doc.as_object_mut() {
                obj.insert("schemaVersion".into(), version.into());
            }
        }
        Ok(doc)
    }
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
