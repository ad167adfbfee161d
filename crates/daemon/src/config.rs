// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config surface (spec.md §6): repository list, runner binary defaults
//! per flavor, the agent mention handle, the durable-state directory, and
//! log level, loaded once at startup and handed to the dispatcher as
//! `Arc<WorkerConfig>` (grounded on `daemon::lifecycle::Config::load()`'s
//! fixed-path-resolution shape, re-targeted at a TOML file instead of a
//! fixed set of sibling state files).

use ew_core::{validate_team_key_routing, ConfigError, RepositoryConfig, RunnerFlavor};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn default_log_level() -> String {
    "info".to_string()
}

/// Which binary to exec for a given runner flavor (spec.md §6 "runner
/// defaults per flavor").
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerBinaryConfig {
    pub flavor: RunnerFlavor,
    pub binary: String,
}

/// Immutable-after-load daemon configuration (spec.md §6 "Config
/// surface").
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    pub repositories: Vec<RepositoryConfig>,
    pub templates: HashMap<String, String>,
    pub runner_binaries: Vec<RunnerBinaryConfig>,
    pub agent_handle: String,
    pub state_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl WorkerConfig {
    /// Parses `path` and rejects ambiguous team-key routing (spec.md §9
    /// Open Question 3) before the daemon ever accepts an event.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: WorkerConfig = toml::from_str(&contents)?;
        validate_team_key_routing(&config.repositories)?;
        Ok(config)
    }

    /// Binary configured for `flavor`, if any (spec.md §6 "runner defaults
    /// per flavor").
    pub fn binary_for(&self, flavor: RunnerFlavor) -> Option<&str> {
        self.runner_binaries
            .iter()
            .find(|r| r.flavor == flavor)
            .map(|r| r.binary.as_str())
    }
}

/// Resolves the config file path: `EW_CONFIG_PATH` overrides, otherwise
/// `$XDG_CONFIG_HOME/ew-workerd/config.toml` or `~/.config/ew-workerd/config.toml`
/// (grounded on the donor's `env::state_dir()` env-var precedence, applied
/// to config rather than state).
pub fn config_path() -> Result<PathBuf, crate::error::DaemonError> {
    if let Ok(path) = std::env::var("EW_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("ew-workerd/config.toml"));
    }
    let home = std::env::var("HOME").map_err(|_| crate::error::DaemonError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".config/ew-workerd/config.toml"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
