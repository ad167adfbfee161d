// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level errors: config loading and process startup.

use ew_core::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not determine state directory (set EW_STATE_DIR or HOME)")]
    NoStateDir,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
