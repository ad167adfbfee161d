// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by the engine's external collaborators: workspace
//! provisioning and the outbound platform client (spec.md §1 "Out of
//! scope", §7 "Platform API errors").

use thiserror::Error;

/// Failures from the workspace provisioner or platform client
/// collaborators. These are bounded to a single session's background task
/// (spec.md §7 "Propagation policy": "per-session errors are contained
/// within the session task").
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("workspace provisioning failed: {0}")]
    WorkspaceProvisionFailed(String),

    #[error("platform API call failed: {0}")]
    PlatformCallFailed(String),
}
