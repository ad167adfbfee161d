// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace provisioning: one directory per session under the
//! repository's configured base dir (grounded on the donor's
//! `engine::workspace::prepare_for_agent`'s create-dir-all shape; no git
//! clone or settings-file machinery survives, since neither the runbook
//! nor the project-settings concerns it served exist in this system).

use async_trait::async_trait;
use ew_core::{RepositoryConfig, SessionId};
use ew_engine::{EngineError, WorkspaceProvisioner};
use std::path::PathBuf;

pub struct FsWorkspaceProvisioner;

#[async_trait]
impl WorkspaceProvisioner for FsWorkspaceProvisioner {
    async fn provision(
        &self,
        repository: &RepositoryConfig,
        session_id: &SessionId,
    ) -> Result<String, EngineError> {
        let path = PathBuf::from(&repository.workspace_base_dir).join(session_id.as_str());
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| EngineError::WorkspaceProvisionFailed(e.to_string()))?;
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
#[path = "workspace_daemon_tests.rs"]
mod tests;
