// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the seed end-to-end scenarios (spec.md §8): a
//! fake workspace provisioner, a recording platform client, and a
//! single-adapter runner registry, all wired through the real
//! `Worker`/`Dispatcher`/`SessionStore`/`PersistenceManager` stack.

use async_trait::async_trait;
use ew_adapters::{Capabilities, FakeRunnerAdapter, RunnerAdapter};
use ew_core::{
    ApprovalMode, FakeClock, InboundWorkItem, LabelPromptRule, PermissionPolicy, RepositoryConfig,
    RepositoryId, RunnerFlavor, SandboxLevel, SequentialIdGen, Session, SessionId,
};
use ew_engine::{EngineError, OutboundActivity, PlatformClient, RunnerRegistry, Worker, WorkerDeps, WorkspaceProvisioner};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub struct FakeWorkspace;

#[async_trait]
impl WorkspaceProvisioner for FakeWorkspace {
    async fn provision(
        &self,
        _repository: &RepositoryConfig,
        session_id: &SessionId,
    ) -> Result<String, EngineError> {
        Ok(format!("/workspaces/{session_id}"))
    }
}

#[derive(Default)]
pub struct FakePlatform {
    posted: parking_lot::Mutex<Vec<OutboundActivity>>,
}

impl FakePlatform {
    pub fn posted(&self) -> Vec<OutboundActivity> {
        self.posted.lock().clone()
    }
}

#[async_trait]
impl PlatformClient for FakePlatform {
    async fn post_activity(&self, activity: OutboundActivity) -> Result<(), EngineError> {
        self.posted.lock().push(activity);
        Ok(())
    }
}

pub struct SingleAdapterRegistry {
    pub adapter: FakeRunnerAdapter,
}

impl RunnerRegistry for SingleAdapterRegistry {
    fn adapter_for(&self, _flavor: RunnerFlavor) -> Arc<dyn RunnerAdapter> {
        Arc::new(self.adapter.clone())
    }
}

pub type TestWorker = Worker<FakeWorkspace, FakePlatform, SingleAdapterRegistry, SequentialIdGen, FakeClock>;

pub fn repository() -> RepositoryConfig {
    RepositoryConfig {
        id: RepositoryId::new("repo-1"),
        display_name: "Repo".into(),
        path: "/repo".into(),
        workspace_base_dir: "/workspaces".into(),
        base_branch: "main".into(),
        platform_workspace_id: "ws-1".into(),
        credential_handle: "cred-1".into(),
        active: true,
        allowed_tools: Vec::new(),
        label_prompts: vec![LabelPromptRule {
            label: "bug".into(),
            template: "default-template".into(),
            runner_flavor: None,
            permission_policy: None,
        }],
        default_template: "default-template".into(),
        default_runner_flavor: RunnerFlavor::Flat,
        default_permission_policy: PermissionPolicy {
            approval_mode: ApprovalMode::Manual,
            sandbox_level: SandboxLevel::WorkspaceOnly,
            allowed_tool_globs: Vec::new(),
            disallowed_tool_globs: Vec::new(),
        },
        team_keys: vec!["TEST".into()],
    }
}

pub fn templates() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("default-template".into(), "Work on {{issue.identifier}}".into());
    m
}

pub fn work_item() -> InboundWorkItem {
    InboundWorkItem {
        id: ew_core::WorkItemId::new("wi-1"),
        identifier: "TEST-1".into(),
        team_key: "TEST".into(),
        title: "hi".into(),
        description: String::new(),
        labels: Vec::new(),
    }
}

pub fn actor() -> ew_core::Actor {
    ew_core::Actor {
        id: "actor-1".into(),
        name: "Actor".into(),
    }
}

pub fn build_worker(adapter: FakeRunnerAdapter, platform: Arc<FakePlatform>, dir: &std::path::Path) -> Arc<TestWorker> {
    let clock = Arc::new(FakeClock::new(1_000));
    Arc::new(Worker::new(
        dir,
        vec![repository()],
        templates(),
        clock.clone(),
        WorkerDeps {
            workspace: Arc::new(FakeWorkspace),
            platform,
            registry: Arc::new(SingleAdapterRegistry { adapter }),
            id_gen: SequentialIdGen::new("sess"),
        },
    ))
}

pub fn streaming_capabilities() -> Capabilities {
    Capabilities {
        json_stream: true,
        supports_streaming_input: true,
        resumable: false,
    }
}

pub fn respawn_capabilities() -> Capabilities {
    Capabilities {
        json_stream: true,
        supports_streaming_input: false,
        resumable: false,
    }
}

pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition was not met in time");
}
