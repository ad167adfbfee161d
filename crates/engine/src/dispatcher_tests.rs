// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::formatter::OutboundContent;
use async_trait::async_trait;
use ew_adapters::{Capabilities, FakeRunnerAdapter};
use ew_core::{
    Actor, ApprovalMode, FakeClock, InboundWorkItem, LabelPromptRule, PermissionPolicy,
    RepositoryId, SandboxLevel, SequentialIdGen,
};
use std::time::Duration;

struct FakeWorkspace;

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
struct FakePlatform {
    posted: parking_lot::Mutex<Vec<OutboundActivity>>,
}

impl FakePlatform {
    fn posted(&self) -> Vec<OutboundActivity> {
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

struct FakeRegistry {
    adapter: FakeRunnerAdapter,
}

impl RunnerRegistry for FakeRegistry {
    fn adapter_for(&self, _flavor: RunnerFlavor) -> Arc<dyn RunnerAdapter> {
        Arc::new(self.adapter.clone())
    }
}

type TestDispatcher = Dispatcher<FakeWorkspace, FakePlatform, FakeRegistry, SequentialIdGen, FakeClock>;

fn repository() -> RepositoryConfig {
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

fn templates() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert(
        "default-template".into(),
        "Work on {{issue.identifier}}".into(),
    );
    m
}

fn work_item() -> InboundWorkItem {
    InboundWorkItem {
        id: ew_core::WorkItemId::new("wi-1"),
        identifier: "TEST-1".into(),
        team_key: "TEST".into(),
        title: "Title".into(),
        description: "Description".into(),
        labels: Vec::new(),
    }
}

fn actor() -> Actor {
    Actor {
        id: "actor-1".into(),
        name: "Actor".into(),
    }
}

fn build(
    adapter: FakeRunnerAdapter,
    platform: Arc<FakePlatform>,
) -> Arc<TestDispatcher> {
    // Leaked so the directory outlives the dispatcher; these tests never
    // exercise flush_dirty, so nothing is ever written to it.
    let dir = Box::leak(Box::new(tempfile::tempdir().expect("tempdir")));
    let clock = Arc::new(FakeClock::new(1_000));
    Arc::new(Dispatcher::new(
        Arc::new(SessionStore::new(clock.clone())),
        vec![repository()],
        templates(),
        Arc::new(FakeWorkspace),
        platform,
        Arc::new(FakeRegistry { adapter }),
        clock,
        SequentialIdGen::new("sess"),
        Arc::new(ew_storage::PersistenceManager::new(dir.path())),
    ))
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition was not met in time");
}

#[tokio::test]
async fn unmatched_team_key_is_ignored_without_creating_a_session() {
    let adapter = FakeRunnerAdapter::new();
    let platform = Arc::new(FakePlatform::default());
    let dispatcher = build(adapter, platform.clone());

    let mut item = work_item();
    item.team_key = "OTHER".into();

    dispatcher
        .dispatch(InboundEvent::IssueAssigned {
            workspace_id: "ws".into(),
            work_item: item,
            actor: actor(),
            timestamp_ms: 1_000,
        })
        .await;

    assert!(platform.posted().is_empty());
}

#[tokio::test]
async fn session_created_flow_acks_then_completes_after_final_and_exit() {
    let adapter = FakeRunnerAdapter::new();
    adapter.set_script(vec![
        RunnerEvent::Init {
            session_id: "r1".into(),
            model: "m".into(),
        },
        RunnerEvent::Thought {
            text: "thinking".into(),
        },
        RunnerEvent::Final {
            text: "all done".into(),
        },
        RunnerEvent::Exit { code: 0 },
    ]);
    let platform = Arc::new(FakePlatform::default());
    let dispatcher = build(adapter.clone(), platform.clone());

    let session_id = SessionId::new("s1");
    dispatcher
        .dispatch(InboundEvent::AgentSessionCreated {
            workspace_id: "ws".into(),
            work_item: work_item(),
            conversation: None,
            session_id: session_id.clone(),
            actor: actor(),
            timestamp_ms: 1_000,
        })
        .await;

    // Step 2's ephemeral ack is synchronous.
    let posted = platform.posted();
    assert_eq!(posted.len(), 1);
    assert!(posted[0].ephemeral);

    wait_until(|| dispatcher.sessions.get_session(&session_id).unwrap().status == SessionStatus::Complete).await;

    let session = dispatcher.sessions.get_session(&session_id).unwrap();
    assert!(session
        .activities
        .iter()
        .any(|a| matches!(&a.kind, ActivityKind::Thought { text } if text == "thinking")));

    let calls = adapter.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        ew_adapters::AdapterCall::Start { prompt } => assert_eq!(prompt, "Work on TEST-1"),
        other => panic!("unexpected call: {other:?}"),
    }

    let final_posted = platform.posted();
    assert!(final_posted
        .iter()
        .any(|a| matches!(&a.content, OutboundContent::Response { body } if body == "all done")));
}

#[tokio::test]
async fn non_zero_exit_without_final_marks_session_as_error() {
    let adapter = FakeRunnerAdapter::new();
    adapter.set_script(vec![
        RunnerEvent::Init {
            session_id: "r1".into(),
            model: "m".into(),
        },
        RunnerEvent::Exit { code: 1 },
    ]);
    let platform = Arc::new(FakePlatform::default());
    let dispatcher = build(adapter, platform.clone());

    let session_id = SessionId::new("s1");
    dispatcher
        .dispatch(InboundEvent::AgentSessionCreated {
            workspace_id: "ws".into(),
            work_item: work_item(),
            conversation: None,
            session_id: session_id.clone(),
            actor: actor(),
            timestamp_ms: 1_000,
        })
        .await;

    wait_until(|| dispatcher.sessions.get_session(&session_id).unwrap().status == SessionStatus::Error).await;
}

#[tokio::test]
async fn stop_signal_is_idempotent_and_marks_session_finalized() {
    let adapter = FakeRunnerAdapter::new();
    adapter.set_capabilities(Capabilities {
        json_stream: true,
        supports_streaming_input: true,
        resumable: false,
    });
    adapter.set_script(vec![RunnerEvent::Init {
        session_id: "r1".into(),
        model: "m".into(),
    }]);
    let platform = Arc::new(FakePlatform::default());
    let dispatcher = build(adapter.clone(), platform.clone());

    let session_id = SessionId::new("s1");
    dispatcher
        .dispatch(InboundEvent::AgentSessionCreated {
            workspace_id: "ws".into(),
            work_item: work_item(),
            conversation: None,
            session_id: session_id.clone(),
            actor: actor(),
            timestamp_ms: 1_000,
        })
        .await;

    wait_until(|| dispatcher.sessions.get_session(&session_id).unwrap().status == SessionStatus::Active).await;

    dispatcher
        .dispatch(InboundEvent::AgentSessionPrompted {
            workspace_id: "ws".into(),
            work_item: work_item(),
            conversation: None,
            session_id: session_id.clone(),
            signal: Some(Signal::Stop),
            actor: actor(),
            timestamp_ms: 2_000,
        })
        .await;

    let session = dispatcher.sessions.get_session(&session_id).unwrap();
    assert!(session.finalized);
    assert_eq!(session.status, SessionStatus::Complete);
    assert!(adapter.calls().iter().any(|c| matches!(c, ew_adapters::AdapterCall::Stop)));

    let stop_count_before = adapter.calls().len();

    // Second stop signal is a no-op: no additional Stop() call.
    dispatcher
        .dispatch(InboundEvent::AgentSessionPrompted {
            workspace_id: "ws".into(),
            work_item: work_item(),
            conversation: None,
            session_id: session_id.clone(),
            signal: Some(Signal::Stop),
            actor: actor(),
            timestamp_ms: 3_000,
        })
        .await;

    assert_eq!(adapter.calls().len(), stop_count_before);
}

#[tokio::test]
async fn prompted_with_streaming_support_injects_stream_message() {
    let adapter = FakeRunnerAdapter::new();
    adapter.set_capabilities(Capabilities {
        json_stream: true,
        supports_streaming_input: true,
        resumable: false,
    });
    adapter.set_script(vec![RunnerEvent::Init {
        session_id: "r1".into(),
        model: "m".into(),
    }]);
    let platform = Arc::new(FakePlatform::default());
    let dispatcher = build(adapter.clone(), platform.clone());

    let session_id = SessionId::new("s1");
    dispatcher
        .dispatch(InboundEvent::AgentSessionCreated {
            workspace_id: "ws".into(),
            work_item: work_item(),
            conversation: None,
            session_id: session_id.clone(),
            actor: actor(),
            timestamp_ms: 1_000,
        })
        .await;

    wait_until(|| dispatcher.sessions.get_session(&session_id).unwrap().status == SessionStatus::Active).await;

    dispatcher
        .dispatch(InboundEvent::AgentSessionPrompted {
            workspace_id: "ws".into(),
            work_item: work_item(),
            conversation: Some(ew_core::InboundConversation {
                id: ew_core::ConversationId::new("c1"),
                body: "please also check the tests".into(),
                parent_id: None,
            }),
            session_id: session_id.clone(),
            signal: None,
            actor: actor(),
            timestamp_ms: 2_000,
        })
        .await;

    assert!(adapter.calls().iter().any(|c| matches!(
        c,
        ew_adapters::AdapterCall::AddStreamMessage { text } if text == "please also check the tests"
    )));
}

#[tokio::test]
async fn prompted_without_streaming_support_stops_and_respawns() {
    let adapter = FakeRunnerAdapter::new();
    adapter.set_capabilities(Capabilities {
        json_stream: true,
        supports_streaming_input: false,
        resumable: false,
    });
    adapter.set_script(vec![RunnerEvent::Init {
        session_id: "r1".into(),
        model: "m".into(),
    }]);
    let platform = Arc::new(FakePlatform::default());
    let dispatcher = build(adapter.clone(), platform.clone());

    let session_id = SessionId::new("s1");
    dispatcher
        .dispatch(InboundEvent::AgentSessionCreated {
            workspace_id: "ws".into(),
            work_item: work_item(),
            conversation: None,
            session_id: session_id.clone(),
            actor: actor(),
            timestamp_ms: 1_000,
        })
        .await;

    wait_until(|| dispatcher.sessions.get_session(&session_id).unwrap().status == SessionStatus::Active).await;

    dispatcher
        .dispatch(InboundEvent::AgentSessionPrompted {
            workspace_id: "ws".into(),
            work_item: work_item(),
            conversation: Some(ew_core::InboundConversation {
                id: ew_core::ConversationId::new("c1"),
                body: "one more thing".into(),
                parent_id: None,
            }),
            session_id: session_id.clone(),
            signal: None,
            actor: actor(),
            timestamp_ms: 2_000,
        })
        .await;

    wait_until(|| {
        adapter
            .calls()
            .iter()
            .filter(|c| matches!(c, ew_adapters::AdapterCall::Start { .. }))
            .count()
            == 2
    })
    .await;

    assert!(adapter.calls().iter().any(|c| matches!(c, ew_adapters::AdapterCall::Stop)));
    match adapter.calls().iter().rev().find_map(|c| match c {
        ew_adapters::AdapterCall::Start { prompt } => Some(prompt.clone()),
        _ => None,
    }) {
        Some(prompt) => assert!(prompt.contains("one more thing")),
        None => panic!("expected a respawn Start call"),
    }
}
