// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seed scenario 2 (spec.md §8): a follow-up prompt on an active session
//! whose runner supports streaming input is injected in place, with no
//! respawn.

use crate::support::*;
use ew_adapters::{AdapterCall, FakeRunnerAdapter};
use ew_core::{ConversationId, InboundEvent, RunnerEvent, SessionId, SessionStatus};
use ew_engine::OutboundContent;
use std::sync::Arc;

#[tokio::test]
async fn streaming_follow_up_injects_a_stream_message_without_respawning() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FakeRunnerAdapter::new();
    adapter.set_capabilities(streaming_capabilities());
    adapter.set_script(vec![
        RunnerEvent::Init {
            session_id: "runner-1".into(),
            model: "test-model".into(),
        },
        RunnerEvent::Thought {
            text: "working".into(),
        },
    ]);
    let platform = Arc::new(FakePlatform::default());
    let worker = build_worker(adapter.clone(), platform.clone(), dir.path());

    worker
        .dispatch(InboundEvent::IssueAssigned {
            workspace_id: "ws-1".into(),
            work_item: work_item(),
            actor: actor(),
            timestamp_ms: 1_000,
        })
        .await;

    let session_id = SessionId::new("sess-1");
    wait_until(|| {
        worker
            .session(&session_id)
            .map(|s| s.status == SessionStatus::Active)
            .unwrap_or(false)
    })
    .await;

    adapter.clear_calls();

    worker
        .dispatch(InboundEvent::AgentSessionPrompted {
            workspace_id: "ws-1".into(),
            work_item: work_item(),
            conversation: Some(ew_core::InboundConversation {
                id: ConversationId::new("conv-2"),
                body: "also add tests".into(),
                parent_id: None,
            }),
            session_id: session_id.clone(),
            signal: None,
            actor: actor(),
            timestamp_ms: 2_000,
        })
        .await;

    wait_until(|| {
        platform
            .posted()
            .iter()
            .any(|a| matches!(&a.content, OutboundContent::Response { body } if body == "I've queued up your message as guidance."))
    })
    .await;

    let calls = adapter.calls();
    assert!(matches!(&calls[0], AdapterCall::AddStreamMessage { text } if text == "also add tests"));
    assert!(
        !calls.iter().any(|c| matches!(c, AdapterCall::Start { .. })),
        "streaming follow-up must not respawn the runner"
    );

    let session = worker.session(&session_id).unwrap();
    assert_eq!(session.status, SessionStatus::Active);
}
