// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seed scenario 3 (spec.md §8): a follow-up prompt on a runner that does
//! not support streaming stops the prior runner and spawns a new one with
//! the prior prompt plus the new body; the platform-facing session id is
//! unchanged.

use crate::support::*;
use ew_adapters::{AdapterCall, FakeRunnerAdapter};
use ew_core::{ConversationId, InboundEvent, RunnerEvent, SessionId, SessionStatus};
use std::sync::Arc;

#[tokio::test]
async fn non_streaming_follow_up_stops_and_respawns_preserving_session_id() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FakeRunnerAdapter::new();
    adapter.set_capabilities(respawn_capabilities());
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
        let calls = adapter.calls();
        calls.iter().any(|c| matches!(c, AdapterCall::Start { .. }))
    })
    .await;

    let calls = adapter.calls();
    let stop_idx = calls.iter().position(|c| matches!(c, AdapterCall::Stop));
    let start_idx = calls.iter().position(|c| matches!(c, AdapterCall::Start { .. }));
    assert!(stop_idx.is_some(), "expected the prior runner to be stopped");
    assert!(start_idx.is_some(), "expected a new runner to be spawned");
    assert!(stop_idx < start_idx, "stop must precede respawn");

    if let Some(AdapterCall::Start { prompt }) = calls.get(start_idx.unwrap()) {
        assert!(prompt.contains("also add tests"));
        assert!(prompt.contains("Continuing based on new input"));
    }

    // The session id handed to the platform never changes across a respawn.
    let session = worker.session(&session_id).unwrap();
    assert_eq!(session.id, session_id);
}
