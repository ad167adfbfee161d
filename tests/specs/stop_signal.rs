// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seed scenario 4 (spec.md §8): an explicit stop signal calls `Stop()`
//! exactly once, ends the session `complete` with a "I've stopped
//! working." response, and is idempotent on a second delivery.

use crate::support::*;
use ew_adapters::{AdapterCall, FakeRunnerAdapter};
use ew_core::{InboundEvent, RunnerEvent, SessionId, SessionStatus, Signal};
use ew_engine::OutboundContent;
use std::sync::Arc;

#[tokio::test]
async fn stop_signal_ends_the_session_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FakeRunnerAdapter::new();
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
            conversation: None,
            session_id: session_id.clone(),
            signal: Some(Signal::Stop),
            actor: actor(),
            timestamp_ms: 2_000,
        })
        .await;

    wait_until(|| {
        worker
            .session(&session_id)
            .map(|s| s.status == SessionStatus::Complete && s.finalized)
            .unwrap_or(false)
    })
    .await;

    let stop_calls = adapter.calls().into_iter().filter(|c| matches!(c, AdapterCall::Stop)).count();
    assert_eq!(stop_calls, 1, "Stop() must be called exactly once");

    let posted = platform.posted();
    assert!(posted
        .iter()
        .any(|a| matches!(&a.content, OutboundContent::Response { body } if body == "I've stopped working.")));

    // A second stop signal is a no-op.
    adapter.clear_calls();
    worker
        .dispatch(InboundEvent::AgentSessionPrompted {
            workspace_id: "ws-1".into(),
            work_item: work_item(),
            conversation: None,
            session_id: session_id.clone(),
            signal: Some(Signal::Stop),
            actor: actor(),
            timestamp_ms: 3_000,
        })
        .await;

    assert!(adapter.calls().is_empty(), "a second stop must be a no-op");
}
