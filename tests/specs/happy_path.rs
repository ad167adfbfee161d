// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seed scenario 1 (spec.md §8): `IssueAssigned` produces one ephemeral
//! ack, then a `final` response mapped to a `response` activity, ending
//! the session `complete`.

use crate::support::*;
use ew_adapters::FakeRunnerAdapter;
use ew_core::{InboundEvent, RunnerEvent, SessionId, SessionStatus};
use ew_engine::OutboundContent;
use std::sync::Arc;

#[tokio::test]
async fn issue_assigned_acks_then_completes_with_a_final_response() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FakeRunnerAdapter::new();
    adapter.set_script(vec![
        RunnerEvent::Init {
            session_id: "runner-1".into(),
            model: "test-model".into(),
        },
        RunnerEvent::Final {
            text: "Hello!".into(),
        },
        RunnerEvent::Exit { code: 0 },
    ]);
    let platform = Arc::new(FakePlatform::default());
    let worker = build_worker(adapter, platform.clone(), dir.path());

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
            .map(|s| s.status == SessionStatus::Complete)
            .unwrap_or(false)
    })
    .await;

    let session = worker.session(&session_id).unwrap();
    assert_eq!(session.status, SessionStatus::Complete);

    let posted = platform.posted();
    let ephemeral_acks: Vec<_> = posted.iter().filter(|a| a.ephemeral).collect();
    assert_eq!(ephemeral_acks.len(), 1);

    let final_response = posted
        .iter()
        .find(|a| matches!(&a.content, OutboundContent::Response { body } if body == "Hello!"));
    assert!(final_response.is_some(), "expected a final response activity");

    worker.flush().await.unwrap();
}
