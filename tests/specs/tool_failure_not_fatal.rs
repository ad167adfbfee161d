// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seed scenario 5 (spec.md §8): a failed tool command produces a
//! recoverable `error` activity but does not end the session; a
//! subsequent `final` still completes it normally.

use crate::support::*;
use ew_adapters::FakeRunnerAdapter;
use ew_core::{ActivityKind, InboundEvent, RunnerEvent, SessionId, SessionStatus};
use std::sync::Arc;

#[tokio::test]
async fn failed_tool_command_is_recoverable_and_session_still_completes() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FakeRunnerAdapter::new();
    adapter.set_script(vec![
        RunnerEvent::Init {
            session_id: "runner-1".into(),
            model: "test-model".into(),
        },
        RunnerEvent::ToolResult {
            name: "run_tests".into(),
            output: "exit code 2".into(),
            is_error: true,
        },
        RunnerEvent::Final {
            text: "Done, with one failing check.".into(),
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

    let errors: Vec<_> = session
        .activities
        .iter()
        .filter(|a| matches!(&a.kind, ActivityKind::Error { .. }))
        .collect();
    assert_eq!(errors.len(), 1);
    if let ActivityKind::Error { cause, .. } = &errors[0].kind {
        assert!(cause.as_ref().is_some_and(|c| c.recoverable));
    }

    let responses: Vec<_> = session
        .activities
        .iter()
        .filter(|a| matches!(&a.kind, ActivityKind::Response { .. }))
        .collect();
    assert_eq!(responses.len(), 1);
}
