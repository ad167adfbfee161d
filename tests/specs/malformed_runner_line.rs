// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seed scenario 6 (spec.md §8): a malformed line between two valid
//! runner events is skipped, and both surrounding events are processed
//! in order. The per-line skip itself is unit-tested against each
//! flavor's raw-line translator (e.g. `adapters/src/flat_tests.rs`); this
//! test covers the other half of the guarantee at the dispatcher level —
//! that a stream with an event silently missing in the middle still
//! appends and posts the events on either side of it, in order, and
//! still reaches a normal `complete` session.

use crate::support::*;
use ew_adapters::FakeRunnerAdapter;
use ew_core::{ActivityKind, InboundEvent, RunnerEvent, SessionId, SessionStatus};
use std::sync::Arc;

#[tokio::test]
async fn events_surrounding_a_dropped_malformed_line_still_process_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FakeRunnerAdapter::new();
    // A real flavor adapter would have already translated the raw stream
    // `[init, message, "{ not json }", result]` into this event script,
    // silently dropping the malformed line (spec.md §4.1 "Malformed
    // lines") rather than forwarding anything for it.
    adapter.set_script(vec![
        RunnerEvent::Init {
            session_id: "runner-1".into(),
            model: "test-model".into(),
        },
        RunnerEvent::Thought {
            text: "thinking".into(),
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
    let kinds: Vec<&ActivityKind> = session.activities.iter().map(|a| &a.kind).collect();
    assert!(matches!(kinds[0], ActivityKind::Thought { text } if text == "thinking"));
    assert!(matches!(kinds[1], ActivityKind::Response { body } if body == "Hello!"));
    assert_eq!(kinds.len(), 2, "no activity should appear for the dropped line");
}
