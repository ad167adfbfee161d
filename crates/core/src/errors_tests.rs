// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::session::SessionStatus;

#[test]
fn runner_error_messages_are_stable() {
    assert_eq!(
        RunnerError::SpawnFailed("claude".into()).to_string(),
        "runner binary not found or failed to spawn: claude"
    );
    assert_eq!(
        RunnerError::NonZeroExit(2).to_string(),
        "runner exited with non-zero status 2"
    );
}

#[test]
fn dispatch_error_illegal_transition_formats_session() {
    let session = SessionId::new("s-1");
    let err = DispatchError::IllegalStatusTransition {
        session: session.clone(),
        from: SessionStatus::Complete,
        to: SessionStatus::Active,
    };
    assert!(err.to_string().contains("s-1"));
}

#[test]
fn config_error_ambiguous_team_key_lists_repos() {
    let err = ConfigError::AmbiguousTeamKey {
        team_key: "TEST".into(),
        repo_ids: vec!["repo-a".into(), "repo-b".into()],
    };
    let msg = err.to_string();
    assert!(msg.contains("TEST"));
    assert!(msg.contains("repo-a"));
}

#[test]
fn persist_error_serialize_wraps_source() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ not json }").unwrap_err();
    let err: PersistError = json_err.into();
    assert!(matches!(err, PersistError::Serialize(_)));
}
