// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session: the central entity (spec.md §3 "Session").

use crate::activity::Activity;
use crate::errors::DispatchError;
use crate::repository::RepositoryId;
use crate::runner::RunnerSelection;
use crate::work_item::{ConversationId, WorkItemId};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Platform-assigned session id; the Session's primary key.
    pub struct SessionId;
}

/// Session lifecycle status (spec.md §3 "Lifecycle").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Active,
    AwaitingInput,
    Complete,
    Error,
}

impl SessionStatus {
    /// Complete/error sessions own no runner process (spec.md §3
    /// invariant (d)).
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Complete | SessionStatus::Error)
    }

    /// Whether `self -> next` is one of the lifecycle edges in spec.md §3:
    /// `pending -> active -> awaiting-input -> active`, any non-terminal
    /// state -> `complete`/`error`, and idempotent self-transitions.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        if self == next {
            return true;
        }
        match (self, next) {
            (Pending, Active) => true,
            (Pending, Error) => true,
            (Active, AwaitingInput) => true,
            (Active, Complete) => true,
            (Active, Error) => true,
            (AwaitingInput, Active) => true,
            (AwaitingInput, Complete) => true,
            (AwaitingInput, Error) => true,
            _ => false,
        }
    }
}

/// The central entity: one agent engagement tied to one conversation on one
/// work item, with one long-running subprocess (GLOSSARY).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub work_item_id: WorkItemId,
    pub conversation_id: ConversationId,
    /// Routing key; stable for the session's lifetime (invariant (e)).
    pub repository_id: RepositoryId,
    pub workspace_path: String,
    pub runner_selection: RunnerSelection,
    pub status: SessionStatus,
    pub started_at_ms: i64,
    pub ended_at_ms: Option<i64>,
    pub activities: Vec<Activity>,
    /// Highest ordinal already handed to the Persistence Manager.
    pub sync_cursor: u64,
    /// Set once a `stop` signal has been handled; a finalized session is
    /// removed from active-work and its runner-session cache entry cleared
    /// (spec.md §4.5 "AgentSessionPrompted with signal=stop").
    pub finalized: bool,
}

impl Session {
    pub fn new(
        id: SessionId,
        work_item_id: WorkItemId,
        conversation_id: ConversationId,
        repository_id: RepositoryId,
        workspace_path: impl Into<String>,
        runner_selection: RunnerSelection,
        started_at_ms: i64,
    ) -> Self {
        Self {
            id,
            work_item_id,
            conversation_id,
            repository_id,
            workspace_path: workspace_path.into(),
            runner_selection,
            status: SessionStatus::Pending,
            started_at_ms,
            ended_at_ms: None,
            activities: Vec::new(),
            sync_cursor: 0,
            finalized: false,
        }
    }

    /// Next activity ordinal, monotonically increasing (spec.md §4.2).
    pub fn next_ordinal(&self) -> u64 {
        self.activities.last().map(|a| a.ordinal + 1).unwrap_or(0)
    }

    /// Whether the trailing activity is an unreplaced ephemeral placeholder
    /// (spec.md §3 invariant (c)).
    pub fn has_trailing_ephemeral(&self) -> bool {
        self.activities.last().is_some_and(|a| a.ephemeral)
    }

    pub fn set_status(
        &mut self,
        status: SessionStatus,
        now_ms: i64,
    ) -> Result<(), DispatchError> {
        if !self.status.can_transition_to(status) {
            return Err(DispatchError::IllegalStatusTransition {
                session: self.id.clone(),
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        if status.is_terminal() {
            self.ended_at_ms = Some(now_ms);
        }
        Ok(())
    }
}

/// Test-only builder for `Session`, grounded on the donor's
/// `AgentRunBuilder` pattern.
#[cfg(any(test, feature = "test-support"))]
pub struct SessionBuilder {
    session: Session,
}

#[cfg(any(test, feature = "test-support"))]
impl SessionBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            session: Session::new(
                SessionId::new(id.into()),
                WorkItemId::new("wi-test"),
                ConversationId::new("convo-test"),
                RepositoryId::new("repo-test"),
                "/tmp/workspace",
                RunnerSelection::new(crate::runner::RunnerFlavor::Flat, "test-model"),
                0,
            ),
        }
    }

    pub fn status(mut self, status: SessionStatus) -> Self {
        self.session.status = status;
        self
    }

    pub fn repository_id(mut self, repository_id: impl Into<String>) -> Self {
        self.session.repository_id = RepositoryId::new(repository_id.into());
        self
    }

    pub fn work_item_id(mut self, work_item_id: impl Into<String>) -> Self {
        self.session.work_item_id = WorkItemId::new(work_item_id.into());
        self
    }

    pub fn activities(mut self, activities: Vec<Activity>) -> Self {
        self.session.activities = activities;
        self
    }

    pub fn build(self) -> Session {
        self.session
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
