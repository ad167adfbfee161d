// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event vocabularies: the inbound schema from the Ingest Transport
//! (spec.md §6) and the normalized runner event stream every adapter
//! translates into (spec.md §4.1).

use crate::activity::ErrorCause;
use crate::session::SessionId;
use crate::work_item::{ConversationId, WorkItemId};
use serde::{Deserialize, Serialize};

/// A signal optionally carried by `AgentSessionPrompted` (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Continue,
    Stop,
    Select,
    Auth,
}

/// A work item summary as carried on an inbound event (spec.md §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundWorkItem {
    pub id: WorkItemId,
    pub identifier: String,
    pub team_key: String,
    pub title: String,
    pub description: String,
    pub labels: Vec<String>,
}

/// An optional conversation reference on an inbound event (spec.md §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundConversation {
    pub id: ConversationId,
    pub body: String,
    pub parent_id: Option<ConversationId>,
}

/// The actor who triggered an inbound event (spec.md §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

/// The tagged record the Ingest Transport emits to the Event Dispatcher
/// (spec.md §6, §4.5 "Inbound event kinds"). Unknown kinds are ignored
/// upstream with a structured log entry, so no catch-all variant is
/// needed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum InboundEvent {
    /// Agent became assignee of an issue; create-or-find session.
    IssueAssigned {
        workspace_id: String,
        work_item: InboundWorkItem,
        actor: Actor,
        timestamp_ms: i64,
    },
    /// A new top-level comment on an issue.
    NewComment {
        workspace_id: String,
        work_item: InboundWorkItem,
        conversation: InboundConversation,
        actor: Actor,
        timestamp_ms: i64,
    },
    /// A comment mentions the agent handle; treat as a command.
    CommentMention {
        workspace_id: String,
        work_item: InboundWorkItem,
        conversation: InboundConversation,
        actor: Actor,
        timestamp_ms: i64,
    },
    /// Platform-initiated session start on a conversation.
    AgentSessionCreated {
        workspace_id: String,
        work_item: InboundWorkItem,
        conversation: Option<InboundConversation>,
        session_id: SessionId,
        actor: Actor,
        timestamp_ms: i64,
    },
    /// A follow-up prompt on an existing session, optionally carrying a
    /// signal.
    AgentSessionPrompted {
        workspace_id: String,
        work_item: InboundWorkItem,
        conversation: Option<InboundConversation>,
        session_id: SessionId,
        signal: Option<Signal>,
        actor: Actor,
        timestamp_ms: i64,
    },
}

impl InboundEvent {
    /// Short name used in structured log lines.
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::IssueAssigned { .. } => "issue_assigned",
            InboundEvent::NewComment { .. } => "new_comment",
            InboundEvent::CommentMention { .. } => "comment_mention",
            InboundEvent::AgentSessionCreated { .. } => "agent_session_created",
            InboundEvent::AgentSessionPrompted { .. } => "agent_session_prompted",
        }
    }

    /// The work item's team key, used for repository routing (spec.md
    /// §4.5 "Routing").
    pub fn team_key(&self) -> &str {
        match self {
            InboundEvent::IssueAssigned { work_item, .. }
            | InboundEvent::NewComment { work_item, .. }
            | InboundEvent::CommentMention { work_item, .. }
            | InboundEvent::AgentSessionCreated { work_item, .. }
            | InboundEvent::AgentSessionPrompted { work_item, .. } => &work_item.team_key,
        }
    }

    /// Compact one-line summary for info/debug logging.
    pub fn log_summary(&self) -> String {
        format!("{} team_key={}", self.name(), self.team_key())
    }
}

/// The invariant wire format inside the core: the normalized runner event
/// stream every flavor adapter translates its dialect into (spec.md §4.1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunnerEvent {
    /// At most once per run, always first.
    Init { session_id: String, model: String },
    /// Free-form agent reasoning/commentary.
    Thought { text: String },
    /// Tool invocation; `detail` is a pre-formatted human-readable string.
    Action { name: String, detail: String },
    /// Optional follow-up when the flavor emits tool results separately.
    ToolResult {
        name: String,
        output: String,
        is_error: bool,
    },
    /// The agent's final natural-language answer for the turn; at most one
    /// per turn.
    Final { text: String },
    /// Unrecoverable issue ending the turn, or a non-fatal command failure
    /// (distinguished by `cause.recoverable`).
    Error {
        message: String,
        cause: Option<ErrorCause>,
    },
    /// Terminal event, always last.
    Exit { code: i32 },
}

impl RunnerEvent {
    /// Whether this event ends the adapter's stream (spec.md §4.1: `exit`
    /// is "always last").
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunnerEvent::Exit { .. })
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
