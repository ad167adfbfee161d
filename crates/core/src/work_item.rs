// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work item and conversation: read-only DTOs mirrored from the external
//! issue-tracking platform (spec.md §3). The core never mutates these.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Platform-assigned work item (issue) id.
    pub struct WorkItemId;
}

crate::define_id! {
    /// Platform-assigned conversation (comment thread) id.
    pub struct ConversationId;
}

/// An issue on the external platform, used read-only by the core
/// (spec.md §3 "Work item (issue)").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    /// Human-facing identifier, e.g. `"TEST-1"`.
    pub identifier: String,
    pub title: String,
    pub description: String,
    /// Team key, matched against repository `team_keys` for routing.
    pub team_key: String,
    pub state: String,
    pub assignee: Option<String>,
    pub labels: Vec<String>,
    pub priority: Option<String>,
}

/// A comment thread or issue-level conversation (spec.md §3 "Conversation").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub work_item_id: WorkItemId,
    pub body: String,
    pub parent_id: Option<ConversationId>,
}

#[cfg(test)]
#[path = "work_item_tests.rs"]
mod tests;
