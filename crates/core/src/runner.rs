// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner selection: which agent CLI flavor a session uses and under what
//! permission policy (spec.md §3 "Runner selection").

use serde::{Deserialize, Serialize};

/// Which agent CLI dialect a session's runner subprocess speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerFlavor {
    /// Flat dialect: `{type:"message"|"tool_use"|"result"|"init"}`.
    Flat,
    /// Paired dialect: `{type:"item.started"}` / `{type:"item.completed"}`.
    ItemPair,
}

/// How aggressively a runner may act without asking for approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    /// Every tool invocation requires human approval.
    Manual,
    /// Tool invocations matching `allowed_tool_globs` run unattended.
    AllowListed,
    /// All tool invocations run unattended.
    Full,
}

/// Filesystem/network isolation level passed through to the runner binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxLevel {
    None,
    WorkspaceOnly,
    ReadOnly,
}

/// Flags derived from repository config (optionally overridden per label)
/// and passed through to the runner's argv. The core never interprets these
/// beyond plumbing them to the adapter; it does not implement sandboxing
/// itself (spec.md §1 non-goals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionPolicy {
    pub approval_mode: ApprovalMode,
    pub sandbox_level: SandboxLevel,
    pub allowed_tool_globs: Vec<String>,
    pub disallowed_tool_globs: Vec<String>,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self {
            approval_mode: ApprovalMode::Manual,
            sandbox_level: SandboxLevel::WorkspaceOnly,
            allowed_tool_globs: Vec::new(),
            disallowed_tool_globs: Vec::new(),
        }
    }
}

/// {flavor, model, permission policy} chosen for a session (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerSelection {
    pub flavor: RunnerFlavor,
    pub model: String,
    pub permission_policy: PermissionPolicy,
}

impl RunnerSelection {
    pub fn new(flavor: RunnerFlavor, model: impl Into<String>) -> Self {
        Self {
            flavor,
            model: model.into(),
            permission_policy: PermissionPolicy::default(),
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
