// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `RunnerAdapter` trait: a uniform streaming interface over a
//! heterogeneous set of agent-CLI subprocesses (spec.md §4.1).

use async_trait::async_trait;
use ew_core::{PermissionPolicy, RunnerError, RunnerEvent};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Everything a `RunnerAdapter` needs to spawn its subprocess: the prompt,
/// the workspace it runs in, and the policy flags that flow into argv
/// (spec.md §6 "Runner subprocess wire contracts").
#[derive(Debug, Clone)]
pub struct RunnerContext {
    pub prompt: String,
    pub workspace_path: PathBuf,
    pub model: String,
    pub permission_policy: PermissionPolicy,
}

/// What a flavor's adapter can do, reported up front so the dispatcher
/// knows whether streaming follow-ups are possible (spec.md §4.1
/// `Capabilities()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub json_stream: bool,
    pub supports_streaming_input: bool,
    pub resumable: bool,
}

/// Uniform streaming interface over one agent-CLI subprocess (spec.md
/// §4.1). Exactly one subprocess per adapter instance; the adapter spans
/// its lifetime, so `stop`/`add_stream_message` act on whatever `start`
/// most recently spawned rather than taking a separate handle.
#[async_trait]
pub trait RunnerAdapter: Send + Sync + 'static {
    /// Spawns the subprocess with the flavor-specific argv, reads its
    /// standard output line by line, translates each line to a
    /// [`RunnerEvent`], and invokes `on_event` in arrival order on a single
    /// logical thread of control. Blocks until the subprocess exits or
    /// until [`stop`](Self::stop) is called.
    ///
    /// Fails with [`RunnerError::SpawnFailed`] if the binary is missing,
    /// [`RunnerError::ProtocolError`] on a persistently unparseable
    /// stream, [`RunnerError::NonZeroExit`] on exit code != 0 (unless the
    /// final event flags the failure as recoverable), or
    /// [`RunnerError::Cancelled`] if stopped before an `init` event.
    async fn start(
        &self,
        ctx: RunnerContext,
        on_event: mpsc::Sender<RunnerEvent>,
    ) -> Result<(), RunnerError>;

    /// Sends a graceful termination signal; escalates to a forceful kill
    /// if the subprocess has not exited within a bounded timeout (~5s).
    /// Idempotent.
    async fn stop(&self) -> Result<(), RunnerError>;

    /// Injects a user turn for flavors that support streaming stdin. Fails
    /// with [`RunnerError::NotStreaming`] otherwise.
    async fn add_stream_message(&self, text: &str) -> Result<(), RunnerError>;

    fn capabilities(&self) -> Capabilities;
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
