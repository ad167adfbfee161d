// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flat-dialect adapter: `{type:"message"|"tool_use"|"result"|"init"}`
//! (spec.md §4.1).

use crate::adapter::{Capabilities, RunnerAdapter, RunnerContext};
use crate::subprocess::{spawn_streaming, stop_with_grace, SPAWN_TIMEOUT, STOP_GRACE};
use async_trait::async_trait;
use ew_core::{ErrorCause, RunnerError, RunnerEvent};
use serde::Deserialize;
use tokio::io::AsyncBufReadExt;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex};

/// One line of the flat dialect's JSON stream.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FlatLine {
    Init {
        session_id: String,
        #[serde(default)]
        model: Option<String>,
    },
    Message {
        text: String,
    },
    ToolUse {
        name: String,
        #[serde(default)]
        detail: Option<String>,
    },
    Result {
        #[serde(default)]
        output: Option<String>,
        #[serde(default)]
        is_error: bool,
        #[serde(default)]
        exit_code: Option<i32>,
    },
}

/// Translates one flat-dialect line into zero or more normalized events.
/// Malformed lines return `None` and are logged by the caller, never
/// terminating the stream (spec.md §4.1 "Malformed lines").
fn translate(line: &str) -> Option<Vec<RunnerEvent>> {
    let parsed: FlatLine = serde_json::from_str(line).ok()?;
    Some(match parsed {
        FlatLine::Init { session_id, model } => vec![RunnerEvent::Init {
            session_id,
            model: model.unwrap_or_default(),
        }],
        FlatLine::Message { text } => vec![RunnerEvent::Thought { text }],
        FlatLine::ToolUse { name, detail } => vec![RunnerEvent::Action {
            name,
            detail: detail.unwrap_or_default(),
        }],
        FlatLine::Result {
            output,
            is_error,
            exit_code,
        } => {
            let text = output.unwrap_or_default();
            if is_error {
                vec![RunnerEvent::Error {
                    message: text,
                    cause: Some(ErrorCause {
                        recoverable: exit_code.is_some(),
                        detail: exit_code.map(|c| format!("exit code {c}")),
                    }),
                }]
            } else {
                vec![RunnerEvent::Final { text }]
            }
        }
    })
}

/// Adapter for agent CLIs emitting the flat dialect over a direct child
/// process (no terminal multiplexer — spec.md §4.1 reads subprocess stdout
/// directly). Exactly one subprocess lives in `child` at a time, shared
/// between the task blocked in `start` and a concurrent caller of `stop`.
pub struct FlatDialectAdapter {
    binary: String,
    child: Mutex<Option<Child>>,
}

impl FlatDialectAdapter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            child: Mutex::new(None),
        }
    }

    fn build_command(&self, ctx: &RunnerContext) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.current_dir(&ctx.workspace_path);
        cmd.arg("--model").arg(&ctx.model);
        cmd.arg("--approval-mode")
            .arg(format!("{:?}", ctx.permission_policy.approval_mode));
        for glob in &ctx.permission_policy.allowed_tool_globs {
            cmd.arg("--allow-tool").arg(glob);
        }
        for glob in &ctx.permission_policy.disallowed_tool_globs {
            cmd.arg("--disallow-tool").arg(glob);
        }
        cmd.arg("--prompt").arg(&ctx.prompt);
        cmd
    }
}

#[async_trait]
impl RunnerAdapter for FlatDialectAdapter {
    async fn start(
        &self,
        ctx: RunnerContext,
        on_event: mpsc::Sender<RunnerEvent>,
    ) -> Result<(), RunnerError> {
        let cmd = self.build_command(&ctx);
        let (child, mut lines) =
            spawn_streaming(cmd).map_err(|e| RunnerError::SpawnFailed(e.to_string()))?;
        *self.child.lock().await = Some(child);

        let mut saw_init = false;
        let init_wait = tokio::time::sleep(SPAWN_TIMEOUT);
        tokio::pin!(init_wait);

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.map_err(|e| RunnerError::ProtocolError(e.to_string()))? else {
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let Some(events) = translate(&line) else {
                        tracing::warn!(%line, "skipping malformed runner line");
                        continue;
                    };
                    let mut sender_closed = false;
                    for event in events {
                        if matches!(event, RunnerEvent::Init { .. }) {
                            saw_init = true;
                        }
                        if on_event.send(event).await.is_err() {
                            sender_closed = true;
                            break;
                        }
                    }
                    if sender_closed {
                        break;
                    }
                }
                _ = &mut init_wait, if !saw_init => {
                    self.stop().await?;
                    return Err(RunnerError::SpawnFailed("timed out waiting for init event".into()));
                }
            }
        }

        let mut guard = self.child.lock().await;
        let Some(child) = guard.as_mut() else {
            return Ok(());
        };
        let status = child
            .wait()
            .await
            .map_err(|e| RunnerError::ProtocolError(e.to_string()))?;
        *guard = None;
        drop(guard);
        match status.code() {
            Some(0) | None => {
                let _ = on_event.send(RunnerEvent::Exit { code: 0 }).await;
                Ok(())
            }
            Some(code) => {
                let _ = on_event.send(RunnerEvent::Exit { code }).await;
                Err(RunnerError::NonZeroExit(code))
            }
        }
    }

    async fn stop(&self) -> Result<(), RunnerError> {
        let mut guard = self.child.lock().await;
        if let Some(child) = guard.as_mut() {
            stop_with_grace(child, STOP_GRACE)
                .await
                .map_err(|e| RunnerError::ProtocolError(e.to_string()))?;
        }
        *guard = None;
        Ok(())
    }

    async fn add_stream_message(&self, _text: &str) -> Result<(), RunnerError> {
        Err(RunnerError::NotStreaming)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            json_stream: true,
            supports_streaming_input: false,
            resumable: false,
        }
    }
}

#[cfg(test)]
#[path = "flat_tests.rs"]
mod tests;
