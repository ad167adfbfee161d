// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Item-pair dialect adapter: `{type:"item.started"}` /
//! `{type:"item.completed"}` pairs with nested
//! `item.type ∈ {command_execution, file_change, mcp_tool_call, reasoning,
//! agent_message, todo_list, web_search, error}` (spec.md §4.1).

use crate::adapter::{Capabilities, RunnerAdapter, RunnerContext};
use crate::subprocess::{spawn_streaming, stop_with_grace, SPAWN_TIMEOUT, STOP_GRACE};
use async_trait::async_trait;
use ew_core::{ErrorCause, RunnerError, RunnerEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::io::AsyncBufReadExt;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ItemPairLine {
    Init {
        session_id: String,
        #[serde(default)]
        model: Option<String>,
    },
    #[serde(rename = "item.started")]
    ItemStarted { item: Item },
    #[serde(rename = "item.completed")]
    ItemCompleted { item: Item },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct Item {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    exit_code: Option<i32>,
    #[serde(default)]
    todos: Option<Vec<Todo>>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct Todo {
    text: String,
    status: String,
}

/// Renders a todo's status to the emoji checklist vocabulary (spec.md
/// §4.1 "Tool parameters must be rendered...").
fn todo_emoji(status: &str) -> &'static str {
    match status {
        "completed" => "✅",
        "in_progress" => "🔄",
        _ => "⏳",
    }
}

/// Compact human-readable rendering of a tool item's parameters (spec.md
/// §4.1 "Tool parameters must be rendered to a compact display form").
fn render_detail(item: &Item) -> String {
    match item.kind.as_str() {
        "command_execution" => item.command.clone().unwrap_or_default(),
        "file_change" => item.path.clone().unwrap_or_default(),
        "web_search" => {
            let pattern = item.pattern.as_deref().unwrap_or("");
            let path = item.path.as_deref().unwrap_or("");
            if path.is_empty() {
                pattern.to_string()
            } else {
                format!("{pattern} {path}")
            }
        }
        "todo_list" => item
            .todos
            .iter()
            .flatten()
            .map(|t| format!("{} {}", todo_emoji(&t.status), t.text))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => serde_json::to_string(item).unwrap_or_default(),
    }
}

/// Translates one completed item into zero or one normalized event.
/// `item.started` without a matching `item.completed` produces nothing
/// (spec.md §8 "Boundary behaviors").
fn translate_completed(item: Item) -> Option<RunnerEvent> {
    match item.kind.as_str() {
        "reasoning" => Some(RunnerEvent::Thought {
            text: item.text.unwrap_or_default(),
        }),
        "agent_message" => Some(RunnerEvent::Final {
            text: item.text.unwrap_or_default(),
        }),
        "error" => Some(RunnerEvent::Error {
            message: item.message.unwrap_or_default(),
            cause: None,
        }),
        "command_execution" if item.exit_code.is_some_and(|c| c != 0) => {
            let code = item.exit_code.unwrap_or(1);
            Some(RunnerEvent::Error {
                message: format!("command exited {code}"),
                cause: Some(ErrorCause {
                    recoverable: true,
                    detail: Some(item.command.clone().unwrap_or_default()),
                }),
            })
        }
        "command_execution" | "file_change" | "mcp_tool_call" | "web_search" | "todo_list" => {
            let detail = render_detail(&item);
            Some(RunnerEvent::Action {
                name: item.kind,
                detail,
            })
        }
        _ => None,
    }
}

/// Adapter for agent CLIs emitting the item.started/item.completed dialect
/// over a direct child process. Dedupes pairs by item id: `item.started`
/// is recorded to detect unfinished items at exit but never itself emits a
/// normalized event (spec.md §4.1 "emit only on completed").
pub struct ItemPairDialectAdapter {
    binary: String,
    child: Mutex<Option<Child>>,
}

impl ItemPairDialectAdapter {
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
impl RunnerAdapter for ItemPairDialectAdapter {
    async fn start(
        &self,
        ctx: RunnerContext,
        on_event: mpsc::Sender<RunnerEvent>,
    ) -> Result<(), RunnerError> {
        let cmd = self.build_command(&ctx);
        let (child, mut lines) =
            spawn_streaming(cmd).map_err(|e| RunnerError::SpawnFailed(e.to_string()))?;
        *self.child.lock().await = Some(child);

        let mut started: HashMap<String, ()> = HashMap::new();
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
                    let parsed: Result<ItemPairLine, _> = serde_json::from_str(&line);
                    let Ok(parsed) = parsed else {
                        tracing::warn!(%line, "skipping malformed runner line");
                        continue;
                    };
                    let event = match parsed {
                        ItemPairLine::Init { session_id, model } => {
                            saw_init = true;
                            Some(RunnerEvent::Init { session_id, model: model.unwrap_or_default() })
                        }
                        ItemPairLine::ItemStarted { item } => {
                            started.insert(item.id, ());
                            None
                        }
                        ItemPairLine::ItemCompleted { item } => {
                            started.remove(&item.id);
                            translate_completed(item)
                        }
                    };
                    if let Some(event) = event {
                        if on_event.send(event).await.is_err() {
                            break;
                        }
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
#[path = "item_pair_tests.rs"]
mod tests;
