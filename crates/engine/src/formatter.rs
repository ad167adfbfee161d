// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Activity Formatter: normalized runner events → platform activity
//! payloads with a consistent visual vocabulary (spec.md §4.6).

use ew_core::{RunnerEvent, SessionId};
use serde::{Deserialize, Serialize};

/// `{sessionId, content:{...}, ephemeral?, signal?, signalMetadata?}`
/// (spec.md §6 "Outbound platform activity schema").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundActivity {
    pub session_id: SessionId,
    pub content: OutboundContent,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ephemeral: bool,
}

fn is_false(b: &bool) -> bool {
    !b
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundContent {
    Thought {
        body: String,
    },
    Action {
        name: String,
        parameter: String,
    },
    Response {
        body: String,
    },
    Error {
        body: String,
    },
}

/// File extension → fenced-code-block language hint (spec.md §4.6 "File
/// paths in action details receive language-hint fenced code blocks when
/// the extension is recognized").
fn fence_language(path: &str) -> Option<&'static str> {
    let ext = path.rsplit('.').next()?;
    Some(match ext {
        "ts" | "tsx" => "typescript",
        "py" => "python",
        "go" => "go",
        "rs" => "rust",
        "js" | "jsx" => "javascript",
        "rb" => "ruby",
        "java" => "java",
        "sh" | "bash" => "bash",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "md" => "markdown",
        _ => return None,
    })
}

/// Strips a `N\t` or `N: ` line-number prefix from each line of a
/// read-file tool's output (spec.md §4.6).
fn strip_line_number_prefixes(text: &str) -> String {
    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let digits_end = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(0);
            if digits_end == 0 {
                return line.to_string();
            }
            let (digits, rest) = trimmed.split_at(digits_end);
            if digits.is_empty() {
                return line.to_string();
            }
            let rest = rest.strip_prefix('\t').or_else(|| rest.strip_prefix(": "));
            match rest {
                Some(rest) => rest.to_string(),
                None => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wraps `detail` in a fenced code block when it looks like a single
/// bare file path with a recognized extension.
fn fence_detail_if_path(detail: &str) -> String {
    if detail.contains('\n') || detail.trim().is_empty() {
        return detail.to_string();
    }
    match fence_language(detail.trim()) {
        Some(lang) => format!("```{lang}\n{detail}\n```"),
        None => detail.to_string(),
    }
}

/// Translates one [`RunnerEvent`] into zero or one [`OutboundActivity`]
/// (spec.md §4.6 mapping table). `toolResult` is the only variant that can
/// fold into the preceding action instead of producing a standalone
/// activity; callers that don't track a preceding action get a standalone
/// `response`/`error` either way.
pub fn format_event(
    session_id: &SessionId,
    event: &RunnerEvent,
    ephemeral: bool,
) -> Option<OutboundActivity> {
    let content = match event {
        RunnerEvent::Init { .. } => return None,
        RunnerEvent::Thought { text } => OutboundContent::Thought { body: text.clone() },
        RunnerEvent::Action { name, detail } => OutboundContent::Action {
            name: format!("🛠️ {name}"),
            parameter: fence_detail_if_path(detail),
        },
        RunnerEvent::ToolResult {
            name,
            output,
            is_error: false,
        } => OutboundContent::Response {
            body: format!("{name} result\n{}", strip_line_number_prefixes(output)),
        },
        RunnerEvent::ToolResult {
            output, is_error: true, ..
        } => OutboundContent::Error {
            body: format!("```\n{output}\n```"),
        },
        RunnerEvent::Final { text } => OutboundContent::Response { body: text.clone() },
        RunnerEvent::Error { message, cause } => {
            let body = match cause.as_ref().and_then(|c| c.detail.as_ref()) {
                Some(detail) => format!("{message}\n{detail}"),
                None => message.clone(),
            };
            OutboundContent::Error { body }
        }
        RunnerEvent::Exit { .. } => return None,
    };

    Some(OutboundActivity {
        session_id: session_id.clone(),
        content,
        ephemeral,
    })
}

#[cfg(test)]
#[path = "formatter_tests.rs"]
mod tests;
