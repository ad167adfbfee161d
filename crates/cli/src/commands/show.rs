// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ew show <session>` — full detail for one session, including its
//! ordered activity log. Grounded on `cli/src/commands/session.rs`'s
//! single-entity detail view, with the donor's job/queue framing replaced
//! by session/activity framing.

use anyhow::{bail, Result};
use ew_core::{Activity, ActivityKind, Session};

use crate::color;
use crate::output::{format_time_ago, OutputFormat};
use crate::state_source::{self, Snapshot};

#[derive(clap::Args)]
pub struct ShowArgs {
    /// Session id, or an unambiguous prefix of one
    pub session: String,
}

pub async fn handle(args: ShowArgs, format: OutputFormat) -> Result<()> {
    let snapshot = state_source::load()?;
    let session = find_session(&snapshot, &args.session)?;

    match format {
        OutputFormat::Text => print!("{}", format_text(&snapshot, session)),
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "id": session.id.as_str(),
                "work_item_id": session.work_item_id.as_str(),
                "conversation_id": session.conversation_id.as_str(),
                "repository": snapshot.repository_name(&session.repository_id),
                "workspace_path": session.workspace_path,
                "runner_flavor": format!("{:?}", session.runner_selection.flavor),
                "runner_model": session.runner_selection.model,
                "status": format!("{:?}", session.status),
                "started_at_ms": session.started_at_ms,
                "ended_at_ms": session.ended_at_ms,
                "finalized": session.finalized,
                "activities": session.activities.iter().map(activity_json).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&obj)?);
        }
    }

    Ok(())
}

/// Finds a session by exact id or by unambiguous id prefix.
fn find_session<'a>(snapshot: &'a Snapshot, needle: &str) -> Result<&'a Session> {
    if let Some(session) = snapshot.state.sessions.get(&ew_core::SessionId::new(needle)) {
        return Ok(session);
    }

    let mut matches: Vec<&Session> = snapshot
        .state
        .sessions
        .values()
        .filter(|s| s.id.as_str().starts_with(needle))
        .collect();

    match matches.len() {
        0 => bail!("no session found matching '{needle}'"),
        1 => Ok(matches.remove(0)),
        n => bail!("'{needle}' matches {n} sessions; provide a longer prefix"),
    }
}

fn activity_json(activity: &Activity) -> serde_json::Value {
    serde_json::json!({
        "ordinal": activity.ordinal,
        "timestamp_ms": activity.timestamp_ms,
        "ephemeral": activity.ephemeral,
        "kind": &activity.kind,
    })
}

fn format_text(snapshot: &Snapshot, session: &Session) -> String {
    use std::fmt::Write as _;
    let mut out = String::new();

    let _ = writeln!(out, "{} {}", color::header("session"), session.id.as_str());
    let _ = writeln!(out, "  repository   {}", snapshot.repository_name(&session.repository_id));
    let _ = writeln!(out, "  work item    {}", session.work_item_id.as_str());
    let _ = writeln!(out, "  conversation {}", session.conversation_id.as_str());
    let _ = writeln!(out, "  workspace    {}", session.workspace_path);
    let _ = writeln!(
        out,
        "  runner       {:?} ({})",
        session.runner_selection.flavor, session.runner_selection.model
    );
    let _ = writeln!(out, "  status       {}", color::status(&format!("{:?}", session.status)));
    let _ = writeln!(out, "  started      {}", format_time_ago(session.started_at_ms));
    if let Some(ended_at_ms) = session.ended_at_ms {
        let _ = writeln!(out, "  ended        {}", format_time_ago(ended_at_ms));
    }
    if session.finalized {
        let _ = writeln!(out, "  finalized    true");
    }

    if session.activities.is_empty() {
        return out;
    }

    let _ = writeln!(out, "\n{}", color::header("activities"));
    for activity in &session.activities {
        let _ = writeln!(out, "  [{}] {}", activity.ordinal, format_activity_kind(&activity.kind));
    }

    out
}

fn format_activity_kind(kind: &ActivityKind) -> String {
    match kind {
        ActivityKind::Thought { text } => format!("thought: {text}"),
        ActivityKind::Action { name, parameter, result } => match result {
            Some(result) => format!("action: {name}({parameter}) -> {result}"),
            None => format!("action: {name}({parameter})"),
        },
        ActivityKind::Response { body } => format!("response: {body}"),
        ActivityKind::Error { message, cause } => match cause {
            Some(cause) if cause.recoverable => format!("error (recoverable): {message}"),
            Some(_) => format!("error (fatal): {message}"),
            None => format!("error: {message}"),
        },
        ActivityKind::Elicitation { prompt } => format!("elicitation: {prompt}"),
    }
}

#[cfg(test)]
#[path = "show_tests.rs"]
mod tests;
