// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ew status` — cross-session overview of the daemon's persisted state.
//! Grounded on `cli/src/commands/status.rs`'s dashboard shape, replacing
//! the job/queue/worker namespacing with session counts grouped by
//! repository.

use anyhow::Result;
use ew_core::SessionStatus;
use std::collections::HashMap;
use std::fmt::Write as _;

use crate::color;
use crate::output::{format_time_ago, OutputFormat};
use crate::state_source::{self, Snapshot};

#[derive(clap::Args)]
pub struct StatusArgs {}

pub async fn handle(_args: StatusArgs, format: OutputFormat) -> Result<()> {
    let snapshot = state_source::load()?;

    match format {
        OutputFormat::Text => print!("{}", format_text(&snapshot)),
        OutputFormat::Json => {
            let by_status = count_by_status(&snapshot);
            let obj = serde_json::json!({
                "is_working": snapshot.active_work.is_working,
                "last_updated_ms": snapshot.active_work.last_updated_ms,
                "total_sessions": snapshot.state.sessions.len(),
                "by_status": by_status,
            });
            println!("{}", serde_json::to_string_pretty(&obj)?);
        }
    }

    Ok(())
}

fn count_by_status(snapshot: &Snapshot) -> HashMap<&'static str, usize> {
    let mut counts = HashMap::new();
    for session in snapshot.state.sessions.values() {
        *counts.entry(status_label(session.status)).or_insert(0) += 1;
    }
    counts
}

fn status_label(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Pending => "pending",
        SessionStatus::Active => "active",
        SessionStatus::AwaitingInput => "awaiting_input",
        SessionStatus::Complete => "complete",
        SessionStatus::Error => "error",
    }
}

fn format_text(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    let total = snapshot.state.sessions.len();
    let _ = write!(
        out,
        "{} {} session{}",
        color::header("ew daemon:"),
        total,
        if total == 1 { "" } else { "s" }
    );
    if snapshot.active_work.is_working {
        let _ = write!(out, " | {}", color::status("active"));
    } else {
        let _ = write!(out, " | {}", color::status("idle"));
    }
    let _ = write!(
        out,
        " | last update {}",
        format_time_ago(snapshot.active_work.last_updated_ms)
    );
    out.push('\n');

    if total == 0 {
        return out;
    }

    let mut by_repo: HashMap<String, Vec<&ew_core::Session>> = HashMap::new();
    for session in snapshot.state.sessions.values() {
        by_repo
            .entry(snapshot.repository_name(&session.repository_id))
            .or_default()
            .push(session);
    }

    let mut repos: Vec<&String> = by_repo.keys().collect();
    repos.sort();

    for repo in repos {
        let sessions = &by_repo[repo];
        let _ = write!(out, "\n── {} ", color::header(repo));
        let pad = 48usize.saturating_sub(repo.len() + 4);
        for _ in 0..pad {
            out.push('─');
        }
        out.push('\n');

        let mut sessions: Vec<&&ew_core::Session> = sessions.iter().collect();
        sessions.sort_by(|a, b| b.started_at_ms.cmp(&a.started_at_ms));

        for session in sessions {
            let _ = write!(
                out,
                "    {}  {}  {}\n",
                color::muted(session.id.short(8)),
                color::status(status_label(session.status)),
                format_time_ago(session.started_at_ms),
            );
        }
    }

    out
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
