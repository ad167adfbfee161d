// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ew sessions` — list sessions from the daemon's persisted state,
//! optionally filtered by status or repository. Grounded on
//! `cli/src/table.rs`'s column-aligned list rendering.

use anyhow::Result;
use ew_core::{Session, SessionStatus};

use crate::output::{format_time_ago, OutputFormat};
use crate::state_source::{self, Snapshot};
use crate::table::{Column, Table};

#[derive(clap::Args)]
pub struct SessionsArgs {
    /// Filter by session status
    #[arg(long, value_enum)]
    pub status: Option<StatusFilter>,

    /// Filter by repository id
    #[arg(long)]
    pub repository: Option<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum StatusFilter {
    Pending,
    Active,
    AwaitingInput,
    Complete,
    Error,
}

impl StatusFilter {
    fn matches(self, status: SessionStatus) -> bool {
        matches!(
            (self, status),
            (StatusFilter::Pending, SessionStatus::Pending)
                | (StatusFilter::Active, SessionStatus::Active)
                | (StatusFilter::AwaitingInput, SessionStatus::AwaitingInput)
                | (StatusFilter::Complete, SessionStatus::Complete)
                | (StatusFilter::Error, SessionStatus::Error)
        )
    }
}

pub async fn handle(args: SessionsArgs, format: OutputFormat) -> Result<()> {
    let snapshot = state_source::load()?;
    let sessions = filter(&snapshot, &args);

    match format {
        OutputFormat::Text => print_table(&snapshot, &sessions),
        OutputFormat::Json => {
            let rows: Vec<_> = sessions
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "id": s.id.as_str(),
                        "status": format!("{:?}", s.status),
                        "repository": snapshot.repository_name(&s.repository_id),
                        "started_at_ms": s.started_at_ms,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}

fn filter<'a>(snapshot: &'a Snapshot, args: &SessionsArgs) -> Vec<&'a Session> {
    let mut sessions: Vec<&Session> = snapshot
        .state
        .sessions
        .values()
        .filter(|s| args.status.is_none_or(|f| f.matches(s.status)))
        .filter(|s| {
            args.repository
                .as_deref()
                .is_none_or(|r| s.repository_id.as_str() == r)
        })
        .collect();
    sessions.sort_by(|a, b| b.started_at_ms.cmp(&a.started_at_ms));
    sessions
}

fn print_table(snapshot: &Snapshot, sessions: &[&Session]) {
    let mut table = Table::new(vec![
        Column::muted("ID"),
        Column::left("REPOSITORY"),
        Column::status("STATUS"),
        Column::left("STARTED"),
    ]);

    for session in sessions {
        table.row(vec![
            session.id.short(8).to_string(),
            snapshot.repository_name(&session.repository_id),
            format!("{:?}", session.status),
            format_time_ago(session.started_at_ms),
        ]);
    }

    table.render(&mut std::io::stdout());
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
