// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingest Transport (spec.md §6): the external collaborator that turns
//! platform webhooks/polling into [`InboundEvent`]s. The real HTTP
//! transport is explicitly out of scope; `StdinIngestSource` is the
//! minimal stdin-driven implementation suitable for local operation and
//! tests (grounded on the donor's `event_bus::EventReader`'s "next event"
//! shape, simplified from a durable WAL reader to a plain line reader
//! since event durability here is the Persistence Manager's job, not the
//! ingest transport's).

use async_trait::async_trait;
use ew_core::InboundEvent;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};

/// Source of normalized inbound events. `ew-daemon` drives its ingest loop
/// by polling this trait; `ew-engine` never depends on it directly.
#[async_trait]
pub trait IngestSource: Send {
    /// Returns the next event, or `None` once the source is permanently
    /// exhausted (e.g. stdin closed).
    async fn next_event(&mut self) -> Option<InboundEvent>;
}

/// Reads newline-delimited JSON [`InboundEvent`]s from stdin. Malformed
/// lines are logged and skipped rather than ending the stream (spec.md §7
/// "Protocol parsing errors").
pub struct StdinIngestSource {
    lines: tokio::io::Lines<BufReader<Stdin>>,
}

impl StdinIngestSource {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinIngestSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IngestSource for StdinIngestSource {
    async fn next_event(&mut self) -> Option<InboundEvent> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    tracing::warn!(error = %e, "ingest stdin read failed");
                    return None;
                }
            };
            if let Some(event) = parse_event_line(&line) {
                return Some(event);
            }
        }
    }
}

/// Parses one ingest line, logging and returning `None` for blank or
/// malformed lines rather than ending the stream (spec.md §7 "Protocol
/// parsing errors").
fn parse_event_line(line: &str) -> Option<InboundEvent> {
    if line.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<InboundEvent>(line) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, line = %line, "skipping malformed ingest line");
            None
        }
    }
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
