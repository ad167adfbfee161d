// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::adapter::{Capabilities, RunnerAdapter, RunnerContext};
use async_trait::async_trait;
use ew_core::{RunnerError, RunnerEvent};
use tokio::sync::mpsc;
use tracing::Instrument;

/// Wrapper that adds tracing to any `RunnerAdapter`
pub struct TracedAdapter<A> {
    inner: A,
}

impl<A> TracedAdapter<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<A: RunnerAdapter> RunnerAdapter for TracedAdapter<A> {
    async fn start(
        &self,
        ctx: RunnerContext,
        on_event: mpsc::Sender<RunnerEvent>,
    ) -> Result<(), RunnerError> {
        let span = tracing::info_span!("runner.start", model = %ctx.model, workspace = %ctx.workspace_path.display());
        async {
            tracing::info!("starting runner subprocess");
            let start = std::time::Instant::now();
            let result = self.inner.start(ctx, on_event).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "runner exited cleanly"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "runner failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn stop(&self) -> Result<(), RunnerError> {
        let result = self.inner.stop().await;
        tracing::info_span!("runner.stop").in_scope(|| match &result {
            Ok(()) => tracing::info!("stopped"),
            Err(e) => tracing::warn!(error = %e, "stop failed (may be expected)"),
        });
        result
    }

    async fn add_stream_message(&self, text: &str) -> Result<(), RunnerError> {
        tracing::info_span!("runner.add_stream_message")
            .in_scope(|| tracing::debug!(text_len = text.len(), "sending"));
        let result = self.inner.add_stream_message(text).await;
        if let Err(ref e) = result {
            tracing::error!(error = %e, "add_stream_message failed");
        }
        result
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
