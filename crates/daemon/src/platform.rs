// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform client stub (spec.md §6): the real platform API client is
//! explicitly out of scope, so `LoggingPlatformClient` mirrors every
//! outbound activity to the structured log instead of an HTTP call,
//! suitable for local operation and tests.

use async_trait::async_trait;
use ew_engine::{EngineError, OutboundActivity, OutboundContent};

pub struct LoggingPlatformClient;

#[async_trait]
impl ew_engine::PlatformClient for LoggingPlatformClient {
    async fn post_activity(&self, activity: OutboundActivity) -> Result<(), EngineError> {
        let kind = match &activity.content {
            OutboundContent::Thought { .. } => "thought",
            OutboundContent::Action { .. } => "action",
            OutboundContent::Response { .. } => "response",
            OutboundContent::Error { .. } => "error",
        };
        tracing::info!(
            session_id = %activity.session_id,
            ephemeral = activity.ephemeral,
            kind,
            "posting activity to platform"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
