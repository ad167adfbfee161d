// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake runner adapter for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::adapter::{Capabilities, RunnerAdapter, RunnerContext};
use async_trait::async_trait;
use ew_core::{RunnerError, RunnerEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Recorded call to [`FakeRunnerAdapter`]
#[derive(Debug, Clone)]
pub enum AdapterCall {
    Start { prompt: String },
    Stop,
    AddStreamMessage { text: String },
}

/// Fake `RunnerAdapter` for testing dispatcher/engine code without a real
/// subprocess. Scripted with a fixed sequence of events to emit from
/// `start`, and records every call for assertions.
#[derive(Clone)]
pub struct FakeRunnerAdapter {
    inner: Arc<Mutex<FakeState>>,
}

struct FakeState {
    calls: Vec<AdapterCall>,
    script: Vec<RunnerEvent>,
    start_error: Option<RunnerError>,
    stop_error: Option<RunnerError>,
    capabilities: Capabilities,
}

impl Default for FakeRunnerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRunnerAdapter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                script: Vec::new(),
                start_error: None,
                stop_error: None,
                capabilities: Capabilities {
                    json_stream: true,
                    supports_streaming_input: true,
                    resumable: false,
                },
            })),
        }
    }

    /// Events `start` emits, in order, before returning `Ok(())`.
    pub fn set_script(&self, events: Vec<RunnerEvent>) {
        self.inner.lock().script = events;
    }

    pub fn set_start_error(&self, error: RunnerError) {
        self.inner.lock().start_error = Some(error);
    }

    pub fn set_stop_error(&self, error: RunnerError) {
        self.inner.lock().stop_error = Some(error);
    }

    pub fn set_capabilities(&self, capabilities: Capabilities) {
        self.inner.lock().capabilities = capabilities;
    }

    pub fn calls(&self) -> Vec<AdapterCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }
}

#[async_trait]
impl RunnerAdapter for FakeRunnerAdapter {
    async fn start(
        &self,
        ctx: RunnerContext,
        on_event: mpsc::Sender<RunnerEvent>,
    ) -> Result<(), RunnerError> {
        let (script, error) = {
            let mut inner = self.inner.lock();
            inner.calls.push(AdapterCall::Start {
                prompt: ctx.prompt.clone(),
            });
            (inner.script.clone(), inner.start_error.take())
        };
        if let Some(error) = error {
            return Err(error);
        }
        for event in script {
            if on_event.send(event).await.is_err() {
                break;
            }
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), RunnerError> {
        let error = {
            let mut inner = self.inner.lock();
            inner.calls.push(AdapterCall::Stop);
            inner.stop_error.take()
        };
        match error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn add_stream_message(&self, text: &str) -> Result<(), RunnerError> {
        self.inner.lock().calls.push(AdapterCall::AddStreamMessage {
            text: text.to_string(),
        });
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.lock().capabilities
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
