// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps a [`RunnerFlavor`] to a fresh, traced dialect adapter (spec.md
//! §4.1, §6 "runner defaults per flavor"). A new adapter instance is
//! returned on every call: each adapter owns exactly one subprocess for
//! its lifetime (`ew-adapters/src/flat.rs`), so adapters are never shared
//! across sessions.

use ew_adapters::{FlatDialectAdapter, ItemPairDialectAdapter, RunnerAdapter, TracedAdapter};
use ew_core::RunnerFlavor;
use ew_engine::RunnerRegistry;
use std::collections::HashMap;
use std::sync::Arc;

pub struct ProcessRunnerRegistry {
    binaries: HashMap<RunnerFlavor, String>,
}

impl ProcessRunnerRegistry {
    pub fn new(binaries: HashMap<RunnerFlavor, String>) -> Self {
        Self { binaries }
    }

    fn binary(&self, flavor: RunnerFlavor) -> &str {
        self.binaries
            .get(&flavor)
            .map(String::as_str)
            .unwrap_or_else(|| default_binary(flavor))
    }
}

fn default_binary(flavor: RunnerFlavor) -> &'static str {
    match flavor {
        RunnerFlavor::Flat => "claude",
        RunnerFlavor::ItemPair => "codex",
    }
}

impl RunnerRegistry for ProcessRunnerRegistry {
    fn adapter_for(&self, flavor: RunnerFlavor) -> Arc<dyn RunnerAdapter> {
        let binary = self.binary(flavor);
        match flavor {
            RunnerFlavor::Flat => Arc::new(TracedAdapter::new(FlatDialectAdapter::new(binary))),
            RunnerFlavor::ItemPair => {
                Arc::new(TracedAdapter::new(ItemPairDialectAdapter::new(binary)))
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
