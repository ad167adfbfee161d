// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repository configuration: immutable after load, the routing and
//! prompt-selection source of truth (spec.md §3 "Repository configuration",
//! §4.4 "Prompt Builder").

use crate::runner::{PermissionPolicy, RunnerFlavor};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Config-assigned repository id, also the Session Store routing key.
    pub struct RepositoryId;
}

/// One entry of a repository's `label_prompts` rule list (spec.md §4.4
/// "Selection algorithm" step 2). Rules are scanned in the work item's
/// label declaration order; the first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelPromptRule {
    pub label: String,
    /// Name of the prompt template to use when this label matches.
    pub template: String,
    /// Overrides the repository default runner flavor for this label.
    pub runner_flavor: Option<RunnerFlavor>,
    /// Overrides the repository default permission policy for this label.
    pub permission_policy: Option<PermissionPolicy>,
}

/// Immutable-after-load repository config (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub id: RepositoryId,
    pub display_name: String,
    pub path: String,
    pub workspace_base_dir: String,
    pub base_branch: String,
    pub platform_workspace_id: String,
    pub credential_handle: String,
    pub active: bool,
    pub allowed_tools: Vec<String>,
    pub label_prompts: Vec<LabelPromptRule>,
    pub default_template: String,
    pub default_runner_flavor: RunnerFlavor,
    pub default_permission_policy: PermissionPolicy,
    /// Team keys this repository claims for routing (spec.md §4.5
    /// "Routing").
    pub team_keys: Vec<String>,
}

impl RepositoryConfig {
    /// First `label_prompts` rule matching any of `labels`, scanned in
    /// `labels`' declaration order (spec.md §4.4 step 2).
    pub fn matching_label_rule(&self, labels: &[String]) -> Option<&LabelPromptRule> {
        labels
            .iter()
            .find_map(|label| self.label_prompts.iter().find(|rule| &rule.label == label))
    }
}

/// Validates a repository list against spec.md §9's Open Question 3:
/// reject ambiguous team-key routing at config load time rather than
/// falling back to "first active, with a warning" at runtime.
pub fn validate_team_key_routing(
    repos: &[RepositoryConfig],
) -> Result<(), crate::errors::ConfigError> {
    use std::collections::HashMap;

    let mut claims: HashMap<&str, Vec<&str>> = HashMap::new();
    for repo in repos.iter().filter(|r| r.active) {
        for key in &repo.team_keys {
            claims.entry(key.as_str()).or_default().push(repo.id.as_str());
        }
    }
    for (team_key, repo_ids) in claims {
        if repo_ids.len() > 1 {
            return Err(crate::errors::ConfigError::AmbiguousTeamKey {
                team_key: team_key.to_string(),
                repo_ids: repo_ids.into_iter().map(str::to_string).collect(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
