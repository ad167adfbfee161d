// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt Builder: assembles the initial session prompt, runner
//! selection, and permission policy from work-item/repository inputs
//! (spec.md §4.4).

use ew_core::{PermissionPolicy, PromptError, RepositoryConfig, RunnerSelection, WorkItem};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// `{{namespace.name}}` placeholder pattern (spec.md §4.4 "Prompt template
/// resolution"), grounded on the donor's `runbook::template::VAR_PATTERN`
/// but double-braced per the placeholder syntax the spec actually uses.
#[allow(clippy::expect_used)]
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_-]*)*)\}\}")
        .expect("constant regex pattern is valid")
});

/// Inputs the Prompt Builder needs to produce a prompt + runner selection
/// (spec.md §4.4 "Inputs").
pub struct PromptInputs<'a> {
    pub work_item: &'a WorkItem,
    /// Originating conversation's comment body, if any.
    pub comment_body: Option<&'a str>,
    pub repository: &'a RepositoryConfig,
    /// Resolved local paths for referenced files.
    pub attachments: &'a [String],
    pub workspace_path: &'a str,
    /// An explicit selection already set on the session by a prior event
    /// (spec.md §4.4 "Selection algorithm" step 1).
    pub explicit_selection: Option<RunnerSelection>,
}

/// Resolves `{{placeholders}}` in `template` against the fixed vocabulary
/// spec.md §4.4 names. Unresolved placeholders are left literal and
/// logged, never substituted with an empty string.
fn render_template(template: &str, placeholders: &HashMap<&str, String>) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(template, |caps: &regex::Captures| {
            let name = &caps[1];
            match placeholders.get(name) {
                Some(value) => value.clone(),
                None => {
                    tracing::warn!(placeholder = name, "unresolved prompt placeholder");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Picks the prompt template and runner selection per spec.md §4.4
/// "Selection algorithm". The template always comes from the first
/// matching label rule (in the work item's label declaration order) or
/// the repository default; an explicit runner selection on the session
/// overrides only the runner flavor/model/policy step 1 describes, not
/// which template renders.
fn select_template_and_runner<'a>(
    inputs: &'a PromptInputs<'a>,
) -> (&'a str, RunnerSelection, PermissionPolicy) {
    let matching_rule = inputs.repository.matching_label_rule(&inputs.work_item.labels);
    let template_name = matching_rule
        .map(|rule| rule.template.as_str())
        .unwrap_or(inputs.repository.default_template.as_str());

    if let Some(explicit) = inputs.explicit_selection.clone() {
        let policy = explicit.permission_policy.clone();
        return (template_name, explicit, policy);
    }

    if let Some(rule) = matching_rule {
        let flavor = rule
            .runner_flavor
            .unwrap_or(inputs.repository.default_runner_flavor);
        let policy = rule
            .permission_policy
            .clone()
            .unwrap_or_else(|| inputs.repository.default_permission_policy.clone());
        let mut selection = RunnerSelection::new(flavor, default_model_for(inputs.repository));
        selection.permission_policy = policy.clone();
        return (template_name, selection, policy);
    }

    let mut selection = RunnerSelection::new(
        inputs.repository.default_runner_flavor,
        default_model_for(inputs.repository),
    );
    selection.permission_policy = inputs.repository.default_permission_policy.clone();
    (
        template_name,
        selection,
        inputs.repository.default_permission_policy.clone(),
    )
}

/// The repository config carries no separate "default model" field (spec.md
/// §3 lists runner flavor + policy, not a model string); the model is
/// currently a fixed per-flavor default until a config surface for it is
/// added.
fn default_model_for(_repository: &RepositoryConfig) -> &'static str {
    "default"
}

/// Builds the initial prompt, runner selection, and permission policy for
/// a new session (spec.md §4.4).
pub fn build_prompt(
    inputs: &PromptInputs<'_>,
    templates: &HashMap<String, String>,
) -> Result<(String, RunnerSelection), PromptError> {
    let (template_name, runner_selection, _policy) = select_template_and_runner(inputs);

    let template = templates
        .get(template_name)
        .ok_or(PromptError::MissingTemplate)?;

    let mut placeholders = HashMap::new();
    placeholders.insert("issue.identifier", inputs.work_item.identifier.clone());
    placeholders.insert("issue.title", inputs.work_item.title.clone());
    placeholders.insert("issue.description", inputs.work_item.description.clone());
    placeholders.insert(
        "comment.body",
        inputs.comment_body.unwrap_or_default().to_string(),
    );
    placeholders.insert("attachments.manifest", inputs.attachments.join("\n"));
    placeholders.insert("workspace.path", inputs.workspace_path.to_string());

    let prompt = render_template(template, &placeholders);
    Ok((prompt, runner_selection))
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
