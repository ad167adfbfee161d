// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ew_core::{ApprovalMode, LabelPromptRule, RepositoryId, RunnerFlavor, SandboxLevel};

fn repository() -> RepositoryConfig {
    RepositoryConfig {
        id: RepositoryId::new("repo-1"),
        display_name: "Repo".into(),
        path: "/repo".into(),
        workspace_base_dir: "/workspaces".into(),
        base_branch: "main".into(),
        platform_workspace_id: "ws-1".into(),
        credential_handle: "cred-1".into(),
        active: true,
        allowed_tools: Vec::new(),
        label_prompts: vec![LabelPromptRule {
            label: "bug".into(),
            template: "bug-template".into(),
            runner_flavor: Some(RunnerFlavor::ItemPair),
            permission_policy: None,
        }],
        default_template: "default-template".into(),
        default_runner_flavor: RunnerFlavor::Flat,
        default_permission_policy: PermissionPolicy {
            approval_mode: ApprovalMode::Manual,
            sandbox_level: SandboxLevel::WorkspaceOnly,
            allowed_tool_globs: Vec::new(),
            disallowed_tool_globs: Vec::new(),
        },
        team_keys: vec!["TEST".into()],
    }
}

fn work_item(labels: &[&str]) -> WorkItem {
    WorkItem {
        id: ew_core::WorkItemId::new("wi-1"),
        identifier: "TEST-1".into(),
        title: "Title".into(),
        description: "Description".into(),
        team_key: "TEST".into(),
        state: "open".into(),
        assignee: None,
        labels: labels.iter().map(|s| s.to_string()).collect(),
        priority: None,
    }
}

fn templates() -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert(
        "default-template".into(),
        "Work on {{issue.identifier}}: {{issue.title}}".into(),
    );
    m.insert(
        "bug-template".into(),
        "Fix bug {{issue.identifier}} in {{workspace.path}}".into(),
    );
    m
}

#[test]
fn no_matching_label_uses_repository_default() {
    let repo = repository();
    let item = work_item(&["enhancement"]);
    let inputs = PromptInputs {
        work_item: &item,
        comment_body: None,
        repository: &repo,
        attachments: &[],
        workspace_path: "/work/1",
        explicit_selection: None,
    };
    let (prompt, selection) = build_prompt(&inputs, &templates()).unwrap();
    assert_eq!(prompt, "Work on TEST-1: Title");
    assert_eq!(selection.flavor, RunnerFlavor::Flat);
}

#[test]
fn matching_label_rule_picks_its_template_and_flavor() {
    let repo = repository();
    let item = work_item(&["bug"]);
    let inputs = PromptInputs {
        work_item: &item,
        comment_body: None,
        repository: &repo,
        attachments: &[],
        workspace_path: "/work/1",
        explicit_selection: None,
    };
    let (prompt, selection) = build_prompt(&inputs, &templates()).unwrap();
    assert_eq!(prompt, "Fix bug TEST-1 in /work/1");
    assert_eq!(selection.flavor, RunnerFlavor::ItemPair);
}

#[test]
fn explicit_selection_overrides_runner_flavor_but_not_template() {
    let repo = repository();
    let item = work_item(&["bug"]);
    let explicit = RunnerSelection::new(RunnerFlavor::Flat, "explicit-model");
    let inputs = PromptInputs {
        work_item: &item,
        comment_body: None,
        repository: &repo,
        attachments: &[],
        workspace_path: "/work/1",
        explicit_selection: Some(explicit),
    };
    let (prompt, selection) = build_prompt(&inputs, &templates()).unwrap();
    assert_eq!(prompt, "Fix bug TEST-1 in /work/1");
    assert_eq!(selection.flavor, RunnerFlavor::Flat);
    assert_eq!(selection.model, "explicit-model");
}

#[test]
fn unresolved_placeholder_is_left_literal() {
    let repo = repository();
    let item = work_item(&[]);
    let mut templates = HashMap::new();
    templates.insert("default-template".into(), "{{unknown.thing}}".into());
    let inputs = PromptInputs {
        work_item: &item,
        comment_body: None,
        repository: &repo,
        attachments: &[],
        workspace_path: "/work/1",
        explicit_selection: None,
    };
    let (prompt, _) = build_prompt(&inputs, &templates).unwrap();
    assert_eq!(prompt, "{{unknown.thing}}");
}

#[test]
fn missing_template_is_an_error() {
    let repo = repository();
    let item = work_item(&[]);
    let inputs = PromptInputs {
        work_item: &item,
        comment_body: None,
        repository: &repo,
        attachments: &[],
        workspace_path: "/work/1",
        explicit_selection: None,
    };
    let err = build_prompt(&inputs, &HashMap::new()).unwrap_err();
    assert!(matches!(err, PromptError::MissingTemplate));
}

#[test]
fn attachments_manifest_and_comment_body_are_resolved() {
    let repo = repository();
    let item = work_item(&[]);
    let mut templates = HashMap::new();
    templates.insert(
        "default-template".into(),
        "{{comment.body}} / {{attachments.manifest}}".into(),
    );
    let attachments = vec!["/tmp/a.png".to_string(), "/tmp/b.png".to_string()];
    let inputs = PromptInputs {
        work_item: &item,
        comment_body: Some("please look"),
        repository: &repo,
        attachments: &attachments,
        workspace_path: "/work/1",
        explicit_selection: None,
    };
    let (prompt, _) = build_prompt(&inputs, &templates).unwrap();
    assert_eq!(prompt, "please look / /tmp/a.png\n/tmp/b.png");
}
