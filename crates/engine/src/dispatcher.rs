// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Dispatcher: the heart of the system (spec.md §4.5). Consumes
//! normalized inbound events, resolves repository routing and session
//! identity, and drives session lifecycle under the per-session mutex.

use crate::error::EngineError;
use crate::formatter::{format_event, OutboundActivity, OutboundContent};
use crate::mutex_table::SessionMutexTable;
use crate::prompt::{build_prompt, PromptInputs};
use crate::session_store::SessionStore;
use async_trait::async_trait;
use ew_adapters::{RunnerAdapter, RunnerContext};
use ew_core::{
    ActivityKind, Clock, ConversationId, IdGen, InboundConversation, InboundEvent,
    InboundWorkItem, RepositoryConfig, RunnerEvent, RunnerFlavor, RunnerSelection, Session,
    SessionId, SessionStatus, Signal, WorkItem,
};
use ew_storage::PersistenceManager;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Creates/destroys the on-disk workspace a session's runner executes in
/// (spec.md §1 "Out of scope": these are interfaces only).
#[async_trait]
pub trait WorkspaceProvisioner: Send + Sync + 'static {
    async fn provision(
        &self,
        repository: &RepositoryConfig,
        session_id: &SessionId,
    ) -> Result<String, EngineError>;

    async fn release(&self, _workspace_path: &str) {}
}

/// Outbound platform API client: comment/activity creation (spec.md §1
/// "Out of scope", §6 "Outbound platform activity schema").
#[async_trait]
pub trait PlatformClient: Send + Sync + 'static {
    async fn post_activity(&self, activity: OutboundActivity) -> Result<(), EngineError>;
}

/// Maps a runner flavor to the adapter that speaks its dialect (spec.md
/// §9 "a registry maps flavor enum → adapter factory").
pub trait RunnerRegistry: Send + Sync + 'static {
    fn adapter_for(&self, flavor: RunnerFlavor) -> Arc<dyn RunnerAdapter>;
}

/// The live runner attached to a session, plus whatever the dispatcher
/// needs to route follow-up prompts to it (spec.md §4.5 "AgentSessionPrompted
/// without stop signal").
struct RunnerHandle {
    adapter: Arc<dyn RunnerAdapter>,
    supports_streaming_input: bool,
}

/// Everything the dispatcher needs to route and drive sessions. Grounded
/// on spec.md §9 "replace global state with a single `Worker` value passed
/// explicitly".
pub struct Dispatcher<W, P, Reg, Id, C: Clock> {
    sessions: Arc<SessionStore<C>>,
    mutex_table: Arc<SessionMutexTable>,
    repositories: Vec<RepositoryConfig>,
    templates: HashMap<String, String>,
    workspace: Arc<W>,
    platform: Arc<P>,
    registry: Arc<Reg>,
    clock: Arc<C>,
    id_gen: Id,
    persistence: Arc<PersistenceManager>,
    runners: tokio::sync::Mutex<HashMap<SessionId, RunnerHandle>>,
}

impl<W, P, Reg, Id, C> Dispatcher<W, P, Reg, Id, C>
where
    W: WorkspaceProvisioner,
    P: PlatformClient,
    Reg: RunnerRegistry,
    Id: IdGen,
    C: Clock,
{
    pub fn new(
        sessions: Arc<SessionStore<C>>,
        repositories: Vec<RepositoryConfig>,
        templates: HashMap<String, String>,
        workspace: Arc<W>,
        platform: Arc<P>,
        registry: Arc<Reg>,
        clock: Arc<C>,
        id_gen: Id,
        persistence: Arc<PersistenceManager>,
    ) -> Self {
        Self {
            sessions,
            mutex_table: Arc::new(SessionMutexTable::new()),
            repositories,
            templates,
            workspace,
            platform,
            registry,
            clock,
            id_gen,
            persistence,
            runners: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Marks both persisted files dirty. Session mutations may touch either
    /// `edge-worker-state.json` (every session) or `active-work.json`
    /// (non-finalized sessions), so every mutation marks both rather than
    /// tracking which file it actually affected (spec.md §4.3).
    fn mark_dirty(&self) {
        self.persistence.mark_state_dirty();
        self.persistence.mark_active_work_dirty();
    }

    /// Resolves the repository owning `team_key` (spec.md §4.5
    /// "Routing"). No match → `None`, logged at info by the caller.
    /// Multiple active matches → the first, with a warning; configs are
    /// validated at load time to make this unreachable in practice
    /// (spec.md §9 Open Question 3, `ew_core::validate_team_key_routing`).
    fn route_repository(&self, team_key: &str) -> Option<&RepositoryConfig> {
        let mut matches = self
            .repositories
            .iter()
            .filter(|r| r.active && r.team_keys.iter().any(|k| k == team_key));
        let first = matches.next()?;
        if matches.next().is_some() {
            tracing::warn!(team_key, "team key matches more than one active repository");
        }
        Some(first)
    }

    /// Appends a synthesized (non-runner-event) activity to the session
    /// and mirrors it to the platform in the same call (spec.md §5
    /// "Ordering guarantees").
    async fn append_and_post(&self, session_id: &SessionId, kind: ActivityKind, ephemeral: bool) {
        let outbound = synthetic_outbound(session_id, &kind, ephemeral);
        if let Err(e) = self.sessions.append_activity(session_id, kind, ephemeral) {
            tracing::warn!(session = %session_id, error = %e, "failed to append activity");
            return;
        }
        self.mark_dirty();
        if let Err(e) = self.platform.post_activity(outbound).await {
            tracing::warn!(session = %session_id, error = %e, "failed to post activity to platform");
        }
    }

    /// Appends a normalized runner event to the session log and mirrors it
    /// to the platform, both derived from the same event (spec.md §4.6).
    /// `Init`/`Exit` produce neither.
    async fn record_runner_event(&self, session_id: &SessionId, event: &RunnerEvent) {
        if let Some(kind) = runner_event_to_activity_kind(event) {
            match self.sessions.append_activity(session_id, kind, false) {
                Ok(_) => self.mark_dirty(),
                Err(e) => tracing::warn!(session = %session_id, error = %e, "failed to append activity"),
            }
        }
        if let Some(outbound) = format_event(session_id, event, false) {
            if let Err(e) = self.platform.post_activity(outbound).await {
                tracing::warn!(session = %session_id, error = %e, "failed to post activity to platform");
            }
        }
    }

    /// Entry point: dispatch one normalized inbound event (spec.md §4.5
    /// "Handlers").
    pub async fn dispatch(self: &Arc<Self>, event: InboundEvent) {
        tracing::info!(summary = %event.log_summary(), "dispatching inbound event");
        let team_key = event.team_key().to_string();
        let Some(repository) = self.route_repository(&team_key).cloned() else {
            tracing::info!(team_key, "no repository claims this team key; ignoring event");
            return;
        };

        match event {
            InboundEvent::AgentSessionCreated {
                work_item,
                conversation,
                session_id,
                ..
            } => {
                self.clone()
                    .handle_session_created(repository, work_item, conversation, session_id)
                    .await;
            }
            InboundEvent::IssueAssigned { work_item, .. } => {
                let session_id = SessionId::new(self.id_gen.next());
                self.clone()
                    .handle_session_created(repository, work_item, None, session_id)
                    .await;
            }
            InboundEvent::NewComment {
                work_item,
                conversation,
                ..
            }
            | InboundEvent::CommentMention {
                work_item,
                conversation,
                ..
            } => {
                let session_id = SessionId::new(self.id_gen.next());
                self.clone()
                    .handle_session_created(repository, work_item, Some(conversation), session_id)
                    .await;
            }
            InboundEvent::AgentSessionPrompted {
                session_id,
                conversation,
                signal,
                ..
            } => {
                self.handle_prompted(session_id, conversation, signal).await;
            }
        }
    }

    /// AgentSessionCreated (and the session-creation triggers that resolve
    /// to the same flow) (spec.md §4.5, steps 1-2 synchronous, 3-6 in the
    /// background).
    async fn handle_session_created(
        self: Arc<Self>,
        repository: RepositoryConfig,
        work_item: InboundWorkItem,
        conversation: Option<InboundConversation>,
        session_id: SessionId,
    ) {
        let guard = self.mutex_table.lock(&session_id).await;
        let now = self.clock.now_ms();

        let conversation_id = conversation
            .as_ref()
            .map(|c| c.id.clone())
            .unwrap_or_else(|| ConversationId::new(self.id_gen.next()));

        let session = Session::new(
            session_id.clone(),
            work_item.id.clone(),
            conversation_id,
            repository.id.clone(),
            String::new(),
            RunnerSelection::new(repository.default_runner_flavor, "pending"),
            now,
        );

        if let Err(e) = self.sessions.create_session(session) {
            tracing::error!(session = %session_id, error = %e, "failed to create session");
            return;
        }
        self.mark_dirty();

        // Immediate acknowledgement, visible within one round-trip
        // (spec.md §4.5 "AgentSessionCreated" step 2).
        self.append_and_post(
            &session_id,
            ActivityKind::Response {
                body: "I've received your request".into(),
            },
            true,
        )
        .await;

        drop(guard);

        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher
                .run_session(repository, work_item, conversation, session_id)
                .await;
        });
    }

    /// Background task: workspace provisioning → prompt/runner selection
    /// → spawn runner (spec.md §4.5 "AgentSessionCreated" steps 3-6).
    async fn run_session(
        self: Arc<Self>,
        repository: RepositoryConfig,
        work_item: InboundWorkItem,
        conversation: Option<InboundConversation>,
        session_id: SessionId,
    ) {
        let _guard = self.mutex_table.lock(&session_id).await;

        let workspace_path = match self.workspace.provision(&repository, &session_id).await {
            Ok(path) => path,
            Err(e) => {
                self.fail_session(&session_id, &e.to_string()).await;
                return;
            }
        };

        let full_work_item = WorkItem {
            id: work_item.id.clone(),
            identifier: work_item.identifier.clone(),
            title: work_item.title.clone(),
            description: work_item.description.clone(),
            team_key: work_item.team_key.clone(),
            state: String::new(),
            assignee: None,
            labels: work_item.labels.clone(),
            priority: None,
        };
        let inputs = PromptInputs {
            work_item: &full_work_item,
            comment_body: conversation.as_ref().map(|c| c.body.as_str()),
            repository: &repository,
            attachments: &[],
            workspace_path: &workspace_path,
            explicit_selection: None,
        };

        let (prompt, runner_selection) = match build_prompt(&inputs, &self.templates) {
            Ok(built) => built,
            Err(e) => {
                self.fail_session(&session_id, &e.to_string()).await;
                return;
            }
        };

        self.spawn_runner(&session_id, &workspace_path, prompt, runner_selection)
            .await;
    }

    /// Spawns (or respawns) a session's runner and drives its event stream
    /// until the subprocess exits.
    async fn spawn_runner(
        self: &Arc<Self>,
        session_id: &SessionId,
        workspace_path: &str,
        prompt: String,
        runner_selection: RunnerSelection,
    ) {
        let adapter = self.registry.adapter_for(runner_selection.flavor);
        let capabilities = adapter.capabilities();
        {
            let mut runners = self.runners.lock().await;
            runners.insert(
                session_id.clone(),
                RunnerHandle {
                    adapter: adapter.clone(),
                    supports_streaming_input: capabilities.supports_streaming_input,
                },
            );
        }

        let ctx = RunnerContext {
            prompt,
            workspace_path: workspace_path.into(),
            model: runner_selection.model.clone(),
            permission_policy: runner_selection.permission_policy.clone(),
        };

        let (tx, mut rx) = mpsc::channel::<RunnerEvent>(64);
        let adapter_for_task = adapter.clone();
        let start_handle = tokio::spawn(async move { adapter_for_task.start(ctx, tx).await });

        let mut saw_active = false;
        let mut saw_final = false;
        while let Some(event) = rx.recv().await {
            if matches!(event, RunnerEvent::Init { .. }) {
                continue;
            }

            if !saw_active {
                match self.sessions.set_status(session_id, SessionStatus::Active) {
                    Ok(()) => self.mark_dirty(),
                    Err(e) => tracing::warn!(session = %session_id, error = %e, "status transition failed"),
                }
                saw_active = true;
            }

            if let RunnerEvent::Exit { code } = event {
                self.finish_session(session_id, code, saw_final).await;
                break;
            }

            let is_final = matches!(event, RunnerEvent::Final { .. });
            saw_final = saw_final || is_final;

            self.record_runner_event(session_id, &event).await;

            // spec.md §4.5 step 5: `final{}` alone completes the session,
            // independent of whether the adapter goes on to emit `exit{}`.
            if is_final {
                self.finish_session(session_id, 0, true).await;
                break;
            }
        }

        match start_handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(session = %session_id, error = %e, "runner exited with error");
                if !saw_final {
                    self.fail_session(session_id, &e.to_string()).await;
                }
            }
            Err(e) => {
                tracing::error!(session = %session_id, error = %e, "runner task panicked");
            }
        }
    }

    /// `exit{code=0}` or a session that already produced `final{}` (spec.md
    /// §4.5 step 5); any other code without a `final` is an error (step 6).
    async fn finish_session(&self, session_id: &SessionId, code: i32, saw_final: bool) {
        if code == 0 || saw_final {
            let _ = self.sessions.set_status(session_id, SessionStatus::Complete);
            self.mark_dirty();
        } else {
            self.fail_session(session_id, &format!("runner exited with code {code}"))
                .await;
        }
        self.runners.lock().await.remove(session_id);
    }

    /// Unrecoverable adapter failure or prompt-builder error (spec.md §4.4
    /// "Failure semantics", §4.5 step 6).
    async fn fail_session(&self, session_id: &SessionId, message: &str) {
        let _ = self.sessions.set_status(session_id, SessionStatus::Error);
        self.mark_dirty();
        self.append_and_post(
            session_id,
            ActivityKind::Error {
                message: message.to_string(),
                cause: None,
            },
            false,
        )
        .await;
        self.runners.lock().await.remove(session_id);
    }

    /// AgentSessionPrompted, with or without a stop signal (spec.md §4.5).
    async fn handle_prompted(
        self: &Arc<Self>,
        session_id: SessionId,
        conversation: Option<InboundConversation>,
        signal: Option<Signal>,
    ) {
        let _guard = self.mutex_table.lock(&session_id).await;

        let Some(session) = self.sessions.get_session(&session_id) else {
            tracing::info!(session = %session_id, "prompted event for unknown session; ignoring");
            return;
        };

        if signal == Some(Signal::Stop) {
            self.handle_stop(&session_id).await;
            return;
        }

        let Some(body) = conversation.as_ref().map(|c| c.body.clone()) else {
            return;
        };

        let live_runner = {
            let runners = self.runners.lock().await;
            runners
                .get(&session_id)
                .map(|h| (h.adapter.clone(), h.supports_streaming_input))
        };

        match live_runner {
            Some((adapter, true)) => {
                if let Err(e) = adapter.add_stream_message(&body).await {
                    tracing::warn!(session = %session_id, error = %e, "failed to inject stream message");
                }
                self.append_and_post(
                    &session_id,
                    ActivityKind::Response {
                        body: "I've queued up your message as guidance.".into(),
                    },
                    true,
                )
                .await;
            }
            Some((adapter, false)) => {
                let _ = adapter.stop().await;
                let new_prompt = format!("Continuing based on new input:\n\n{body}");
                self.spawn_runner(
                    &session_id,
                    &session.workspace_path,
                    new_prompt,
                    session.runner_selection.clone(),
                )
                .await;
            }
            None => {
                tracing::warn!(session = %session_id, "prompted session has no attached runner");
            }
        }
    }

    /// AgentSessionPrompted with `signal=stop` (spec.md §4.5). Idempotent:
    /// a session already finalized is a no-op (spec.md §8 "two stop
    /// signals... the second is a no-op").
    async fn handle_stop(&self, session_id: &SessionId) {
        let already_finalized = self
            .sessions
            .get_session(session_id)
            .map(|s| s.finalized)
            .unwrap_or(true);
        if already_finalized {
            return;
        }

        let adapter = {
            let mut runners = self.runners.lock().await;
            runners.remove(session_id).map(|h| h.adapter)
        };
        if let Some(adapter) = adapter {
            let _ = adapter.stop().await;
        }

        let _ = self.sessions.set_status(session_id, SessionStatus::Complete);
        let _ = self.sessions.mark_finalized(session_id);
        self.mark_dirty();
        self.append_and_post(
            session_id,
            ActivityKind::Response {
                body: "I've stopped working.".into(),
            },
            false,
        )
        .await;
    }
}

/// Builds the platform-facing mirror of a synthesized (non-runner-event)
/// activity, mirroring the vocabulary `format_event` uses for runner events
/// (spec.md §4.6).
fn synthetic_outbound(
    session_id: &SessionId,
    kind: &ActivityKind,
    ephemeral: bool,
) -> OutboundActivity {
    let content = match kind {
        ActivityKind::Response { body } => OutboundContent::Response { body: body.clone() },
        ActivityKind::Error { message, cause } => {
            let body = match cause.as_ref().and_then(|c| c.detail.as_ref()) {
                Some(detail) => format!("{message}\n{detail}"),
                None => message.clone(),
            };
            OutboundContent::Error { body }
        }
        ActivityKind::Thought { text } => OutboundContent::Thought { body: text.clone() },
        ActivityKind::Action { name, parameter, .. } => OutboundContent::Action {
            name: format!("🛠️ {name}"),
            parameter: parameter.clone(),
        },
        ActivityKind::Elicitation { prompt } => OutboundContent::Thought { body: prompt.clone() },
    };
    OutboundActivity {
        session_id: session_id.clone(),
        content,
        ephemeral,
    }
}

/// Maps a normalized runner event to the activity kind persisted in the
/// session's log (spec.md §4.6). `Init`/`Exit` persist nothing.
fn runner_event_to_activity_kind(event: &RunnerEvent) -> Option<ActivityKind> {
    Some(match event {
        RunnerEvent::Init { .. } | RunnerEvent::Exit { .. } => return None,
        RunnerEvent::Thought { text } => ActivityKind::Thought { text: text.clone() },
        RunnerEvent::Action { name, detail } => ActivityKind::Action {
            name: name.clone(),
            parameter: detail.clone(),
            result: None,
        },
        RunnerEvent::ToolResult {
            output,
            is_error: true,
            ..
        } => ActivityKind::Error {
            message: output.clone(),
            cause: Some(ew_core::ErrorCause {
                recoverable: true,
                detail: None,
            }),
        },
        RunnerEvent::ToolResult { name, output, .. } => ActivityKind::Response {
            body: format!("{name} result\n{output}"),
        },
        RunnerEvent::Final { text } => ActivityKind::Response { body: text.clone() },
        RunnerEvent::Error { message, cause } => ActivityKind::Error {
            message: message.clone(),
            cause: cause.clone(),
        },
    })
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
