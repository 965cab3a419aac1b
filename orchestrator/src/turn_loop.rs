use futures_util::future::join3;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tutor_common::locale;
use tutor_common::protocol::{ChatRequest, FeedbackRequest, HintRequest};
use tutor_common::session::{Level, ProviderId, SessionConfig};
use tutor_common::turn::{DisplayId, Role, Turn, TurnCounters};

use crate::backend::{BackendError, TutorBackend};
use crate::history::Conversation;
use crate::render::RenderSurface;

/// Orchestrator state (for logging).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurnState {
    Idle,
    AwaitingReply,
    DispatchingEnrichment,
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::AwaitingReply => write!(f, "AwaitingReply"),
            Self::DispatchingEnrichment => write!(f, "DispatchingEnrichment"),
        }
    }
}

/// Result of a single `submit` call.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// The user turn was kept but no reply arrived; enrichment was skipped.
    ReplyFailed,
    Replied {
        user_id: DisplayId,
        teacher_id: DisplayId,
        enrichment: Enrichment,
    },
}

/// Handle to background enrichment work. Dropping it does not cancel the work.
#[derive(Debug)]
pub struct Enrichment(JoinHandle<()>);

impl Enrichment {
    /// Wait until every request of this batch has completed and been delivered.
    pub async fn finished(self) {
        if let Err(e) = self.0.await {
            warn!("[orchestrator] Enrichment task ended abnormally: {e}");
        }
    }
}

/// Read-only view of the in-flight flag. Front ends drop learner submissions
/// while it is closed; the orchestrator itself runs one `submit` at a time.
#[derive(Debug, Clone)]
pub struct SubmitGate(Arc<AtomicBool>);

impl SubmitGate {
    pub fn is_open(&self) -> bool {
        !self.0.load(Ordering::SeqCst)
    }
}

/// Bumped by every reset. Enrichment results are delivered only while the
/// epoch they were started in is still current.
#[derive(Debug, Default)]
struct Generation {
    epoch: AtomicU64,
    pending: AtomicUsize,
}

struct EpochTag {
    generation: Arc<Generation>,
    epoch: u64,
}

impl EpochTag {
    fn is_current(&self) -> bool {
        self.generation.epoch.load(Ordering::SeqCst) == self.epoch
    }
}

/// Holds the in-flight flag for the duration of phase 1.
struct InFlight {
    flag: Arc<AtomicBool>,
    surface: Arc<dyn RenderSurface>,
}

impl InFlight {
    fn enter(flag: &Arc<AtomicBool>, surface: &Arc<dyn RenderSurface>) -> Self {
        flag.store(true, Ordering::SeqCst);
        surface.set_input_enabled(false);
        Self {
            flag: Arc::clone(flag),
            surface: Arc::clone(surface),
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        self.surface.set_input_enabled(true);
    }
}

/// Owns the conversation and drives each learner turn through the reply
/// request and the enrichment fan-out.
///
/// Background work is spawned onto the ambient Tokio runtime, so every method
/// that starts enrichment must run inside one.
pub struct TurnOrchestrator {
    backend: Arc<dyn TutorBackend>,
    surface: Arc<dyn RenderSurface>,
    conversation: Conversation,
    session: SessionConfig,
    in_flight: Arc<AtomicBool>,
    generation: Arc<Generation>,
    state: TurnState,
}

impl TurnOrchestrator {
    pub fn new(backend: Arc<dyn TutorBackend>, surface: Arc<dyn RenderSurface>) -> Self {
        Self {
            backend,
            surface,
            conversation: Conversation::new(),
            session: SessionConfig::default(),
            in_flight: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(Generation::default()),
            state: TurnState::Idle,
        }
    }

    pub fn history(&self) -> &[Turn] {
        self.conversation.turns()
    }

    pub fn counters(&self) -> TurnCounters {
        self.conversation.counters()
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub(crate) fn surface(&self) -> &dyn RenderSurface {
        &*self.surface
    }

    pub fn gate(&self) -> SubmitGate {
        SubmitGate(Arc::clone(&self.in_flight))
    }

    fn transition(&mut self, next: TurnState) {
        info!("[orchestrator] State: {} → {next}", self.state);
        self.state = next;
    }

    fn tag(&self) -> EpochTag {
        EpochTag {
            generation: Arc::clone(&self.generation),
            epoch: self.generation.epoch.load(Ordering::SeqCst),
        }
    }

    /// Read the server's default level. Failures keep the current level.
    pub async fn load_config(&mut self) {
        match self.backend.fetch_config().await {
            Ok(config) => match config.default_level.as_deref().map(str::parse::<Level>) {
                Some(Ok(level)) => {
                    info!("[orchestrator] Default level from server: {level}");
                    self.session.level = level;
                }
                Some(Err(e)) => warn!("[orchestrator] Ignoring configured level: {e}"),
                None => debug!("[orchestrator] Server config has no default level"),
            },
            Err(e) => warn!(
                "[orchestrator] Config fetch failed, keeping level {}: {e}",
                self.session.level
            ),
        }
    }

    /// Run one learner turn.
    ///
    /// Returns once the reply has been rendered (or has failed). Enrichment
    /// continues in the background; the returned handle may be awaited or
    /// dropped.
    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        let message = text.trim();
        if message.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let _in_flight = InFlight::enter(&self.in_flight, &self.surface);

        // Feedback is judged against the teacher turn the learner was answering.
        let teacher_context = self
            .conversation
            .last_assistant()
            .map(|t| t.content.clone());

        let user = self
            .conversation
            .push(Role::User, message.to_string())
            .clone();
        self.surface.render_turn(&user);
        info!("[orchestrator] {}: '{message}'", user.display_id);

        // Phase 1: the reply, blocking further input.
        self.transition(TurnState::AwaitingReply);
        let request = ChatRequest {
            message: message.to_string(),
            level: self.session.level,
            history: self.conversation.entries(),
        };
        self.surface.set_reply_loading(true);
        let query_start = std::time::Instant::now();
        let result = self.backend.reply(&request).await;
        self.surface.set_reply_loading(false);
        info!(
            "[orchestrator] Reply request: {:.2}s",
            query_start.elapsed().as_secs_f64()
        );

        let reply = match result {
            Ok(Some(reply)) => reply,
            Ok(None) => {
                warn!("[orchestrator] Reply response carried no text");
                self.surface.render_error(locale::REPLY_FAILED);
                self.transition(TurnState::Idle);
                return SubmitOutcome::ReplyFailed;
            }
            Err(e) => {
                warn!("[orchestrator] Reply request failed: {e}");
                self.surface.render_error(locale::REPLY_FAILED);
                self.transition(TurnState::Idle);
                return SubmitOutcome::ReplyFailed;
            }
        };

        let teacher = self.conversation.push(Role::Assistant, reply).clone();
        self.surface.render_turn(&teacher);
        info!("[orchestrator] {}: '{}'", teacher.display_id, teacher.content);

        // Phase 2: translations and feedback, not awaited here.
        self.transition(TurnState::DispatchingEnrichment);
        let enrichment = self.spawn_enrichment(&user, &teacher, teacher_context);
        self.transition(TurnState::Idle);

        SubmitOutcome::Replied {
            user_id: user.display_id,
            teacher_id: teacher.display_id,
            enrichment,
        }
    }

    /// Fire both translations and the feedback request together. Each result
    /// is delivered as soon as it arrives; one error notice covers the batch.
    fn spawn_enrichment(
        &self,
        user: &Turn,
        teacher: &Turn,
        teacher_text: Option<String>,
    ) -> Enrichment {
        let backend = Arc::clone(&self.backend);
        let surface = Arc::clone(&self.surface);
        let tag = self.tag();
        let user = user.clone();
        let teacher = teacher.clone();
        let feedback_request = FeedbackRequest {
            text: user.content.clone(),
            level: self.session.level,
            teacher_text,
        };

        self.generation.pending.fetch_add(1, Ordering::SeqCst);
        surface.set_enrichment_loading(true);

        Enrichment(tokio::spawn(async move {
            let (user_result, teacher_result, feedback_result) = join3(
                deliver_translation(&*backend, &*surface, &tag, &user),
                deliver_translation(&*backend, &*surface, &tag, &teacher),
                deliver_feedback(&*backend, &*surface, &tag, &feedback_request),
            )
            .await;

            if !tag.is_current() {
                debug!("[orchestrator] Enrichment for a reset conversation finished");
                return;
            }

            let mut failed = false;
            for (what, result) in [
                ("user translation", user_result),
                ("teacher translation", teacher_result),
                ("feedback", feedback_result),
            ] {
                if let Err(e) = result {
                    warn!("[orchestrator] {what} failed: {e}");
                    failed = true;
                }
            }
            if failed {
                surface.render_error(locale::ENRICHMENT_FAILED);
            }

            if tag.generation.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
                surface.set_enrichment_loading(false);
            }
        }))
    }

    /// Start over with only the greeting. Work still in flight from before the
    /// reset is not cancelled, but its results are discarded.
    pub fn reset(&mut self) -> Enrichment {
        self.generation.epoch.fetch_add(1, Ordering::SeqCst);
        self.generation.pending.store(0, Ordering::SeqCst);

        self.conversation.clear();
        self.surface.clear();
        self.surface.set_reply_loading(false);
        self.surface.set_enrichment_loading(false);

        let greeting = self
            .conversation
            .push(Role::Assistant, locale::GREETING.to_string())
            .clone();
        self.surface.render_turn(&greeting);
        info!("[orchestrator] Conversation reset");

        let backend = Arc::clone(&self.backend);
        let surface = Arc::clone(&self.surface);
        let tag = self.tag();
        Enrichment(tokio::spawn(async move {
            if let Err(e) = deliver_translation(&*backend, &*surface, &tag, &greeting).await {
                warn!("[orchestrator] Greeting translation failed: {e}");
            }
        }))
    }

    /// English phrasing hint. Never fails: errors become a fallback hint.
    pub async fn request_hint(&self, japanese_text: &str, level: Level) -> Option<String> {
        self.hints().request(japanese_text, level).await
    }

    /// Detached handle for hint requests, usable while a turn is in flight.
    pub fn hints(&self) -> HintRequester {
        HintRequester {
            backend: Arc::clone(&self.backend),
            surface: Arc::clone(&self.surface),
        }
    }

    /// Ask the server to change reply backend. The active provider only changes
    /// when the server confirms.
    pub async fn switch_provider(&mut self, provider: ProviderId) -> bool {
        match self.backend.switch_provider(&provider).await {
            Ok(resp) if resp.success => {
                info!("[orchestrator] Provider switched to {provider}");
                self.surface
                    .render_notice(&locale::provider_switched(provider.display_name()));
                self.session.provider = provider;
                true
            }
            Ok(resp) => {
                let reason = resp
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| locale::UNKNOWN_ERROR.to_string());
                warn!("[orchestrator] Provider {provider} rejected: {reason}");
                self.surface.render_error(&locale::provider_rejected(&reason));
                false
            }
            Err(e) => {
                warn!("[orchestrator] Provider switch failed: {e}");
                self.surface.render_error(locale::PROVIDER_SWITCH_FAILED);
                false
            }
        }
    }

    pub fn set_level(&mut self, level: Level) {
        self.session.level = level;
        info!("[orchestrator] Level set to {level}");
        self.surface
            .render_notice(&locale::level_changed(level.as_str()));
    }
}

/// Hint requests are independent of the conversation, so they can be served
/// from a clone while the orchestrator is busy with a turn.
#[derive(Clone)]
pub struct HintRequester {
    backend: Arc<dyn TutorBackend>,
    surface: Arc<dyn RenderSurface>,
}

impl HintRequester {
    pub async fn request(&self, japanese_text: &str, level: Level) -> Option<String> {
        let japanese_text = japanese_text.trim();
        if japanese_text.is_empty() {
            return None;
        }

        self.surface.set_hint_loading(true);
        let result = self
            .backend
            .hint(&HintRequest {
                japanese_text: japanese_text.to_string(),
                level,
            })
            .await;
        self.surface.set_hint_loading(false);

        let hint = match result {
            Ok(Some(hint)) => hint,
            Ok(None) => {
                debug!("[orchestrator] Hint response carried no text");
                return None;
            }
            Err(e) => {
                warn!("[orchestrator] Hint request failed: {e}");
                locale::HINT_FAILED.to_string()
            }
        };
        self.surface.render_hint(&hint);
        Some(hint)
    }
}

async fn deliver_translation(
    backend: &dyn TutorBackend,
    surface: &dyn RenderSurface,
    tag: &EpochTag,
    turn: &Turn,
) -> Result<(), BackendError> {
    match backend.translate(&turn.content).await? {
        Some(text) if tag.is_current() => surface.render_translation(&turn.display_id, &text),
        Some(_) => debug!(
            "[orchestrator] Dropping stale translation for {}",
            turn.display_id
        ),
        None => debug!("[orchestrator] Empty translation for {}", turn.display_id),
    }
    Ok(())
}

async fn deliver_feedback(
    backend: &dyn TutorBackend,
    surface: &dyn RenderSurface,
    tag: &EpochTag,
    request: &FeedbackRequest,
) -> Result<(), BackendError> {
    match backend.feedback(request).await? {
        Some(text) if tag.is_current() => surface.render_feedback(&text),
        Some(_) => debug!("[orchestrator] Dropping stale feedback"),
        None => debug!("[orchestrator] Empty feedback"),
    }
    Ok(())
}
