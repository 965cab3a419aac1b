//! In-process doubles shared by the orchestrator tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use tutor_common::protocol::{
    ChatRequest, ConfigResponse, FeedbackRequest, HintRequest, SwitchProviderResponse,
};
use tutor_common::session::ProviderId;
use tutor_common::turn::{DisplayId, Turn};

use crate::backend::{BackendError, TutorBackend};
use crate::render::{Panel, RenderSurface};
use crate::turn_loop::SubmitGate;

/// Ordered log shared by backend and surface so tests can assert on the
/// interleaving of network calls and render calls.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn note(journal: &Journal, entry: String) {
    journal.lock().unwrap().push(entry);
}

pub fn position(journal: &Journal, prefix: &str) -> Option<usize> {
    journal
        .lock()
        .unwrap()
        .iter()
        .position(|e| e.starts_with(prefix))
}

/// Yield to spawned tasks until `done` holds or the budget runs out.
pub async fn settle(done: impl Fn() -> bool) {
    for _ in 0..100 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
}

// --- Backend double ---

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Reply {
        message: String,
        history: Vec<(String, String)>,
    },
    Translate(String),
    Feedback {
        text: String,
        teacher_text: Option<String>,
    },
    Hint(String),
    SwitchProvider(String),
    Config,
}

fn failure() -> BackendError {
    BackendError::Status {
        path: "/test",
        status: 500,
    }
}

/// Backend double: records every call, fails on demand, and can hold
/// translation/feedback requests until released.
pub struct ProbeBackend {
    journal: Journal,
    calls: Mutex<Vec<Call>>,
    replies: Mutex<VecDeque<Result<Option<String>, ()>>>,
    pub fail_translate: AtomicBool,
    pub fail_feedback: AtomicBool,
    pub fail_hint: AtomicBool,
    pub fail_switch: AtomicBool,
    pub empty_feedback: AtomicBool,
    /// Translations never complete.
    pub stall_translate: AtomicBool,
    pub config_level: Mutex<Option<String>>,
    held: AtomicBool,
    release: Semaphore,
    reply_held: AtomicBool,
    reply_release: Semaphore,
    gate: Mutex<Option<SubmitGate>>,
    gate_open_during_reply: Mutex<Vec<bool>>,
}

impl ProbeBackend {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            fail_translate: AtomicBool::new(false),
            fail_feedback: AtomicBool::new(false),
            fail_hint: AtomicBool::new(false),
            fail_switch: AtomicBool::new(false),
            empty_feedback: AtomicBool::new(false),
            stall_translate: AtomicBool::new(false),
            config_level: Mutex::new(None),
            held: AtomicBool::new(false),
            release: Semaphore::new(0),
            reply_held: AtomicBool::new(false),
            reply_release: Semaphore::new(0),
            gate: Mutex::new(None),
            gate_open_during_reply: Mutex::new(Vec::new()),
        }
    }

    /// Queue the next reply. `Err(())` simulates a failed request. When the
    /// queue is empty the reply is "Hi there!".
    pub fn push_reply(&self, reply: Result<Option<&str>, ()>) {
        self.replies
            .lock()
            .unwrap()
            .push_back(reply.map(|r| r.map(str::to_string)));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    /// Block translation and feedback requests until `release_all`.
    pub fn hold_enrichment(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release_all(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.release.add_permits(1024);
    }

    /// Let held requests through one at a time, in the order they started
    /// waiting.
    pub fn release(&self, count: usize) {
        self.release.add_permits(count);
    }

    /// Block reply requests until `release_reply`.
    pub fn hold_reply(&self) {
        self.reply_held.store(true, Ordering::SeqCst);
    }

    pub fn release_reply(&self) {
        self.reply_held.store(false, Ordering::SeqCst);
        self.reply_release.add_permits(1024);
    }

    pub fn watch_gate(&self, gate: SubmitGate) {
        *self.gate.lock().unwrap() = Some(gate);
    }

    pub fn gate_open_during_reply(&self) -> Vec<bool> {
        self.gate_open_during_reply.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        note(&self.journal, format!("call {call:?}"));
        self.calls.lock().unwrap().push(call);
    }

    async fn wait_if_held(&self) {
        if self.held.load(Ordering::SeqCst)
            && let Ok(permit) = self.release.acquire().await
        {
            permit.forget();
        }
    }
}

#[async_trait]
impl TutorBackend for ProbeBackend {
    async fn reply(&self, request: &ChatRequest) -> Result<Option<String>, BackendError> {
        self.record(Call::Reply {
            message: request.message.clone(),
            history: request
                .history
                .iter()
                .map(|e| (e.role.to_string(), e.content.clone()))
                .collect(),
        });
        if let Some(gate) = self.gate.lock().unwrap().as_ref() {
            self.gate_open_during_reply
                .lock()
                .unwrap()
                .push(gate.is_open());
        }
        if self.reply_held.load(Ordering::SeqCst)
            && let Ok(permit) = self.reply_release.acquire().await
        {
            permit.forget();
        }
        tokio::task::yield_now().await;
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(())) => Err(failure()),
            None => Ok(Some("Hi there!".to_string())),
        }
    }

    async fn translate(&self, text: &str) -> Result<Option<String>, BackendError> {
        self.record(Call::Translate(text.to_string()));
        if self.stall_translate.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.wait_if_held().await;
        if self.fail_translate.load(Ordering::SeqCst) {
            return Err(failure());
        }
        Ok(Some(format!("訳: {text}")))
    }

    async fn feedback(&self, request: &FeedbackRequest) -> Result<Option<String>, BackendError> {
        self.record(Call::Feedback {
            text: request.text.clone(),
            teacher_text: request.teacher_text.clone(),
        });
        self.wait_if_held().await;
        if self.fail_feedback.load(Ordering::SeqCst) {
            return Err(failure());
        }
        if self.empty_feedback.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(format!("FB: {}", request.text)))
    }

    async fn hint(&self, request: &HintRequest) -> Result<Option<String>, BackendError> {
        self.record(Call::Hint(request.japanese_text.clone()));
        if self.fail_hint.load(Ordering::SeqCst) {
            return Err(failure());
        }
        Ok(Some(format!("Try: {}", request.japanese_text)))
    }

    async fn switch_provider(
        &self,
        provider: &ProviderId,
    ) -> Result<SwitchProviderResponse, BackendError> {
        self.record(Call::SwitchProvider(provider.to_string()));
        if self.fail_switch.load(Ordering::SeqCst) {
            return Err(failure());
        }
        let known = provider.as_str() == ProviderId::ANTHROPIC
            || provider.as_str() == ProviderId::AZURE_OPENAI;
        Ok(SwitchProviderResponse {
            success: known,
            message: (!known).then(|| "Invalid provider".to_string()),
        })
    }

    async fn fetch_config(&self) -> Result<ConfigResponse, BackendError> {
        self.record(Call::Config);
        let level = self.config_level.lock().unwrap().clone();
        match level {
            Some(level) => Ok(ConfigResponse {
                default_level: Some(level),
            }),
            None => Err(failure()),
        }
    }
}

// --- Surface double ---

#[derive(Debug, Default)]
struct SurfaceState {
    turns: Vec<Turn>,
    translations: Vec<(String, String)>,
    feedback: Option<String>,
    errors: Vec<String>,
    notices: Vec<String>,
    hints: Vec<String>,
    enrichment_loading: bool,
    reply_loading: bool,
    input_disabled: bool,
    hidden_panels: Vec<Panel>,
    theme_toggles: usize,
    manual_shown: bool,
}

/// Surface double keeping what a real UI would display.
pub struct RecordingSurface {
    journal: Journal,
    state: Mutex<SurfaceState>,
}

impl RecordingSurface {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            state: Mutex::new(SurfaceState::default()),
        }
    }

    pub fn turn_ids(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.turns.iter().map(|t| t.display_id.to_string()).collect()
    }

    pub fn translations(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().translations.clone()
    }

    pub fn feedback(&self) -> Option<String> {
        self.state.lock().unwrap().feedback.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.state.lock().unwrap().errors.clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.state.lock().unwrap().notices.clone()
    }

    pub fn hints(&self) -> Vec<String> {
        self.state.lock().unwrap().hints.clone()
    }

    pub fn enrichment_loading(&self) -> bool {
        self.state.lock().unwrap().enrichment_loading
    }

    pub fn reply_loading(&self) -> bool {
        self.state.lock().unwrap().reply_loading
    }

    pub fn input_enabled(&self) -> bool {
        !self.state.lock().unwrap().input_disabled
    }

    pub fn hidden_panels(&self) -> Vec<Panel> {
        self.state.lock().unwrap().hidden_panels.clone()
    }

    pub fn theme_toggles(&self) -> usize {
        self.state.lock().unwrap().theme_toggles
    }

    pub fn manual_shown(&self) -> bool {
        self.state.lock().unwrap().manual_shown
    }
}

impl RenderSurface for RecordingSurface {
    fn render_turn(&self, turn: &Turn) {
        note(&self.journal, format!("render_turn {}", turn.display_id));
        self.state.lock().unwrap().turns.push(turn.clone());
    }

    fn render_translation(&self, turn_id: &DisplayId, text: &str) {
        note(&self.journal, format!("render_translation {turn_id}"));
        self.state
            .lock()
            .unwrap()
            .translations
            .push((turn_id.to_string(), text.to_string()));
    }

    fn render_feedback(&self, text: &str) {
        note(&self.journal, "render_feedback".to_string());
        self.state.lock().unwrap().feedback = Some(text.to_string());
    }

    fn render_error(&self, message: &str) {
        note(&self.journal, "render_error".to_string());
        self.state.lock().unwrap().errors.push(message.to_string());
    }

    fn render_notice(&self, message: &str) {
        self.state.lock().unwrap().notices.push(message.to_string());
    }

    fn render_hint(&self, hint: &str) {
        self.state.lock().unwrap().hints.push(hint.to_string());
    }

    fn set_reply_loading(&self, loading: bool) {
        self.state.lock().unwrap().reply_loading = loading;
    }

    fn set_enrichment_loading(&self, loading: bool) {
        note(&self.journal, format!("enrichment_loading {loading}"));
        self.state.lock().unwrap().enrichment_loading = loading;
    }

    fn set_input_enabled(&self, enabled: bool) {
        note(&self.journal, format!("input_enabled {enabled}"));
        self.state.lock().unwrap().input_disabled = !enabled;
    }

    fn clear(&self) {
        note(&self.journal, "clear".to_string());
        let mut state = self.state.lock().unwrap();
        state.turns.clear();
        state.translations.clear();
        state.feedback = None;
        state.errors.clear();
        state.notices.clear();
    }

    fn toggle_panel(&self, panel: Panel) {
        let mut state = self.state.lock().unwrap();
        if let Some(i) = state.hidden_panels.iter().position(|p| *p == panel) {
            state.hidden_panels.remove(i);
        } else {
            state.hidden_panels.push(panel);
        }
    }

    fn toggle_theme(&self) {
        self.state.lock().unwrap().theme_toggles += 1;
    }

    fn show_manual(&self) {
        self.state.lock().unwrap().manual_shown = true;
    }
}
