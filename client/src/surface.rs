use crossbeam_channel::Sender;
use tracing::debug;

use tutor_common::turn::{DisplayId, Turn};
use tutor_orchestrator::{Panel, RenderSurface};

/// Display updates crossing from the orchestrator thread to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Turn(Turn),
    Translation(DisplayId, String),
    Feedback(String),
    Error(String),
    Notice(String),
    Hint(String),
    ReplyLoading(bool),
    EnrichmentLoading(bool),
    HintLoading(bool),
    InputEnabled(bool),
    Clear,
    TogglePanel(Panel),
    ToggleTheme,
    ShowManual,
}

/// Render surface that forwards every call to the terminal UI as a `UiEvent`.
pub struct ChannelSurface {
    tx: Sender<UiEvent>,
}

impl ChannelSurface {
    pub fn new(tx: Sender<UiEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            debug!("[client] UI gone, dropping display update");
        }
    }
}

impl RenderSurface for ChannelSurface {
    fn render_turn(&self, turn: &Turn) {
        self.send(UiEvent::Turn(turn.clone()));
    }

    fn render_translation(&self, turn_id: &DisplayId, text: &str) {
        self.send(UiEvent::Translation(turn_id.clone(), text.to_string()));
    }

    fn render_feedback(&self, text: &str) {
        self.send(UiEvent::Feedback(text.to_string()));
    }

    fn render_error(&self, message: &str) {
        self.send(UiEvent::Error(message.to_string()));
    }

    fn render_notice(&self, message: &str) {
        self.send(UiEvent::Notice(message.to_string()));
    }

    fn render_hint(&self, hint: &str) {
        self.send(UiEvent::Hint(hint.to_string()));
    }

    fn set_reply_loading(&self, loading: bool) {
        self.send(UiEvent::ReplyLoading(loading));
    }

    fn set_enrichment_loading(&self, loading: bool) {
        self.send(UiEvent::EnrichmentLoading(loading));
    }

    fn set_hint_loading(&self, loading: bool) {
        self.send(UiEvent::HintLoading(loading));
    }

    fn set_input_enabled(&self, enabled: bool) {
        self.send(UiEvent::InputEnabled(enabled));
    }

    fn clear(&self) {
        self.send(UiEvent::Clear);
    }

    fn toggle_panel(&self, panel: Panel) {
        self.send(UiEvent::TogglePanel(panel));
    }

    fn toggle_theme(&self) {
        self.send(UiEvent::ToggleTheme);
    }

    fn show_manual(&self) {
        self.send(UiEvent::ShowManual);
    }
}
