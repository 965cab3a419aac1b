use anyhow::{Result, bail};
use tracing::debug;
use tutor_common::turn::{DisplayId, Turn};

/// Side panels the learner can show or hide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Translation,
    Feedback,
}

impl std::str::FromStr for Panel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "translation" => Ok(Self::Translation),
            "feedback" => Ok(Self::Feedback),
            other => bail!("Unknown panel '{other}' (expected translation or feedback)"),
        }
    }
}

/// Display sink for everything the orchestrator produces.
///
/// Implementations own their presentation state; calls pass data by reference
/// for the duration of the call only. Methods take `&self` because enrichment
/// tasks deliver results while the orchestrator keeps running.
pub trait RenderSurface: Send + Sync {
    /// Append a turn to the conversation view.
    fn render_turn(&self, turn: &Turn);

    /// Show the translation annotating `turn_id`. Surfaces should drop updates
    /// for ids they no longer display.
    fn render_translation(&self, turn_id: &DisplayId, text: &str);

    /// Replace the feedback panel content.
    fn render_feedback(&self, text: &str);

    /// Recoverable error notice.
    fn render_error(&self, message: &str);

    /// Informational system notice (level or provider changes).
    fn render_notice(&self, message: &str);

    fn render_hint(&self, hint: &str);

    fn set_reply_loading(&self, loading: bool);

    fn set_enrichment_loading(&self, loading: bool);

    fn set_hint_loading(&self, _loading: bool) {}

    /// Disabled while a reply is pending so the learner cannot submit twice.
    fn set_input_enabled(&self, enabled: bool);

    /// Drop all turns, annotations and notices.
    fn clear(&self);

    fn toggle_panel(&self, panel: Panel) {
        debug!("[render] Panel toggle ignored: {panel:?}");
    }

    fn toggle_theme(&self) {
        debug!("[render] Theme toggle ignored");
    }

    fn show_manual(&self);
}
