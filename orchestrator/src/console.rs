use std::sync::Mutex;
use tracing::debug;

use tutor_common::locale;
use tutor_common::turn::{DisplayId, Role, Turn};
use tutor_orchestrator::{Command, Panel, RenderSurface, parse_line};

#[derive(Default)]
struct ConsoleState {
    shown: Vec<DisplayId>,
    translation_hidden: bool,
    feedback_hidden: bool,
}

/// Plain stdout rendering for the line-mode driver.
#[derive(Default)]
pub struct ConsoleSurface {
    state: Mutex<ConsoleState>,
}

impl ConsoleSurface {
    fn with_state<R>(&self, f: impl FnOnce(&mut ConsoleState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }
}

impl RenderSurface for ConsoleSurface {
    fn render_turn(&self, turn: &Turn) {
        self.with_state(|s| s.shown.push(turn.display_id.clone()));
        match turn.role {
            Role::User => println!("[{}] {}", turn.display_id, turn.content),
            Role::Assistant => println!("\n[{}] {}\n", turn.display_id, turn.content),
        }
    }

    fn render_translation(&self, turn_id: &DisplayId, text: &str) {
        let (known, hidden) =
            self.with_state(|s| (s.shown.contains(turn_id), s.translation_hidden));
        if !known {
            debug!("[console] Dropping translation for unknown turn {turn_id}");
            return;
        }
        if !hidden {
            println!("  和訳 {turn_id}: {text}");
        }
    }

    fn render_feedback(&self, text: &str) {
        if !self.with_state(|s| s.feedback_hidden) {
            println!("  フィードバック: {text}");
        }
    }

    fn render_error(&self, message: &str) {
        eprintln!("! {message}");
    }

    fn render_notice(&self, message: &str) {
        println!("* {message}");
    }

    fn render_hint(&self, hint: &str) {
        println!("  ヒント: {hint}");
    }

    fn set_reply_loading(&self, loading: bool) {
        if loading {
            println!("  Loading...");
        }
    }

    fn set_enrichment_loading(&self, loading: bool) {
        debug!("[console] Enrichment loading: {loading}");
    }

    fn set_input_enabled(&self, enabled: bool) {
        debug!("[console] Input enabled: {enabled}");
    }

    fn clear(&self) {
        self.with_state(|s| s.shown.clear());
        println!("\n──────── new conversation ────────\n");
    }

    fn toggle_panel(&self, panel: Panel) {
        let visible = self.with_state(|s| {
            let flag = match panel {
                Panel::Translation => &mut s.translation_hidden,
                Panel::Feedback => &mut s.feedback_hidden,
            };
            *flag = !*flag;
            !*flag
        });
        println!(
            "* {panel:?} panel {}",
            if visible { "shown" } else { "hidden" }
        );
    }

    fn show_manual(&self) {
        println!("{}", locale::MANUAL);
    }
}

/// Turn one stdin line into a command for the orchestrator. Lines handled
/// here (blank lines, usage errors, submissions while a reply is pending)
/// yield `None`.
pub fn admit_line(
    line: &str,
    reply_pending: bool,
    surface: &dyn RenderSurface,
) -> Option<Command> {
    if line.trim().is_empty() {
        return None;
    }
    match parse_line(line) {
        Ok(Command::Submit(_)) if reply_pending => {
            debug!("[console] Dropping submission, reply pending");
            surface.render_notice(locale::REPLY_PENDING);
            None
        }
        Ok(command) => Some(command),
        Err(usage) => {
            surface.render_notice(&usage);
            None
        }
    }
}
