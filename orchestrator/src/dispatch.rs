use std::collections::VecDeque;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use tutor_common::session::{Level, ProviderId};

use crate::render::Panel;
use crate::turn_loop::{Enrichment, HintRequester, SubmitOutcome, TurnOrchestrator};

/// UI intents understood by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Submit(String),
    Reset,
    TogglePanel(Panel),
    RequestHint(String),
    SwitchProvider(ProviderId),
    SetLevel(Level),
    ToggleTheme,
    ShowManual,
}

/// Parse one line of learner input. Plain text is a submission; a leading
/// `/` selects a command. `Err` carries a usage message for the learner.
pub fn parse_line(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Submit(line.to_string()));
    };

    let (word, arg) = match rest.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (rest, ""),
    };

    match (word, arg) {
        ("reset", "") => Ok(Command::Reset),
        ("theme", "") => Ok(Command::ToggleTheme),
        ("help", "") => Ok(Command::ShowManual),
        ("hint", text) if !text.is_empty() => Ok(Command::RequestHint(text.to_string())),
        ("hint", _) => Err("Usage: /hint <日本語>".to_string()),
        ("provider", id) if !id.is_empty() && !id.contains(char::is_whitespace) => {
            Ok(Command::SwitchProvider(ProviderId::new(id)))
        }
        ("provider", _) => Err("Usage: /provider <anthropic|azure_openai>".to_string()),
        ("level", level) => level
            .parse::<Level>()
            .map(Command::SetLevel)
            .map_err(|e| e.to_string()),
        ("toggle", panel) => panel
            .parse::<Panel>()
            .map(Command::TogglePanel)
            .map_err(|e| e.to_string()),
        _ => Err(format!("Unknown command '/{word}'. Type /help for the manual.")),
    }
}

impl TurnOrchestrator {
    /// Route a command to its operation. Returns the background work the
    /// command started, if any.
    pub async fn dispatch(&mut self, command: Command) -> Option<Enrichment> {
        debug!("[orchestrator] Dispatch {command:?}");
        match command {
            Command::Submit(text) => match self.submit(&text).await {
                SubmitOutcome::Replied { enrichment, .. } => Some(enrichment),
                _ => None,
            },
            Command::Reset => Some(self.reset()),
            Command::TogglePanel(panel) => {
                self.surface().toggle_panel(panel);
                None
            }
            Command::RequestHint(text) => {
                let level = self.session().level;
                self.request_hint(&text, level).await;
                None
            }
            Command::SwitchProvider(provider) => {
                self.switch_provider(provider).await;
                None
            }
            Command::SetLevel(level) => {
                self.set_level(level);
                None
            }
            Command::ToggleTheme => {
                self.surface().toggle_theme();
                None
            }
            Command::ShowManual => {
                self.surface().show_manual();
                None
            }
        }
    }

    /// Run commands from a front end until its sender is dropped.
    ///
    /// Commands are handled one at a time in arrival order, except hints,
    /// which are answered on their own task even while a reply is pending.
    pub async fn serve(&mut self, mut commands: UnboundedReceiver<Command>) {
        let hints = self.hints();
        let mut queued = VecDeque::new();
        let mut closed = false;

        loop {
            let command = match queued.pop_front() {
                Some(command) => command,
                None if closed => break,
                None => match commands.recv().await {
                    Some(command) => command,
                    None => break,
                },
            };

            let level = self.session().level;
            if let Command::RequestHint(text) = command {
                spawn_hint(&hints, text, level);
                continue;
            }

            let running = self.dispatch(command);
            tokio::pin!(running);
            loop {
                tokio::select! {
                    _ = &mut running => break,
                    next = commands.recv(), if !closed => match next {
                        Some(Command::RequestHint(text)) => spawn_hint(&hints, text, level),
                        Some(other) => queued.push_back(other),
                        None => closed = true,
                    },
                }
            }
        }
        debug!("[orchestrator] Command channel closed");
    }
}

fn spawn_hint(hints: &HintRequester, text: String, level: Level) {
    let hints = hints.clone();
    tokio::spawn(async move {
        hints.request(&text, level).await;
    });
}
