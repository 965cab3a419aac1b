use anyhow::Result;
use crossbeam_channel::Receiver;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use tutor_common::locale;
use tutor_common::session::Theme;
use tutor_common::turn::{DisplayId, Turn};
use tutor_orchestrator::{Command, Panel, SubmitGate, parse_line};

use crate::surface::UiEvent;
use crate::theme::ThemeStore;

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Turn(Turn),
    Notice(String),
    Error(String),
}

/// What the caller should do after a key press.
#[derive(Debug, PartialEq)]
pub enum KeyAction {
    None,
    Quit,
    Line(String),
}

/// All state shown on screen. Mutated only by `apply` and `handle_key`.
pub struct ChatView {
    entries: Vec<Entry>,
    translations: Vec<(DisplayId, String)>,
    feedback: Option<String>,
    hint: Option<String>,
    manual_open: bool,
    reply_loading: bool,
    enrichment_loading: bool,
    hint_loading: bool,
    input_enabled: bool,
    translation_visible: bool,
    feedback_visible: bool,
    theme: Theme,
    input: String,
}

impl ChatView {
    pub fn new(theme: Theme) -> Self {
        Self {
            entries: Vec::new(),
            translations: Vec::new(),
            feedback: None,
            hint: None,
            manual_open: false,
            reply_loading: false,
            enrichment_loading: false,
            hint_loading: false,
            input_enabled: true,
            translation_visible: true,
            feedback_visible: true,
            theme,
            input: String::new(),
        }
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// Apply one display update. Returns the new theme when it changed so the
    /// caller can persist it.
    pub fn apply(&mut self, event: UiEvent) -> Option<Theme> {
        match event {
            UiEvent::Turn(turn) => self.entries.push(Entry::Turn(turn)),
            UiEvent::Translation(id, text) => {
                if !self.displays(&id) {
                    debug!("[client] Dropping translation for {id}, no longer shown");
                    return None;
                }
                match self.translations.iter_mut().find(|(t, _)| *t == id) {
                    Some(slot) => slot.1 = text,
                    None => self.translations.push((id, text)),
                }
            }
            UiEvent::Feedback(text) => self.feedback = Some(text),
            UiEvent::Error(message) => self.entries.push(Entry::Error(message)),
            UiEvent::Notice(message) => self.entries.push(Entry::Notice(message)),
            UiEvent::Hint(hint) => self.hint = Some(hint),
            UiEvent::ReplyLoading(on) => self.reply_loading = on,
            UiEvent::EnrichmentLoading(on) => self.enrichment_loading = on,
            UiEvent::HintLoading(on) => self.hint_loading = on,
            UiEvent::InputEnabled(on) => self.input_enabled = on,
            UiEvent::Clear => {
                self.entries.clear();
                self.translations.clear();
                self.feedback = None;
                self.hint = None;
            }
            UiEvent::TogglePanel(Panel::Translation) => {
                self.translation_visible = !self.translation_visible
            }
            UiEvent::TogglePanel(Panel::Feedback) => {
                self.feedback_visible = !self.feedback_visible
            }
            UiEvent::ToggleTheme => {
                self.theme = self.theme.toggled();
                return Some(self.theme);
            }
            UiEvent::ShowManual => self.manual_open = true,
        }
        None
    }

    fn displays(&self, id: &DisplayId) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, Entry::Turn(t) if t.display_id == *id))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyAction {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d'))
        {
            return KeyAction::Quit;
        }
        match key.code {
            KeyCode::Esc => {
                self.hint = None;
                self.manual_open = false;
            }
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => {
                if !self.input.trim().is_empty() {
                    return KeyAction::Line(std::mem::take(&mut self.input));
                }
            }
            _ => {}
        }
        KeyAction::None
    }

    /// Put a rejected line back so the learner does not lose it.
    fn restore_input(&mut self, line: String) {
        self.input = line;
    }

    pub fn draw(&self, frame: &mut Frame) {
        let palette = Palette::of(self.theme);
        frame.render_widget(Block::new().style(palette.base), frame.area());

        let [body, input_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).areas(frame.area());

        let side_visible = self.translation_visible || self.feedback_visible;
        let conversation_area = if side_visible {
            let [left, right] =
                Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                    .areas(body);
            self.draw_side_panels(frame, right, &palette);
            left
        } else {
            body
        };

        self.draw_conversation(frame, conversation_area, &palette);
        self.draw_input(frame, input_area, &palette);

        if let Some(hint) = &self.hint {
            popup(frame, " ヒント (Esc) ", hint, &palette);
        } else if self.manual_open {
            popup(frame, " Manual (Esc) ", locale::MANUAL, &palette);
        }
    }

    fn draw_conversation(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let mut lines = Vec::new();
        for entry in &self.entries {
            match entry {
                Entry::Turn(turn) => {
                    lines.push(Line::from(Span::styled(
                        turn.display_id.to_string(),
                        palette.label.add_modifier(Modifier::BOLD),
                    )));
                    lines.extend(turn.content.lines().map(|l| Line::from(l.to_string())));
                    lines.push(Line::default());
                }
                Entry::Notice(message) => {
                    lines.push(Line::from(Span::styled(format!("* {message}"), palette.dim)));
                }
                Entry::Error(message) => {
                    lines.push(Line::from(Span::styled(format!("! {message}"), palette.error)));
                }
            }
        }
        if self.reply_loading {
            lines.push(Line::from(Span::styled("Loading...", palette.dim)));
        }

        let title = if self.hint_loading {
            " Conversation (ヒント取得中...) "
        } else {
            " Conversation "
        };
        frame.render_widget(tail_paragraph(Text::from(lines), title, area), area);
    }

    fn draw_side_panels(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let (translation_area, feedback_area) =
            match (self.translation_visible, self.feedback_visible) {
                (true, true) => {
                    let [top, bottom] =
                        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
                            .areas(area);
                    (Some(top), Some(bottom))
                }
                (true, false) => (Some(area), None),
                (false, true) => (None, Some(area)),
                (false, false) => (None, None),
            };
        let loading = if self.enrichment_loading { " ..." } else { "" };

        if let Some(area) = translation_area {
            let text = if self.translations.is_empty() {
                Text::from(Span::styled(locale::TRANSLATION_PLACEHOLDER, palette.dim))
            } else {
                Text::from(
                    self.translations
                        .iter()
                        .flat_map(|(id, t)| {
                            [
                                Line::from(Span::styled(id.to_string(), palette.label)),
                                Line::from(t.clone()),
                            ]
                        })
                        .collect::<Vec<_>>(),
                )
            };
            let title = format!(" 和訳{loading} ");
            frame.render_widget(tail_paragraph(text, &title, area), area);
        }

        if let Some(area) = feedback_area {
            let text = match &self.feedback {
                Some(f) => Text::from(f.clone()),
                None => Text::from(Span::styled(locale::FEEDBACK_PLACEHOLDER, palette.dim)),
            };
            let title = format!(" フィードバック{loading} ");
            frame.render_widget(
                Paragraph::new(text)
                    .wrap(Wrap { trim: false })
                    .block(Block::bordered().title(title)),
                area,
            );
        }
    }

    fn draw_input(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
        let (title, style) = if self.input_enabled {
            (" Message (Enter=send, /help, Ctrl+C=quit) ", palette.base)
        } else {
            (" Waiting for the teacher... ", palette.dim)
        };
        frame.render_widget(
            Paragraph::new(format!("{}_", self.input))
                .style(style)
                .block(Block::bordered().title(title)),
            area,
        );
    }
}

struct Palette {
    base: Style,
    label: Style,
    dim: Style,
    error: Style,
}

impl Palette {
    fn of(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                base: Style::default().fg(Color::Black).bg(Color::White),
                label: Style::default().fg(Color::Blue),
                dim: Style::default().fg(Color::DarkGray),
                error: Style::default().fg(Color::Red),
            },
            Theme::Dark => Self {
                base: Style::default().fg(Color::Gray).bg(Color::Black),
                label: Style::default().fg(Color::Cyan),
                dim: Style::default().fg(Color::DarkGray),
                error: Style::default().fg(Color::LightRed),
            },
        }
    }
}

/// Wrapped paragraph scrolled so its last lines stay visible.
fn tail_paragraph<'a>(text: Text<'a>, title: &str, area: Rect) -> Paragraph<'a> {
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;
    // Estimate wrapped height; exact enough for keeping the tail in view.
    let rows: usize = text
        .lines
        .iter()
        .map(|l| l.width().div_ceil(inner_width).max(1))
        .sum();
    let scroll = rows.saturating_sub(inner_height).min(u16::MAX as usize) as u16;
    Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(Block::bordered().title(title.to_string()))
}

fn popup(frame: &mut Frame, title: &str, body: &str, palette: &Palette) {
    let area = centered(frame.area(), 70, 50);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(body.to_string())
            .style(palette.base)
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title(title.to_string())),
        area,
    );
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = (u32::from(area.height) * u32::from(percent_y) / 100) as u16;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Run the chat screen until the learner quits. Display updates arrive on
/// `events`; parsed commands leave on `commands`.
pub fn run(
    events: Receiver<UiEvent>,
    commands: UnboundedSender<Command>,
    gate: SubmitGate,
    themes: ThemeStore,
) -> Result<()> {
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, events, commands, gate, themes);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    events: Receiver<UiEvent>,
    commands: UnboundedSender<Command>,
    gate: SubmitGate,
    themes: ThemeStore,
) -> Result<()> {
    let mut view = ChatView::new(themes.load());

    loop {
        for event in events.try_iter() {
            if let Some(theme) = view.apply(event)
                && let Err(e) = themes.save(theme)
            {
                warn!("[client] Could not save theme: {e:#}");
            }
        }

        terminal.draw(|frame| view.draw(frame))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let line = match view.handle_key(key) {
            KeyAction::None => continue,
            KeyAction::Quit => {
                info!("[client] Quit requested");
                return Ok(());
            }
            KeyAction::Line(line) => line,
        };

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(usage) => {
                view.apply(UiEvent::Notice(usage));
                continue;
            }
        };
        if matches!(command, Command::Submit(_)) && !(gate.is_open() && view.input_enabled()) {
            debug!("[client] Reply pending, keeping input");
            view.restore_input(line);
            continue;
        }
        if commands.send(command).is_err() {
            warn!("[client] Orchestrator stopped, exiting");
            return Ok(());
        }
    }
}
