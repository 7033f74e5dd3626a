use chrono::{Local, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::UiConfig;
use crate::conversation::{Message, Sender};
use crate::core::{ConversationSession, Dispatcher, ViewEntry};
use crate::tui::Action;

use super::AppController;

const SPINNER: [&str; 4] = ["   ", ".  ", ".. ", "..."];

pub struct ChatApp {
    session: ConversationSession,
    dispatcher: Dispatcher<Action>,
    labels: UiConfig,
    should_quit: bool,
    tick: usize,
}

impl ChatApp {
    pub fn new(session: ConversationSession, dispatcher: Dispatcher<Action>, labels: UiConfig) -> Self {
        Self {
            session,
            dispatcher,
            labels,
            should_quit: false,
            tick: 0,
        }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Enter => {
                if let Some(question) = self.session.submit() {
                    self.dispatcher.dispatch(question);
                }
            }
            // The input line is disabled while an answer is outstanding
            _ if self.session.awaiting_response() => {}
            KeyCode::Char(c) => {
                let mut text = self.session.pending().to_string();
                text.push(c);
                self.session.update_input(text);
            }
            KeyCode::Backspace => {
                let mut text = self.session.pending().to_string();
                text.pop();
                self.session.update_input(text);
            }
            _ => {}
        }
    }

    fn message_item(message: &Message, width: usize) -> ListItem<'static> {
        let (label_style, text_style) = match message.sender() {
            Sender::User => (
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                Style::default(),
            ),
            Sender::Bot => (
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                Style::default().fg(Color::Gray),
            ),
        };
        let time = message.sent_at().with_timezone(&Local).format("%H:%M");

        let mut lines = vec![Line::from(vec![
            Span::styled(message.sender().label(), label_style),
            Span::styled(format!(" {}", time), Style::default().fg(Color::DarkGray)),
        ])];
        lines.extend(
            wrap(message.text(), width)
                .into_iter()
                .map(|line| Line::styled(line, text_style)),
        );
        lines.push(Line::default());
        ListItem::new(lines)
    }
}

impl AppController for ChatApp {
    fn update(&mut self, action: Action) {
        match action {
            Action::Tick => self.tick = self.tick.wrapping_add(1),
            Action::Resize(width, height) => {
                tracing::debug!(width, height, "Terminal resized");
            }
            Action::Key(key) => self.handle_key(key),
            Action::Settled(settlement) => {
                self.session.settle(settlement);
            }
        }
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(f.area());

        let header = Paragraph::new(Line::from(Span::styled(
            self.labels.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(header, chunks[0]);

        let view = self.session.view();
        let width = chunks[1].width.saturating_sub(2) as usize;
        let items: Vec<ListItem> = view
            .entries
            .iter()
            .map(|entry| match entry {
                ViewEntry::Message(message) => Self::message_item(message, width),
                ViewEntry::Pending { since } => {
                    let elapsed = (Utc::now() - *since).num_seconds().max(0);
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            Sender::Bot.label(),
                            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!(" Thinking{} ({}s)", SPINNER[self.tick % SPINNER.len()], elapsed),
                            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                        ),
                    ]))
                }
            })
            .collect();

        // Selecting the last entry keeps the newest message in view
        let mut list_state = ListState::default().with_selected(items.len().checked_sub(1));
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Conversation"));
        f.render_stateful_widget(list, chunks[1], &mut list_state);

        let (input_line, title) = if !view.input_enabled {
            (
                Line::styled(view.input, Style::default().fg(Color::DarkGray)),
                "Waiting for answer...",
            )
        } else if view.input.is_empty() {
            (
                Line::styled(
                    self.labels.placeholder.as_str(),
                    Style::default().fg(Color::DarkGray),
                ),
                "Message (Enter to send, Esc to quit)",
            )
        } else {
            (Line::raw(view.input), "Message (Enter to send, Esc to quit)")
        };
        let (scroll, cursor_col) = input_scroll(view.input, chunks[2].width.saturating_sub(2));
        let input = Paragraph::new(input_line)
            .scroll((0, scroll))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(input, chunks[2]);

        if view.input_enabled {
            f.set_cursor_position(Position::new(
                chunks[2].x.saturating_add(1).saturating_add(cursor_col),
                chunks[2].y.saturating_add(1),
            ));
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }
}

/// Horizontal scroll offset and cursor column for an input line `inner_width`
/// columns wide. The tail of the text stays visible with room for the cursor.
fn input_scroll(input: &str, inner_width: u16) -> (u16, u16) {
    let typed = u16::try_from(input.width()).unwrap_or(u16::MAX);
    let offset = typed.saturating_sub(inner_width.saturating_sub(1));
    (offset, typed - offset)
}

/// Greedy word wrap to `width` display columns; words longer than a line are split
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for raw in text.split('\n') {
        let mut line = String::new();
        let mut len = 0;

        for word in raw.split(' ') {
            if len > 0 && len + 1 + word.width() > width {
                lines.push(std::mem::take(&mut line));
                len = 0;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            for ch in word.chars() {
                let ch_width = ch.width().unwrap_or(0);
                if len > 0 && len + ch_width > width {
                    lines.push(std::mem::take(&mut line));
                    len = 0;
                }
                line.push(ch);
                len += ch_width;
            }
        }
        lines.push(line);
    }

    lines
}
