//! Input line with slash command autocomplete.
//!
//! Plain text is submitted as a text run. Input starting with `/` is a
//! command; typing `/` opens a popup of matching commands.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use tr_protocol::{Op, PayloadType, ProcessRequest};

use crate::event::EventStatus;

/// Available slash commands with their descriptions.
const COMMANDS: &[(&str, &str)] = &[
    ("/json <data>", "Submit a JSON payload"),
    ("/reload", "Fetch the pipeline configuration again"),
    ("/export <path>", "Write run history to a file"),
    ("/import <path>", "Merge run history from a file"),
    ("/clear-history", "Delete all recorded runs"),
    ("/quit", "Exit tracerail"),
];

/// What a submitted line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Forward to the core loop.
    Op(Op),
    /// Leave the application.
    Quit,
}

#[derive(Debug, Clone, Default)]
pub struct Composer {
    input: String,
    /// Cursor position in characters, not bytes.
    cursor: usize,
    show_popup: bool,
    selected_index: usize,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn should_show_popup(&self) -> bool {
        self.show_popup && !self.suggestions().is_empty()
    }

    /// Commands whose name starts with the typed prefix.
    pub fn suggestions(&self) -> Vec<(&'static str, &'static str)> {
        if !self.input.starts_with('/') {
            return Vec::new();
        }
        let typed = self.input.trim();
        COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(typed))
            .copied()
            .collect()
    }

    pub fn selected_suggestion(&self) -> Option<(&'static str, &'static str)> {
        self.suggestions().get(self.selected_index).copied()
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index();
        self.input.insert(at, c);
        self.cursor += 1;
        self.update_popup_state();
    }

    /// Insert pasted text; newlines become spaces.
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars() {
            self.insert_char(if c == '\n' || c == '\r' { ' ' } else { c });
        }
    }

    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.input.remove(at);
        self.update_popup_state();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn move_selection_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        if self.selected_index + 1 < self.suggestions().len() {
            self.selected_index += 1;
        }
    }

    /// Replace the input with the selected command name (Tab).
    pub fn complete_with_selection(&mut self) {
        let Some((cmd, _)) = self.selected_suggestion() else {
            return;
        };
        let name = cmd.split_whitespace().next().unwrap_or(cmd);
        let takes_argument = cmd.contains('<');
        self.input = if takes_argument {
            format!("{name} ")
        } else {
            name.to_string()
        };
        self.cursor = self.input.chars().count();
        self.show_popup = false;
        self.selected_index = 0;
    }

    /// Keys the popup acts on while it is open.
    pub fn handle_popup_key(&mut self, key: KeyEvent) -> EventStatus {
        if !self.should_show_popup() {
            return EventStatus::NotConsumed;
        }
        match key.code {
            KeyCode::Up => self.move_selection_up(),
            KeyCode::Down => self.move_selection_down(),
            KeyCode::Tab => self.complete_with_selection(),
            KeyCode::Esc => self.show_popup = false,
            _ => return EventStatus::NotConsumed,
        }
        EventStatus::Consumed
    }

    /// Editing keys for the input line.
    pub fn handle_edit_key(&mut self, key: KeyEvent) -> EventStatus {
        match key.code {
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.input.chars().count(),
            KeyCode::Esc => self.clear(),
            _ => return EventStatus::NotConsumed,
        }
        EventStatus::Consumed
    }

    /// Parse the current input.
    ///
    /// `Ok(None)` for blank input; `Err` carries a message for the user.
    pub fn parse_command(&self) -> Result<Option<Command>, String> {
        let input = self.input.trim();
        if input.is_empty() {
            return Ok(None);
        }

        let Some(command) = input.strip_prefix('/') else {
            return Ok(Some(Command::Op(Op::Submit {
                request: ProcessRequest::text(input),
            })));
        };

        let (name, argument) = match command.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command, ""),
        };

        let op = match name {
            "json" => {
                if argument.is_empty() {
                    return Err("Missing JSON data".to_string());
                }
                serde_json::from_str::<serde_json::Value>(argument)
                    .map_err(|e| format!("Invalid JSON: {e}"))?;
                Op::Submit {
                    request: ProcessRequest::typed(PayloadType::Json, argument),
                }
            }
            "reload" => Op::ReloadPipeline,
            "export" => Op::ExportHistory {
                path: required_path(argument)?,
            },
            "import" => Op::ImportHistory {
                path: required_path(argument)?,
            },
            "clear-history" => Op::ClearHistory,
            "quit" | "q" => return Ok(Some(Command::Quit)),
            _ => return Err(format!("Unknown command: /{name}")),
        };
        Ok(Some(Command::Op(op)))
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Submit (Enter) · /commands · Ctrl+C to quit");
        let inner = block.inner(area);
        block.render(area, buf);

        Paragraph::new(format!("> {}", self.input))
            .style(Style::default().fg(Color::Yellow))
            .render(inner, buf);
    }

    pub fn render_popup(&self, area: Rect, buf: &mut Buffer) {
        if !self.should_show_popup() {
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Commands")
            .style(Style::default().bg(Color::Black));
        let inner = block.inner(area);
        block.render(area, buf);

        let rows = self.suggestions().into_iter().enumerate();
        for ((i, (cmd, desc)), y) in rows.zip(inner.y..inner.y + inner.height) {
            let style = if i == self.selected_index {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let line = Line::from(vec![
                Span::styled(format!("{cmd:<18}"), style),
                Span::styled(desc, style.fg(Color::Gray)),
            ]);
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }

    /// Height the popup needs, borders included.
    pub fn popup_height(&self) -> u16 {
        self.suggestions().len() as u16 + 2
    }

    /// Cursor column relative to the input area, after the `> ` prompt.
    pub fn cursor_column(&self) -> u16 {
        self.cursor as u16 + 2
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor)
            .map_or(self.input.len(), |(i, _)| i)
    }

    fn update_popup_state(&mut self) {
        self.show_popup = self.input.starts_with('/') && !self.input.contains(' ');
        let count = self.suggestions().len();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
        }
    }
}

fn required_path(argument: &str) -> Result<PathBuf, String> {
    if argument.is_empty() {
        Err("Missing file path".to_string())
    } else {
        Ok(PathBuf::from(argument))
    }
}
