//! Detail panel for the selected stage.
//!
//! Shows the stage status with its input and output previews and, once the
//! run is complete, the rendered run result. The panel scrolls with
//! PageUp/PageDown and shows a scrollbar when the content overflows.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};
use tr_core::state::{RunResult, StageView};

use crate::event::EventStatus;
use crate::widgets::status_color;

/// Lines moved by one PageUp/PageDown.
const PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct StageDetail {
    pub scroll_offset: usize,
}

impl StageDetail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        stage: Option<&StageView>,
        result: Option<&RunResult>,
    ) {
        let title = match stage {
            Some(view) => format!("Stage - {}", view.stage.display_label),
            None => "Stage".to_string(),
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        let lines = match stage {
            Some(view) => detail_lines(view, result),
            None => vec![Line::from("No stage selected.")],
        };
        let total_lines = lines.len();

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll_offset as u16, 0));
        frame.render_widget(paragraph, area);

        let visible_lines = area.height.saturating_sub(2) as usize;
        if total_lines > visible_lines {
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(total_lines)
                .viewport_content_length(visible_lines)
                .position(self.scroll_offset);
            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));
            frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> EventStatus {
        match key.code {
            KeyCode::PageUp => self.page_up(PAGE_SIZE),
            KeyCode::PageDown => self.page_down(PAGE_SIZE),
            _ => return EventStatus::NotConsumed,
        }
        EventStatus::Consumed
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(page_size);
    }

    /// Unbounded; scrolling past the last line shows an empty panel.
    pub fn page_down(&mut self, page_size: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(page_size);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }
}

fn detail_lines(view: &StageView, result: Option<&RunResult>) -> Vec<Line<'static>> {
    let heading = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(vec![
            Span::raw(format!("{} ", view.stage.display_icon)),
            Span::styled(view.stage.display_label.clone(), heading),
            Span::styled(
                format!("  {}", view.status.label()),
                Style::default().fg(status_color(view.status)),
            ),
        ]),
        Line::from(""),
        Line::styled("Input", heading),
    ];
    lines.extend(text_lines(&view.input.to_string()));
    lines.push(Line::from(""));
    lines.push(Line::styled("Output", heading));
    lines.extend(text_lines(&view.output.to_string()));

    if let Some(result) = result {
        lines.push(Line::from(""));
        lines.push(Line::styled("Result", heading.fg(Color::Cyan)));
        lines.extend(text_lines(&result.render()));
    }
    lines
}

fn text_lines(text: &str) -> Vec<Line<'static>> {
    text.lines().map(|line| Line::from(format!("  {line}"))).collect()
}
