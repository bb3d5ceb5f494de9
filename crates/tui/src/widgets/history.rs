//! Run history table, newest run first.

use chrono::Local;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;
use tr_protocol::RunRecord;

use super::run_status_color;

/// Characters of a trace id shown in the table.
const TRACE_ID_WIDTH: usize = 16;

/// Renders the ledger as a table.
///
/// # Arguments
/// * `frame` - The frame to render into
/// * `area` - The area to render the table in
/// * `runs` - Ledger snapshot, newest first
pub fn render_history(frame: &mut Frame, area: Rect, runs: &[RunRecord]) {
    let visible = area.height.saturating_sub(3) as usize;
    let rows: Vec<Row> = runs
        .iter()
        .take(visible)
        .map(|run| {
            let status = Cell::from(run.status.as_str())
                .style(Style::default().fg(run_status_color(run.status)));
            Row::new(vec![
                Cell::from(finished_at(run)),
                Cell::from(short_trace_id(&run.trace_id)),
                status,
                Cell::from(run.steps().to_string()),
                Cell::from(run.duration().to_string()),
            ])
        })
        .collect();

    let header = Row::new(vec!["Finished", "Trace", "Status", "Steps", "ms"]).style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .fg(Color::Cyan),
    );

    let widths = [
        Constraint::Length(8),
        Constraint::Length(TRACE_ID_WIDTH as u16),
        Constraint::Length(6),
        Constraint::Length(5),
        Constraint::Min(5),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("History ({})", runs.len())),
    );

    frame.render_widget(table, area);
}

/// Local wall-clock time of day, or `?` for a timestamp out of range.
fn finished_at(run: &RunRecord) -> String {
    run.finished_at()
        .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn short_trace_id(trace_id: &str) -> String {
    trace_id.chars().take(TRACE_ID_WIDTH).collect()
}
