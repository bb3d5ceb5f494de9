//! The snake-shaped track with one station per stage.
//!
//! The track path and station positions come from the run's
//! [`TrackLayout`](tr_core::layout::TrackLayout), which works in a 0–100
//! unit square with y growing downwards. The canvas grows y upwards, so
//! every y is flipped before drawing.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Context, Line as CanvasLine};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;
use tr_core::layout::PathPoint;
use tr_core::state::RunState;

use super::status_color;

const TRACK_COLOR: Color = Color::Gray;
const MARKER_COLOR: Color = Color::Magenta;
const MARKER_GLYPH: &str = "▼";

/// Stateless renderer for the track panel.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackView;

impl TrackView {
    /// Draw the track, every station coloured by its status, and the marker
    /// above the stage the run has reached. `selected` is underlined.
    pub fn render(&self, frame: &mut Frame, area: Rect, run: &RunState, selected: usize) {
        let inner_width = f64::from(area.width.saturating_sub(2).max(1));
        let row_height = 100.0 / run.layout().row_count().max(1) as f64;
        let title = match run.trace_id() {
            Some(trace_id) => format!("Track - trace {trace_id}"),
            None => "Track".to_string(),
        };

        let canvas = Canvas::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .marker(Marker::Braille)
            .x_bounds([0.0, 100.0])
            .y_bounds([0.0, 100.0])
            .paint(|ctx| {
                draw_path(ctx, run.layout().path());
                ctx.layer();

                for (index, view) in run.stages().iter().enumerate() {
                    let Some(point) = run.layout().point_of(index) else {
                        continue;
                    };
                    let mut style = Style::default().fg(status_color(view.status));
                    if index == selected {
                        style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
                    }
                    let label = format!("{} {}", view.stage.display_icon, view.stage.display_label);
                    let status = view.status.label();
                    let y = flip(point.y);

                    ctx.print(centered(point.x, &label, inner_width), y, Span::styled(label, style));
                    ctx.print(
                        centered(point.x, status, inner_width),
                        y - row_height * 0.2,
                        Span::styled(status, Style::default().fg(status_color(view.status))),
                    );
                }

                if let Some(point) = run.marker_point() {
                    ctx.print(
                        centered(point.x, MARKER_GLYPH, inner_width),
                        flip(point.y) + row_height * 0.25,
                        Span::styled(
                            MARKER_GLYPH,
                            Style::default().fg(MARKER_COLOR).add_modifier(Modifier::BOLD),
                        ),
                    );
                }
            });

        frame.render_widget(canvas, area);
    }
}

fn draw_path(ctx: &mut Context, path: &[PathPoint]) {
    for pair in path.windows(2) {
        let [from, to] = pair else { continue };
        ctx.draw(&CanvasLine::new(
            from.x,
            flip(from.y),
            to.x,
            flip(to.y),
            TRACK_COLOR,
        ));
    }
}

fn flip(y: f64) -> f64 {
    100.0 - y
}

/// Left x that centres `text` on `x`, given the drawable width in cells.
fn centered(x: f64, text: &str, inner_width: f64) -> f64 {
    let half_width = text.chars().count() as f64 / 2.0 * (100.0 / inner_width);
    (x - half_width).max(0.0)
}
