//! Widgets that project the run state onto the terminal.

pub mod composer;
pub mod history;
pub mod stage_detail;
pub mod track;

pub use composer::{Command, Composer};
pub use stage_detail::StageDetail;
pub use track::TrackView;

use ratatui::style::Color;
use tr_protocol::{RunStatus, StageStatus};

/// Colour of a stage glyph and status label.
pub fn status_color(status: StageStatus) -> Color {
    match status {
        StageStatus::Idle => Color::DarkGray,
        StageStatus::Processing => Color::Yellow,
        StageStatus::Done => Color::Green,
        StageStatus::Error => Color::Red,
    }
}

pub fn run_status_color(status: RunStatus) -> Color {
    match status {
        RunStatus::Ok => Color::Green,
        RunStatus::Error => Color::Red,
    }
}
