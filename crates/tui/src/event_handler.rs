//! Event handling for the TUI.
//!
//! - Core events update the [`App`] projection of the active run.
//! - Key events are routed through the widgets and may produce an [`Op`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tr_core::engine::service::RUN_IN_PROGRESS_MESSAGE;
use tr_protocol::{Event, Op};
use tracing::debug;

use crate::app::{App, Banner};
use crate::widgets::Command;

/// Apply an event received from the core.
pub fn handle_core_event(app: &mut App, event: Event) {
    match event {
        Event::PipelineLoaded { services } => {
            // A reload during a run is picked up by the next run.
            if !app.running {
                app.run.configure(&services);
                app.selected_stage = 0;
            }
            app.services = services;
        }
        Event::PipelineSaved { persisted } => {
            debug!(persisted, "pipeline saved");
        }
        Event::RunStarted { run_id } => {
            debug!(%run_id, "run started");
            app.run.configure(&app.services);
            if let Some(request) = app.pending_request.take() {
                app.run.on_submitted_locally(&request);
            }
            app.running = true;
            app.banner = None;
            follow_marker(app);
        }
        Event::Progress { event, .. } => {
            app.run.apply(&event);
            follow_marker(app);
        }
        Event::RunFailed { message, .. } => {
            app.run.set_message(message);
        }
        Event::RunFinished { record, .. } => {
            app.running = false;
            app.pending_request = None;
            if let Some(record) = record {
                debug!(trace_id = %record.trace_id, status = record.status.as_str(), "run recorded");
            }
        }
        Event::HistoryChanged { runs } => app.history = runs,
        Event::Notice { message } => app.banner = Some(Banner::Notice(message)),
        Event::Failure { message } => app.banner = Some(Banner::Failure(message)),
    }
}

/// Handle a key press. Returns the operation to forward to the core, if any.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Op> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_exit = true;
        return None;
    }

    if app.composer.handle_popup_key(key).is_consumed() {
        return None;
    }

    match key.code {
        KeyCode::Enter => return submit(app),
        KeyCode::Up => select_stage(app, -1),
        KeyCode::Down => select_stage(app, 1),
        KeyCode::Esc if app.composer.is_empty() => app.banner = None,
        _ => {
            if !app.detail.handle_key_event(key).is_consumed() {
                app.composer.handle_edit_key(key);
            }
        }
    }
    None
}

fn submit(app: &mut App) -> Option<Op> {
    let parsed = app.composer.parse_command();
    match parsed {
        Ok(None) => None,
        Ok(Some(Command::Quit)) => {
            app.should_exit = true;
            None
        }
        Ok(Some(Command::Op(op))) => {
            app.composer.clear();
            if let Op::Submit { request } = &op {
                if app.running {
                    app.banner = Some(Banner::Notice(RUN_IN_PROGRESS_MESSAGE.to_string()));
                    return None;
                }
                app.pending_request = Some(request.clone());
                // Clear the previous run before the gateway answers, so a
                // refusal is not shown over stale stations.
                app.run.configure(&app.services);
                app.selected_stage = 0;
                app.detail.scroll_to_top();
            }
            Some(op)
        }
        Err(message) => {
            app.banner = Some(Banner::Failure(message));
            None
        }
    }
}

fn select_stage(app: &mut App, delta: isize) {
    let last = app.run.stages().len().saturating_sub(1);
    app.selected_stage = app.selected_stage.saturating_add_signed(delta).min(last);
    app.detail.scroll_to_top();
}

/// Keep the detail panel on the stage the marker is at.
fn follow_marker(app: &mut App) {
    if let Some(marker) = app.run.marker() {
        if marker != app.selected_stage {
            app.selected_stage = marker;
            app.detail.scroll_to_top();
        }
    }
}
