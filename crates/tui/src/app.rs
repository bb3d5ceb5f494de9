//! TUI application state and event loop.
//!
//! [`App`] owns the [`RunState`] for the active run and nothing else that
//! could disagree with it: every panel is a projection of that state, the
//! loaded pipeline and the history snapshot. Core events and terminal input
//! are multiplexed with `tokio::select!`.

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use tokio::select;
use tokio::sync::mpsc::{error::TrySendError, Receiver, Sender};
use tokio_stream::StreamExt;
use tr_core::state::RunState;
use tr_protocol::{ClientConfig, Event, Op, PipelineService, ProcessRequest, RunRecord};
use tracing::warn;

use crate::event_handler;
use crate::tui::{Tui, TuiEvent};
use crate::widgets::{history::render_history, Composer, StageDetail, TrackView};

/// One-line message shown above the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Notice(String),
    Failure(String),
}

pub struct App {
    pub run: RunState,
    /// Services of the last loaded pipeline.
    pub services: Vec<PipelineService>,
    /// Newest-first ledger snapshot from the core.
    pub history: Vec<RunRecord>,
    pub composer: Composer,
    pub detail: StageDetail,
    pub selected_stage: usize,
    pub banner: Option<Banner>,
    /// Submission awaiting its `RunStarted` acknowledgement.
    pub pending_request: Option<ProcessRequest>,
    /// A run is in flight between `RunStarted` and `RunFinished`.
    pub running: bool,
    pub should_exit: bool,
    config: ClientConfig,
    op_tx: Sender<Op>,
    event_rx: Receiver<Event>,
}

impl App {
    pub fn new(config: ClientConfig, op_tx: Sender<Op>, event_rx: Receiver<Event>) -> Self {
        Self {
            run: RunState::new(&[], config.stations_per_row),
            services: Vec::new(),
            history: Vec::new(),
            composer: Composer::new(),
            detail: StageDetail::new(),
            selected_stage: 0,
            banner: None,
            pending_request: None,
            running: false,
            should_exit: false,
            config,
            op_tx,
            event_rx,
        }
    }

    /// Main event loop. Returns when the user quits or the core hangs up,
    /// after asking the core to shut down.
    pub async fn run(&mut self, tui: &mut Tui) -> Result<()> {
        let mut tui_events = tui.event_stream();
        let frames = tui.frame_requester();
        frames.schedule_frame();

        while !self.should_exit {
            select! {
                event = self.event_rx.recv() => match event {
                    Some(event) => {
                        self.handle_core_event(event);
                        frames.schedule_frame();
                    }
                    None => break,
                },
                Some(tui_event) = tui_events.next() => match tui_event {
                    TuiEvent::Key(key) => {
                        self.handle_key_event(key);
                        frames.schedule_frame();
                    }
                    TuiEvent::Paste(text) => {
                        self.composer.insert_str(&text);
                        frames.schedule_frame();
                    }
                    TuiEvent::Draw => tui.draw(|frame| self.render(frame))?,
                },
            }
        }

        let _ = self.op_tx.send(Op::Shutdown).await;
        Ok(())
    }

    pub fn handle_core_event(&mut self, event: Event) {
        event_handler::handle_core_event(self, event);
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if let Some(op) = event_handler::handle_key_event(self, key) {
            self.send_op(op);
        }
    }

    fn send_op(&mut self, op: Op) {
        if let Err(e) = self.op_tx.try_send(op) {
            warn!(error = %e, "could not forward operation to core");
            let message = match e {
                TrySendError::Full(_) => "Busy, try again.",
                TrySendError::Closed(_) => "The core has stopped.",
            };
            self.pending_request = None;
            self.banner = Some(Banner::Failure(message.to_string()));
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(40), // Track
                Constraint::Min(6),         // Detail | History
                Constraint::Length(1),      // Status line
                Constraint::Length(3),      // Composer
            ])
            .split(frame.area());

        TrackView.render(frame, chunks[0], &self.run, self.selected_stage);

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);
        self.detail.render(
            frame,
            panels[0],
            self.run.stage(self.selected_stage),
            self.run.result(),
        );
        render_history(frame, panels[1], &self.history);

        frame.render_widget(Paragraph::new(self.status_line()), chunks[2]);

        self.composer.render(chunks[3], frame.buffer_mut());
        frame.set_cursor_position((
            chunks[3].x + 1 + self.composer.cursor_column(),
            chunks[3].y + 1,
        ));

        if self.composer.should_show_popup() {
            let popup = popup_area(chunks[1], self.composer.popup_height());
            frame.render_widget(Clear, popup);
            self.composer.render_popup(popup, frame.buffer_mut());
        }
    }

    /// Banner first, then the run-level message, then the trace link.
    fn status_line(&self) -> Line<'static> {
        if let Some(banner) = &self.banner {
            return match banner {
                Banner::Notice(text) => {
                    Line::styled(text.clone(), Style::default().fg(Color::Yellow))
                }
                Banner::Failure(text) => {
                    Line::styled(text.clone(), Style::default().fg(Color::Red))
                }
            };
        }
        if let Some(message) = self.run.message() {
            return Line::styled(format!("⚠ {message}"), Style::default().fg(Color::Red));
        }
        match self.run.trace_id() {
            Some(trace_id) => Line::from(vec![
                Span::raw("Trace: "),
                Span::styled(
                    self.config.trace_link(trace_id),
                    Style::default().fg(Color::Cyan),
                ),
            ]),
            None if self.running => Line::raw("Running…"),
            None => Line::styled(
                format!("Gateway: {}", self.config.gateway_url),
                Style::default().fg(Color::DarkGray),
            ),
        }
    }
}

/// Bottom-anchored popup inside `area`.
fn popup_area(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    Rect {
        x: area.x,
        y: area.y + area.height - height,
        width: area.width.min(60),
        height,
    }
}
