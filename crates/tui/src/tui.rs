//! Terminal setup, input events and frame scheduling.
//!
//! [`Tui`] owns the ratatui terminal for the lifetime of the interactive
//! session. Draws are never issued directly by state changes; callers ask a
//! [`FrameRequester`] for a frame and a background task coalesces bursts of
//! requests (one per streamed progress event, for instance) into a single
//! [`TuiEvent::Draw`].

use anyhow::Result;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::Event;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::execute;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::stdout;
use std::io::Stdout;
use std::pin::Pin;
use std::time::Duration;
use std::time::Instant;
use tokio::select;
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio_stream::Stream;
use tokio_stream::StreamExt;

pub type TerminalBackend = CrosstermBackend<Stdout>;

/// Idle wake-up of the scheduler when no frame is pending.
const IDLE_WAKEUP: Duration = Duration::from_secs(3600);

/// Input the application loop reacts to.
#[derive(Debug)]
pub enum TuiEvent {
    /// A key press. Releases and repeats are filtered out.
    Key(KeyEvent),
    /// Bracketed paste.
    Paste(String),
    /// Time to redraw (scheduled frame or terminal resize).
    Draw,
}

pub struct Tui {
    terminal: Terminal<TerminalBackend>,
    frame_schedule_tx: UnboundedSender<Instant>,
    draw_tx: broadcast::Sender<()>,
}

impl Tui {
    /// Enter raw mode and the alternate screen.
    ///
    /// Must be called from within a tokio runtime: the frame scheduler runs
    /// as a background task.
    pub fn init() -> Result<Self> {
        enable_raw_mode()?;
        execute!(stdout(), EnableBracketedPaste, EnterAlternateScreen)?;
        set_panic_hook();

        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

        let (frame_schedule_tx, frame_schedule_rx) = tokio::sync::mpsc::unbounded_channel();
        let (draw_tx, _) = broadcast::channel(1);
        tokio::spawn(run_frame_scheduler(frame_schedule_rx, draw_tx.clone()));

        Ok(Self {
            terminal,
            frame_schedule_tx,
            draw_tx,
        })
    }

    /// Leave the alternate screen and raw mode. Safe to call twice.
    pub fn restore(&mut self) -> Result<()> {
        restore_terminal()?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    pub fn frame_requester(&self) -> FrameRequester {
        FrameRequester {
            frame_schedule_tx: self.frame_schedule_tx.clone(),
        }
    }

    /// Merge terminal input with scheduled draws into one stream.
    pub fn event_stream(&self) -> Pin<Box<dyn Stream<Item = TuiEvent> + Send + 'static>> {
        let mut crossterm_events = crossterm::event::EventStream::new();
        let mut draw_rx = self.draw_tx.subscribe();

        let event_stream = async_stream::stream! {
            loop {
                select! {
                    Some(Ok(event)) = crossterm_events.next() => {
                        match event {
                            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                                yield TuiEvent::Key(key_event);
                            }
                            Event::Resize(_, _) => yield TuiEvent::Draw,
                            Event::Paste(pasted) => yield TuiEvent::Paste(pasted),
                            _ => {}
                        }
                    }
                    result = draw_rx.recv() => {
                        match result {
                            // A lagged receiver still only needs one redraw.
                            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                                yield TuiEvent::Draw;
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
        };

        Box::pin(event_stream)
    }

    pub fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(f)?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Handle for scheduling redraws from anywhere in the application.
#[derive(Clone, Debug)]
pub struct FrameRequester {
    frame_schedule_tx: UnboundedSender<Instant>,
}

impl FrameRequester {
    pub fn schedule_frame(&self) {
        let _ = self.frame_schedule_tx.send(Instant::now());
    }

    pub fn schedule_frame_in(&self, dur: Duration) {
        let _ = self.frame_schedule_tx.send(Instant::now() + dur);
    }
}

/// Coalesce frame requests: keep only the earliest pending deadline and
/// emit one draw when it passes. Exits when every requester is dropped.
async fn run_frame_scheduler(mut rx: UnboundedReceiver<Instant>, draw_tx: broadcast::Sender<()>) {
    let mut next_deadline: Option<Instant> = None;

    loop {
        let target = next_deadline.unwrap_or_else(|| Instant::now() + IDLE_WAKEUP);
        let sleep = tokio::time::sleep_until(tokio::time::Instant::from_std(target));
        tokio::pin!(sleep);

        select! {
            recv = rx.recv() => match recv {
                Some(at) => next_deadline = Some(earliest(next_deadline, at)),
                None => break,
            },
            _ = &mut sleep => {
                if next_deadline.take().is_some() {
                    let _ = draw_tx.send(());
                }
            }
        }
    }
}

fn earliest(current: Option<Instant>, candidate: Instant) -> Instant {
    match current {
        Some(current) if current <= candidate => current,
        _ => candidate,
    }
}

fn restore_terminal() -> std::io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen)
}

/// Restore the terminal before the default hook prints the panic.
fn set_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}
