//! # tr-tui
//!
//! Terminal user interface for tracerail.
//!
//! The TUI renders the active run as a snake-shaped track of stations with
//! a detail panel for the selected stage and the run history next to it.
//! It talks to `tr-core` over channels using the `Op` and `Event` protocol
//! defined in `tr-protocol`; the core loop owns the gateway connection and
//! the history file.

pub mod app;
pub mod event;
pub mod event_handler;
pub mod tui;
pub mod widgets;

pub use app::App;
pub use tui::Tui;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, Mutex};
use tr_core::config::models::AppConfig;
use tr_core::engine::core_loop;
use tr_core::gateway::{Gateway, HttpGateway};
use tr_core::history::{FilePort, RunHistoryStore};
use tr_protocol::Op;
use tracing::info;

const OP_CHANNEL_CAPACITY: usize = 32;
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Run the interactive session until the user quits.
pub async fn run_app(config: AppConfig) -> Result<()> {
    let gateway: Arc<dyn Gateway> = Arc::new(HttpGateway::from_config(&config.client)?);
    let history = RunHistoryStore::load(FilePort::new(&config.history_path));
    info!(
        gateway = %config.client.gateway_url,
        history = %config.history_path.display(),
        runs = history.len(),
        "starting tui"
    );

    let (op_tx, op_rx) = mpsc::channel(OP_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let core = tokio::spawn(core_loop(
        op_rx,
        event_tx,
        gateway,
        Arc::new(Mutex::new(history)),
    ));
    op_tx.send(Op::ReloadPipeline).await?;

    let mut tui = Tui::init()?;
    let mut app = App::new(config.client, op_tx, event_rx);
    let result = app.run(&mut tui).await;
    tui.restore()?;

    drop(app);
    let _ = core.await;
    result
}
