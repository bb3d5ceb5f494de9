//! Core service loop serving UI operations.
//!
//! The loop owns the gateway connection and the history ledger on behalf of
//! the UI. At most one run is in flight; it executes on a background task
//! so pipeline and history operations stay responsive meanwhile.

use super::RunEngine;
use crate::gateway::{fallback_services, save_message, Gateway};
use crate::history::RunHistoryStore;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tr_protocol::ipc::{Event, Op};

/// Notice sent when a submission arrives while a run is in flight.
pub const RUN_IN_PROGRESS_MESSAGE: &str = "A run is already in progress.";

/// Serve `Op`s until `Shutdown` arrives or the UI hangs up.
///
/// Sends the current history snapshot once at start.
///
/// # Arguments
///
/// * `ops_rx` - Operations from the UI
/// * `events_tx` - Channel for sending events to the UI
/// * `gateway` - The gateway to talk to
/// * `history` - The run history ledger
pub async fn core_loop(
    mut ops_rx: Receiver<Op>,
    events_tx: Sender<Event>,
    gateway: Arc<dyn Gateway>,
    history: Arc<Mutex<RunHistoryStore>>,
) {
    let engine = Arc::new(RunEngine::new(gateway, history));
    let mut active: Option<JoinHandle<()>> = None;

    send_history(&engine, &events_tx).await;

    while let Some(op) = ops_rx.recv().await {
        debug!(?op, "core received op");
        match op {
            Op::Submit { request } => {
                if active.as_ref().is_some_and(|handle| !handle.is_finished()) {
                    notice(&events_tx, RUN_IN_PROGRESS_MESSAGE).await;
                    continue;
                }
                let engine = Arc::clone(&engine);
                let events_tx = events_tx.clone();
                active = Some(tokio::spawn(async move {
                    engine.run(&request, &events_tx).await;
                }));
            }
            Op::ReloadPipeline => reload_pipeline(engine.gateway().as_ref(), &events_tx).await,
            Op::SavePipeline { services } => {
                match engine.gateway().save_pipeline(&services).await {
                    Ok(response) => {
                        let persisted = response.saved.unwrap_or(false);
                        info!(services = services.len(), persisted, "pipeline saved");
                        let _ = events_tx.send(Event::PipelineSaved { persisted }).await;
                        notice(&events_tx, save_message(&response)).await;
                        reload_pipeline(engine.gateway().as_ref(), &events_tx).await;
                    }
                    Err(e) => failure(&events_tx, e.to_string()).await,
                }
            }
            Op::ExportHistory { path } => match export_history(&engine, &path).await {
                Ok(count) => {
                    notice(
                        &events_tx,
                        format!("Exported {count} run(s) to {}.", path.display()),
                    )
                    .await;
                }
                Err(e) => failure(&events_tx, format!("{e:#}")).await,
            },
            Op::ImportHistory { path } => {
                let text = match tokio::fs::read_to_string(&path).await {
                    Ok(text) => text,
                    Err(e) => {
                        failure(&events_tx, format!("Failed to read {}: {e}", path.display()))
                            .await;
                        continue;
                    }
                };
                let outcome = engine.history().lock().await.import(&text);
                match outcome {
                    Ok(outcome) => {
                        notice(&events_tx, outcome.message).await;
                        send_history(&engine, &events_tx).await;
                    }
                    Err(e) => failure(&events_tx, e.to_string()).await,
                }
            }
            Op::ClearHistory => {
                engine.history().lock().await.clear();
                send_history(&engine, &events_tx).await;
                notice(&events_tx, "Run history cleared.").await;
            }
            Op::Shutdown => break,
        }
    }

    if let Some(handle) = active {
        handle.abort();
    }
    debug!("core loop stopped");
}

async fn reload_pipeline(gateway: &dyn Gateway, events_tx: &Sender<Event>) {
    let services = match gateway.fetch_pipeline().await {
        Ok(services) if !services.is_empty() => services,
        Ok(_) => fallback_services(),
        Err(e) => {
            warn!(error = %e, "failed to fetch pipeline; using defaults");
            notice(events_tx, format!("Could not load pipeline ({e}); showing defaults.")).await;
            fallback_services()
        }
    };
    let _ = events_tx.send(Event::PipelineLoaded { services }).await;
}

async fn export_history(engine: &RunEngine, path: &Path) -> anyhow::Result<usize> {
    let (document, count) = {
        let history = engine.history().lock().await;
        (history.export()?, history.len())
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, document).await?;
    Ok(count)
}

async fn send_history(engine: &RunEngine, events_tx: &Sender<Event>) {
    let runs = engine.history().lock().await.runs().to_vec();
    let _ = events_tx.send(Event::HistoryChanged { runs }).await;
}

async fn notice(events_tx: &Sender<Event>, message: impl Into<String>) {
    let _ = events_tx
        .send(Event::Notice {
            message: message.into(),
        })
        .await;
}

async fn failure(events_tx: &Sender<Event>, message: String) {
    warn!(%message, "operation failed");
    let _ = events_tx.send(Event::Failure { message }).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ScriptedGateway;
    use crate::history::MemoryPort;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;
    use tr_protocol::{PipelineService, ProcessRequest};

    struct Harness {
        ops_tx: Sender<Op>,
        events_rx: Receiver<Event>,
        loop_handle: JoinHandle<()>,
    }

    fn start(gateway: ScriptedGateway) -> Harness {
        let (ops_tx, ops_rx) = mpsc::channel(16);
        let (events_tx, events_rx) = mpsc::channel(64);
        let history = Arc::new(Mutex::new(RunHistoryStore::load(MemoryPort::new())));
        let loop_handle = tokio::spawn(core_loop(ops_rx, events_tx, Arc::new(gateway), history));
        Harness {
            ops_tx,
            events_rx,
            loop_handle,
        }
    }

    async fn next_matching<F>(rx: &mut Receiver<Event>, mut predicate: F) -> Event
    where
        F: FnMut(&Event) -> bool,
    {
        timeout(Duration::from_secs(5), async {
            loop {
                let event = rx.recv().await.expect("event channel closed");
                if predicate(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    #[tokio::test]
    async fn test_initial_history_snapshot() {
        let mut harness = start(ScriptedGateway::new(vec![]));
        let event = harness.events_rx.recv().await.unwrap();
        assert!(matches!(event, Event::HistoryChanged { runs } if runs.is_empty()));
    }

    #[tokio::test]
    async fn test_reload_with_empty_pipeline_uses_defaults() {
        let mut harness = start(ScriptedGateway::new(vec![]));
        harness.ops_tx.send(Op::ReloadPipeline).await.unwrap();

        let event = next_matching(&mut harness.events_rx, |e| {
            matches!(e, Event::PipelineLoaded { .. })
        })
        .await;
        let Event::PipelineLoaded { services } = event else {
            unreachable!();
        };
        assert_eq!(services.len(), 4);
    }

    #[tokio::test]
    async fn test_save_pipeline_validation_failure() {
        let mut harness = start(ScriptedGateway::new(vec![]));
        harness
            .ops_tx
            .send(Op::SavePipeline {
                services: vec![PipelineService {
                    name: "validator".to_string(),
                    ..Default::default()
                }],
            })
            .await
            .unwrap();

        let event = next_matching(&mut harness.events_rx, |e| {
            matches!(e, Event::Failure { .. })
        })
        .await;
        assert!(
            matches!(event, Event::Failure { message } if message == "Every service must have a name and URL.")
        );
    }

    #[tokio::test]
    async fn test_submit_runs_and_updates_history() {
        let gateway = ScriptedGateway::new(vec![]).with_stream([
            "event: started\ndata: {\"trace_id\":\"t1\"}\n\n",
            "event: done\ndata: {\"trace_id\":\"t1\"}\n\n",
        ]);
        let mut harness = start(gateway);
        harness
            .ops_tx
            .send(Op::Submit {
                request: ProcessRequest::text("hi"),
            })
            .await
            .unwrap();

        let event = next_matching(&mut harness.events_rx, |e| {
            matches!(e, Event::HistoryChanged { runs } if !runs.is_empty())
        })
        .await;
        let Event::HistoryChanged { runs } = event else {
            unreachable!();
        };
        assert_eq!(runs[0].trace_id, "t1");

        next_matching(&mut harness.events_rx, |e| {
            matches!(e, Event::RunFinished { .. })
        })
        .await;

        harness.ops_tx.send(Op::ClearHistory).await.unwrap();
        next_matching(&mut harness.events_rx, |e| {
            matches!(e, Event::HistoryChanged { runs } if runs.is_empty())
        })
        .await;

        harness.ops_tx.send(Op::Shutdown).await.unwrap();
        harness.loop_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_export_then_import_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports/history.json");
        let gateway = ScriptedGateway::new(vec![]).with_stream([
            "event: started\ndata: {\"trace_id\":\"t1\"}\n\nevent: done\ndata: {\"trace_id\":\"t1\"}\n\n",
        ]);
        let mut harness = start(gateway);
        harness
            .ops_tx
            .send(Op::Submit {
                request: ProcessRequest::text("hi"),
            })
            .await
            .unwrap();
        next_matching(&mut harness.events_rx, |e| {
            matches!(e, Event::RunFinished { .. })
        })
        .await;

        harness
            .ops_tx
            .send(Op::ExportHistory { path: path.clone() })
            .await
            .unwrap();
        let event = next_matching(&mut harness.events_rx, |e| {
            matches!(e, Event::Notice { .. })
        })
        .await;
        assert!(matches!(event, Event::Notice { message } if message.starts_with("Exported 1 run(s)")));

        harness
            .ops_tx
            .send(Op::ImportHistory { path })
            .await
            .unwrap();
        let event = next_matching(&mut harness.events_rx, |e| {
            matches!(e, Event::Notice { .. })
        })
        .await;
        assert!(matches!(event, Event::Notice { message } if message == "Imported 1 run(s)."));

        let event = next_matching(&mut harness.events_rx, |e| {
            matches!(e, Event::HistoryChanged { .. })
        })
        .await;
        assert!(matches!(event, Event::HistoryChanged { runs } if runs.len() == 2));
    }
}
