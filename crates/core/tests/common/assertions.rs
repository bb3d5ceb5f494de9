//! Custom assertion helpers for E2E tests.

use tr_protocol::ipc::Event;

/// Names of the progress events in `events`, in order.
#[allow(dead_code)]
pub fn progress_names(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Progress { event, .. } => Some(event.name().to_string()),
            _ => None,
        })
        .collect()
}

/// Assert that events follow the run lifecycle.
///
/// Checks that:
/// 1. RunStarted comes before any progress event
/// 2. RunFinished comes last
#[allow(dead_code)]
pub fn assert_run_lifecycle(events: &[Event]) {
    let started = events
        .iter()
        .position(|e| matches!(e, Event::RunStarted { .. }))
        .expect("RunStarted missing");
    let first_progress = events
        .iter()
        .position(|e| matches!(e, Event::Progress { .. }));
    if let Some(first_progress) = first_progress {
        assert!(started < first_progress, "progress before RunStarted");
    }
    assert!(
        matches!(events.last(), Some(Event::RunFinished { .. })),
        "RunFinished must be the last event"
    );
}

/// Drain every event already buffered in `rx`.
#[allow(dead_code)]
pub fn drain(rx: &mut tokio::sync::mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
