//! Run state machine.
//!
//! [`RunState`] is the single source of truth for the active run. Progress
//! events are applied in arrival order, and views project the state without
//! keeping any synchronization logic of their own.

use tr_protocol::{
    DoneData, ErrorData, PayloadType, PipelineService, ProcessRequest, ProgressEvent, Stage,
    StageStatus, StepData, DEFAULT_STATIONS_PER_ROW,
};
use tracing::debug;

use super::preview::Preview;
use super::result::RunResult;
use crate::layout::{PathPoint, TrackLayout};

/// One stage of the active run, as a view sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct StageView {
    pub stage: Stage,
    pub status: StageStatus,
    pub input: Preview,
    pub output: Preview,
}

impl StageView {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Idle,
            input: Preview::Empty,
            output: Preview::Empty,
        }
    }

    /// Apply a status change, refusing to re-enter `Processing` from a
    /// terminal status.
    fn set_status(&mut self, status: StageStatus) {
        if status == StageStatus::Processing && self.status.is_terminal() {
            debug!(stage = %self.stage.id, from = ?self.status, "ignoring transition back to processing");
            return;
        }
        self.status = status;
    }
}

/// State of the active run over a configured stage sequence.
#[derive(Debug, Clone)]
pub struct RunState {
    stages: Vec<StageView>,
    layout: TrackLayout,
    position: Option<usize>,
    trace_id: Option<String>,
    message: Option<String>,
    result: Option<RunResult>,
    completed: bool,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new(&[], DEFAULT_STATIONS_PER_ROW)
    }
}

impl RunState {
    /// Create a state for `services`, with the gateway stage prepended.
    pub fn new(services: &[PipelineService], row_width: usize) -> Self {
        let stages: Vec<StageView> = Stage::sequence_for(services)
            .into_iter()
            .map(StageView::new)
            .collect();
        let layout = TrackLayout::new(stages.len(), row_width);
        Self {
            stages,
            layout,
            position: None,
            trace_id: None,
            message: None,
            result: None,
            completed: false,
        }
    }

    /// Replace the stage sequence. Leaves the state reset.
    pub fn configure(&mut self, services: &[PipelineService]) {
        *self = Self::new(services, self.layout.row_width());
    }

    /// Return every stage to idle and forget the previous run.
    pub fn reset(&mut self) {
        for view in &mut self.stages {
            view.status = StageStatus::Idle;
            view.input = Preview::Empty;
            view.output = Preview::Empty;
        }
        self.position = None;
        self.trace_id = None;
        self.message = None;
        self.result = None;
        self.completed = false;
    }

    /// The submission was accepted; the gateway hop is synchronous from the
    /// client's side, so it completes immediately and the first configured
    /// stage starts processing.
    pub fn on_submitted_locally(&mut self, request: &ProcessRequest) {
        if self.completed || self.stages.is_empty() {
            return;
        }
        self.set_status(0, StageStatus::Processing);
        self.position = Some(0);

        if let Some(gateway) = self.stages.first_mut() {
            gateway.output = Preview::of(Some(request.preview_value()), request.payload_type());
        }
        self.set_status(0, StageStatus::Done);
        self.advance_past(0);
    }

    /// Record the trace id of the run.
    pub fn on_started(&mut self, trace_id: &str) {
        if self.completed {
            return;
        }
        if !trace_id.is_empty() {
            self.trace_id = Some(trace_id.to_string());
        }
    }

    /// A stage finished. Unknown stages are ignored.
    pub fn on_step(&mut self, step: &StepData) {
        if self.completed {
            return;
        }
        let Some(index) = self.index_of(&step.service) else {
            debug!(service = %step.service, "step for unknown stage");
            return;
        };
        let payload_type = step.payload_type();
        self.set_status(index, StageStatus::Done);
        if let Some(view) = self.stages.get_mut(index) {
            view.input = Preview::of(step.input_text().as_deref(), payload_type);
            view.output = Preview::of(step.output_text().as_deref(), payload_type);
        }
        self.advance_past(index);
    }

    /// A stage failed. The run keeps accepting events.
    pub fn on_error(&mut self, error: &ErrorData) {
        if self.completed {
            return;
        }
        let service = non_blank(&error.service).unwrap_or("Service");
        let text = non_blank(&error.error);
        self.message = Some(format!("{service}: {}", text.unwrap_or("error")));

        let Some(index) = self.index_of(&error.service) else {
            debug!(service = %error.service, "error for unknown stage");
            return;
        };
        self.set_status(index, StageStatus::Error);
        if let Some(view) = self.stages.get_mut(index) {
            view.input = Preview::Empty;
            view.output = Preview::of(Some(text.unwrap_or("Error")), PayloadType::Text);
        }
    }

    /// The run finished. Parks the marker past the end and marks the last
    /// stage done if the run reached it.
    pub fn on_done(&mut self, done: &DoneData) {
        if self.completed {
            return;
        }
        self.position = Some(self.stages.len());
        if let Some(last) = self.stages.last_mut() {
            if last.status != StageStatus::Idle {
                last.set_status(StageStatus::Done);
            }
        }
        if !done.trace_id.is_empty() {
            self.trace_id = Some(done.trace_id.clone());
        }
        self.result = RunResult::from_done(done);
        self.completed = true;
    }

    /// Apply one progress event.
    pub fn apply(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started(started) => self.on_started(&started.trace_id),
            ProgressEvent::Step(step) => self.on_step(step),
            ProgressEvent::Error(error) => self.on_error(error),
            ProgressEvent::Done(done) => self.on_done(done),
            ProgressEvent::Other { name, .. } => debug!(event = %name, "ignoring event"),
        }
    }

    /// Surface a run-level message that did not come from a stage.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn stages(&self) -> &[StageView] {
        &self.stages
    }

    pub fn stage(&self, index: usize) -> Option<&StageView> {
        self.stages.get(index)
    }

    pub fn status_of(&self, stage_id: &str) -> Option<StageStatus> {
        self.stage_by_id(stage_id).map(|view| view.status)
    }

    /// Stage matching `stage_id`, compared case-insensitively.
    pub fn stage_by_id(&self, stage_id: &str) -> Option<&StageView> {
        self.index_of(stage_id).and_then(|index| self.stages.get(index))
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn result(&self) -> Option<&RunResult> {
        self.result.as_ref()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn layout(&self) -> &TrackLayout {
        &self.layout
    }

    /// Index of the stage the marker sits on, clamped to the track.
    pub fn marker(&self) -> Option<usize> {
        let position = self.position?;
        let last = self.stages.len().checked_sub(1)?;
        Some(position.min(last))
    }

    /// Normalized track coordinate of the marker.
    pub fn marker_point(&self) -> Option<PathPoint> {
        self.layout.point_of(self.position?)
    }

    fn index_of(&self, stage_id: &str) -> Option<usize> {
        let id = stage_id.trim().to_lowercase();
        self.stages.iter().position(|view| view.stage.id == id)
    }

    fn set_status(&mut self, index: usize, status: StageStatus) {
        if let Some(view) = self.stages.get_mut(index) {
            view.set_status(status);
        }
    }

    /// Move the marker to the stage after `index`, or past the end.
    fn advance_past(&mut self, index: usize) {
        let next = index + 1;
        if next < self.stages.len() {
            self.set_status(next, StageStatus::Processing);
        }
        self.position = Some(next.min(self.stages.len()));
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn services(names: &[&str]) -> Vec<PipelineService> {
        names
            .iter()
            .map(|name| PipelineService {
                name: name.to_string(),
                url: format!("http://{name}:8000"),
                ..Default::default()
            })
            .collect()
    }

    fn pipeline() -> RunState {
        RunState::new(
            &services(&["validator", "transformer", "enricher", "persister"]),
            5,
        )
    }

    fn step(service: &str) -> ProgressEvent {
        ProgressEvent::from_frame(
            "step",
            json!({"service": service, "input": "in", "output": "out", "status": "ok"}),
        )
    }

    #[test]
    fn test_new_state_is_reset() {
        let state = pipeline();
        assert_eq!(state.stages().len(), 5);
        assert!(state.stages()[0].stage.is_gateway());
        assert!(state
            .stages()
            .iter()
            .all(|view| view.status == StageStatus::Idle));
        assert_eq!(state.position(), None);
        assert_eq!(state.marker(), None);
    }

    #[test]
    fn test_submitted_locally_completes_gateway() {
        let mut state = pipeline();
        state.on_submitted_locally(&ProcessRequest::text("hello"));

        assert_eq!(state.status_of("gateway"), Some(StageStatus::Done));
        assert_eq!(state.status_of("validator"), Some(StageStatus::Processing));
        assert_eq!(state.position(), Some(1));
        assert_eq!(state.stages()[0].output, Preview::Text("hello".to_string()));
    }

    #[test]
    fn test_step_with_structured_output_advances() {
        let mut state = pipeline();
        state.on_submitted_locally(&ProcessRequest::text("hello"));
        state.apply(&ProgressEvent::from_frame(
            "step",
            json!({"service": "validator", "output": {"ok": true}, "payload_type": "json"}),
        ));

        assert_eq!(state.status_of("validator"), Some(StageStatus::Done));
        assert_eq!(state.status_of("transformer"), Some(StageStatus::Processing));
        assert_eq!(state.position(), Some(2));
        let output = state.stage_by_id("validator").unwrap().output.to_string();
        assert!(output.contains("\"ok\": true"), "{output}");
    }

    #[test]
    fn test_submitted_locally_without_services_parks_at_end() {
        let mut state = RunState::new(&[], 5);
        state.on_submitted_locally(&ProcessRequest::text("x"));
        assert_eq!(state.position(), Some(1));
        assert_eq!(state.marker(), Some(0));
    }

    #[test]
    fn test_step_advances_to_next_stage() {
        let mut state = pipeline();
        state.on_submitted_locally(&ProcessRequest::text("hello"));
        state.apply(&step("Validator"));

        assert_eq!(state.status_of("validator"), Some(StageStatus::Done));
        assert_eq!(state.status_of("transformer"), Some(StageStatus::Processing));
        assert_eq!(state.position(), Some(2));
        assert_eq!(state.stages()[1].input, Preview::Text("in".to_string()));
    }

    #[test]
    fn test_step_for_last_stage_parks_past_end() {
        let mut state = pipeline();
        state.apply(&step("persister"));
        assert_eq!(state.position(), Some(5));
        assert_eq!(state.marker(), Some(4));
    }

    #[test]
    fn test_unknown_step_is_noop() {
        let mut state = pipeline();
        state.on_submitted_locally(&ProcessRequest::text("hello"));
        let before = state.stages().to_vec();
        state.apply(&step("nonexistent"));
        assert_eq!(state.stages(), before.as_slice());
        assert_eq!(state.position(), Some(1));
    }

    #[test]
    fn test_error_marks_stage_without_advancing() {
        let mut state = pipeline();
        state.on_submitted_locally(&ProcessRequest::text("hello"));
        state.apply(&ProgressEvent::from_frame(
            "error",
            json!({"service": "Validator", "error": "bad input"}),
        ));

        assert_eq!(state.status_of("validator"), Some(StageStatus::Error));
        assert_eq!(state.position(), Some(1));
        assert_eq!(state.message(), Some("Validator: bad input"));
        assert_eq!(state.stages()[1].output, Preview::Text("bad input".to_string()));
    }

    #[test]
    fn test_error_for_unknown_stage_still_surfaces_message() {
        let mut state = pipeline();
        state.apply(&ProgressEvent::from_frame("error", json!({})));
        assert_eq!(state.message(), Some("Service: error"));
    }

    #[test]
    fn test_terminal_stage_never_reenters_processing() {
        let mut state = pipeline();
        state.apply(&ProgressEvent::from_frame(
            "error",
            json!({"service": "transformer", "error": "x"}),
        ));
        state.apply(&step("validator"));
        assert_eq!(state.status_of("transformer"), Some(StageStatus::Error));
    }

    #[test]
    fn test_error_run_scenario() {
        let mut state = pipeline();
        state.reset();
        state.on_submitted_locally(&ProcessRequest::text("payload"));
        for event in [
            ProgressEvent::from_frame("started", json!({"trace_id": "abc123", "payload": {}})),
            step("validator"),
            step("transformer"),
            ProgressEvent::from_frame("error", json!({"service": "enricher", "error": "timeout"})),
            ProgressEvent::from_frame("done", json!({"trace_id": "abc123"})),
        ] {
            state.apply(&event);
        }

        assert_eq!(state.status_of("enricher"), Some(StageStatus::Error));
        assert_eq!(state.status_of("persister"), Some(StageStatus::Idle));
        assert_eq!(state.position(), Some(5));
        assert_eq!(state.trace_id(), Some("abc123"));
        assert!(state.is_completed());
        assert!(state.result().is_none());
    }

    #[test]
    fn test_done_marks_reached_last_stage_done() {
        let mut state = pipeline();
        state.on_submitted_locally(&ProcessRequest::text("payload"));
        for service in ["validator", "transformer", "enricher"] {
            state.apply(&step(service));
        }
        assert_eq!(state.status_of("persister"), Some(StageStatus::Processing));

        state.apply(&ProgressEvent::from_frame(
            "done",
            json!({"trace_id": "t", "payload": {"type": "text", "data": "ok"}}),
        ));
        assert_eq!(state.status_of("persister"), Some(StageStatus::Done));
        assert_eq!(state.result().map(RunResult::render), Some("ok".to_string()));
    }

    #[test]
    fn test_done_overrides_last_stage_error() {
        let mut state = pipeline();
        state.apply(&ProgressEvent::from_frame(
            "error",
            json!({"service": "persister", "error": "disk full"}),
        ));
        state.apply(&ProgressEvent::from_frame("done", json!({"trace_id": "t"})));
        assert_eq!(state.status_of("persister"), Some(StageStatus::Done));
    }

    #[test]
    fn test_events_after_done_are_ignored() {
        let mut state = pipeline();
        state.apply(&ProgressEvent::from_frame("done", json!({"trace_id": "t"})));
        state.apply(&step("validator"));
        state.apply(&ProgressEvent::from_frame("started", json!({"trace_id": "other"})));
        assert_eq!(state.status_of("validator"), Some(StageStatus::Idle));
        assert_eq!(state.trace_id(), Some("t"));
    }

    #[test]
    fn test_reset_clears_previous_run() {
        let mut state = pipeline();
        state.on_submitted_locally(&ProcessRequest::text("payload"));
        state.apply(&ProgressEvent::from_frame("done", json!({"trace_id": "t", "steps": []})));
        state.reset();

        assert_eq!(state.position(), None);
        assert_eq!(state.trace_id(), None);
        assert!(state.result().is_none());
        assert!(!state.is_completed());
        assert!(state.stages().iter().all(|v| v.output.is_empty()));
    }

    #[test]
    fn test_marker_point_follows_layout() {
        let mut state = pipeline();
        state.on_submitted_locally(&ProcessRequest::text("payload"));
        let point = state.marker_point().unwrap();
        assert_eq!(point.x, 30.0);
        assert_eq!(point.y, 50.0);
    }
}
