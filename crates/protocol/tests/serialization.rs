use serde_json::json;
use tr_protocol::*;

#[test]
fn test_pipeline_deserialization_from_yaml() {
    let yaml_str = r#"
services:
  - name: validator
    url: http://validator:8001
    icon: "✓"
    input_type: json
    output_type: json
  - name: persister
    url: http://persister:8004
"#;

    let pipeline: PipelineResponse =
        serde_yaml::from_str(yaml_str).expect("Failed to deserialize PipelineResponse");

    assert_eq!(pipeline.services.len(), 2);
    assert_eq!(pipeline.services[0].icon, "✓");
    assert_eq!(pipeline.services[1].input_type, "");

    let stages = Stage::sequence_for(&pipeline.services);
    let ids: Vec<_> = stages.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["gateway", "validator", "persister"]);
}

#[test]
fn test_client_config_from_partial_toml() {
    let config: ClientConfig =
        toml::from_str("stations_per_row = 3").expect("Failed to deserialize ClientConfig");
    assert_eq!(config.stations_per_row, 3);
    assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
    assert_eq!(
        config.trace_link("abc"),
        format!("{DEFAULT_TRACE_VIEWER_URL}/trace/abc")
    );
}

#[test]
fn test_progress_event_from_gateway_frames() {
    let started = ProgressEvent::from_frame("started", json!({"trace_id": "t1", "payload": {"text": "hi"}}));
    assert_eq!(
        started,
        ProgressEvent::Started(StartedData {
            trace_id: "t1".to_string(),
            payload: json!({"text": "hi"}),
        })
    );

    let done = ProgressEvent::from_frame(
        "done",
        json!({"trace_id": "t1", "result": {}, "payload": {"type": "text", "data": "hi"}, "steps": [], "stored": null}),
    );
    let ProgressEvent::Done(done) = done else {
        panic!("expected done");
    };
    assert!(done.has_result());
    assert_eq!(done.steps, Some(vec![]));
    assert!(ProgressEvent::Done(done).is_terminal());
}

#[test]
fn test_ipc_event_serialization() {
    let run_id = uuid::Uuid::new_v4();
    let event = Event::Progress {
        run_id,
        event: ProgressEvent::Step(StepData {
            service: "validator".to_string(),
            input: Some(json!("a")),
            output: Some(json!("b")),
            status: Some("ok".to_string()),
            payload_type: Some("text".to_string()),
        }),
    };

    let value = serde_json::to_value(&event).expect("Failed to serialize Event");
    assert_eq!(value["type"], "progress");
    assert_eq!(value["payload"]["run_id"], json!(run_id.to_string()));
    assert_eq!(value["payload"]["event"]["event"], "step");
    assert_eq!(value["payload"]["event"]["data"]["service"], "validator");

    let back: Event = serde_json::from_value(value).expect("Failed to deserialize Event");
    assert!(matches!(back, Event::Progress { run_id: id, .. } if id == run_id));
}

#[test]
fn test_ipc_op_serialization() {
    let op = Op::Submit {
        request: ProcessRequest::typed(PayloadType::Json, "{\"a\":1}"),
    };
    let value = serde_json::to_value(&op).expect("Failed to serialize Op");
    assert_eq!(
        value,
        json!({
            "type": "submit",
            "payload": {"request": {"type": "json", "data": "{\"a\":1}", "metadata": {}}}
        })
    );

    let clear: Op = serde_json::from_value(json!({"type": "clearHistory"})).expect("unit op");
    assert!(matches!(clear, Op::ClearHistory));
}

#[test]
fn test_history_export_document_shape() {
    let export = HistoryExport {
        version: HISTORY_EXPORT_VERSION,
        exported_at: chrono::DateTime::from_timestamp_millis(1_700_000_000_000).expect("timestamp"),
        runs: vec![RunRecord::new("t1", 1_700_000_000_000, RunStatus::Ok, 4, 812, None)],
    };
    let value = serde_json::to_value(&export).expect("Failed to serialize HistoryExport");

    assert_eq!(value["version"], 1);
    assert!(value["exportedAt"].as_str().is_some_and(|s| s.starts_with("2023-11-14T")));
    assert_eq!(value["runs"][0]["traceId"], "t1");
    assert!(RunRecord::is_valid_value(&value["runs"][0]));
}
