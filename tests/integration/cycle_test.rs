#![allow(clippy::expect_used)]

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use roomguard::application::services::evaluator::{Evaluator, EvaluatorSettings};
use roomguard::domain::detectors::DetectorEngine;
use roomguard::domain::entities::alert::{AlertEvent, EventKind};
use roomguard::domain::entities::condition::Condition;
use roomguard::domain::entities::reading::{Reading, SensorField};
use roomguard::domain::ports::sink::{AlertSink, EmissionError};
use roomguard::infrastructure::sinks::composite::CompositeSink;
use roomguard::infrastructure::sinks::log_file::LogFileSink;
use roomguard::infrastructure::sources::replay_file::ReplayFileSource;

fn fixture_path(name: &str) -> String {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .display()
        .to_string()
}

#[derive(Default)]
struct TrackingSink {
    events: Mutex<Vec<AlertEvent>>,
    live: Mutex<Vec<Vec<Reading>>>,
}

#[async_trait]
impl AlertSink for TrackingSink {
    async fn emit(&self, event: &AlertEvent) -> Result<(), EmissionError> {
        self.events.lock().expect("lock").push(event.clone());
        Ok(())
    }

    async fn publish_live_status(&self, latest: &[Reading]) -> Result<(), EmissionError> {
        self.live.lock().expect("lock").push(latest.to_vec());
        Ok(())
    }
}

struct SlowSink;

#[async_trait]
impl AlertSink for SlowSink {
    async fn emit(&self, _event: &AlertEvent) -> Result<(), EmissionError> {
        tokio::time::sleep(StdDuration::from_secs(5)).await;
        Ok(())
    }
}

#[tokio::test]
async fn replayed_building_raises_one_event_per_problem() {
    let source = ReplayFileSource::new(&fixture_path("building.jsonl"), true);
    let sink = TrackingSink::default();
    let engine = DetectorEngine::default();
    let mut evaluator = Evaluator::new(&source, &sink, &engine, EvaluatorSettings::default());

    let report = evaluator.run_once().await;
    assert_eq!(report.readings_accepted, 5);
    assert_eq!(report.readings_rejected, 1);
    assert_eq!(report.rooms_evaluated, 5);
    assert!(report.fetch_error.is_none());

    let mut raised: Vec<(String, Condition)> = report
        .events
        .iter()
        .filter(|e| e.kind == EventKind::Raise)
        .map(|e| (e.room.clone(), e.condition))
        .collect();
    raised.sort();
    assert_eq!(
        raised,
        vec![
            ("013C".to_string(), Condition::PoorLighting),
            ("101".to_string(), Condition::EnergyWastage),
            ("303".to_string(), Condition::FireHazard),
            ("LAB1".to_string(), Condition::GasLeak),
        ]
    );
    assert_eq!(sink.events.lock().expect("lock").len(), 4);
}

#[tokio::test]
async fn old_recording_without_rebase_falls_outside_window() {
    let source = ReplayFileSource::new(&fixture_path("building.jsonl"), false);
    let sink = TrackingSink::default();
    let engine = DetectorEngine::default();
    let mut evaluator = Evaluator::new(&source, &sink, &engine, EvaluatorSettings::default());

    // recorded in 2026-03, far outside the retention window without rebasing
    let report = evaluator.run_once().await;
    assert_eq!(report.readings_accepted, 0);
    assert!(report.events.is_empty());
}

#[tokio::test]
async fn stuck_sensor_raises_then_resolves_when_value_moves() {
    let mut file = tempfile::NamedTempFile::new().expect("create tempfile");
    let start = Utc::now() - Duration::seconds(120);
    for i in 0..10 {
        let ts = start + Duration::seconds(10 * i);
        writeln!(
            file,
            r#"{{"room": "101", "timestamp": "{}", "temperature": 25.0}}"#,
            ts.to_rfc3339()
        )
        .expect("write");
    }
    file.flush().expect("flush");

    let path = file.path().display().to_string();
    let source = ReplayFileSource::new(&path, false);
    let sink = TrackingSink::default();
    let engine = DetectorEngine::default();
    let mut evaluator = Evaluator::new(&source, &sink, &engine, EvaluatorSettings::default());

    let first = evaluator.run_once().await;
    assert_eq!(first.readings_accepted, 10);
    assert_eq!(first.events.len(), 1);
    assert_eq!(first.events[0].kind, EventKind::Raise);
    assert_eq!(
        first.events[0].condition,
        Condition::StuckSensor(SensorField::Temperature)
    );

    writeln!(
        file,
        r#"{{"room": "101", "timestamp": "{}", "temperature": 25.3}}"#,
        (Utc::now() - Duration::seconds(1)).to_rfc3339()
    )
    .expect("write");
    file.flush().expect("flush");

    let second = evaluator.run_once().await;
    // the ten earlier rows are already in the window
    assert_eq!(second.readings_accepted, 1);
    assert_eq!(second.readings_duplicate, 10);
    assert_eq!(second.events.len(), 1);
    assert_eq!(second.events[0].kind, EventKind::Resolve);
    assert!(evaluator.lifecycle().is_empty());
}

#[tokio::test]
async fn missing_source_file_keeps_cycle_alive() {
    let source = ReplayFileSource::new("/nonexistent/roomguard/readings.jsonl", true);
    let sink = TrackingSink::default();
    let engine = DetectorEngine::default();
    let mut evaluator = Evaluator::new(&source, &sink, &engine, EvaluatorSettings::default());

    let report = evaluator.run_once().await;
    assert!(report.fetch_error.is_some());
    assert!(report.events.is_empty());
}

#[tokio::test]
async fn slow_sink_times_out_without_blocking_cycle() {
    let source = ReplayFileSource::new(&fixture_path("building.jsonl"), true);
    let engine = DetectorEngine::default();
    let settings = EvaluatorSettings {
        emit_timeout: StdDuration::from_millis(50),
        ..EvaluatorSettings::default()
    };
    let mut evaluator = Evaluator::new(&source, &SlowSink, &engine, settings);

    let started = std::time::Instant::now();
    let report = evaluator.run_once().await;
    assert_eq!(report.events.len(), 4);
    assert_eq!(report.emission_failures, 4);
    assert_eq!(report.events_emitted(), 0);
    assert!(started.elapsed() < StdDuration::from_secs(2));
}

#[tokio::test]
async fn live_status_carries_latest_reading_per_room() {
    let source = ReplayFileSource::new(&fixture_path("building.jsonl"), true);
    let sink = TrackingSink::default();
    let engine = DetectorEngine::default();
    let settings = EvaluatorSettings {
        broadcast_live_status: true,
        ..EvaluatorSettings::default()
    };
    let mut evaluator = Evaluator::new(&source, &sink, &engine, settings);

    evaluator.run_once().await;
    let live = sink.live.lock().expect("lock");
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].len(), 5);
}

#[tokio::test]
async fn events_reach_every_composite_child() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let log_path = dir.path().join("alerts.jsonl");
    let log_path_str = log_path.display().to_string();

    let source = ReplayFileSource::new(&fixture_path("building.jsonl"), true);
    let sink = CompositeSink::new(vec![Box::new(LogFileSink::new(&log_path_str))]);
    let engine = DetectorEngine::default();
    let mut evaluator = Evaluator::new(&source, &sink, &engine, EvaluatorSettings::default());

    let report = evaluator.run_once().await;
    assert_eq!(report.emission_failures, 0);

    let content = std::fs::read_to_string(&log_path).expect("read log");
    let logged: Vec<AlertEvent> = content
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid event line"))
        .collect();
    assert_eq!(logged.len(), 4);
    assert!(logged.iter().all(|e| e.kind == EventKind::Raise));
}
