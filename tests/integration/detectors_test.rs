#![allow(clippy::expect_used)]

use chrono::{Duration, Utc};
use roomguard::domain::detectors::DetectorEngine;
use roomguard::domain::entities::condition::Condition;
use roomguard::domain::entities::reading::{RawReading, Reading, SensorField};
use roomguard::domain::entities::window::Window;
use roomguard::domain::value_objects::severity::Severity;
use roomguard::domain::value_objects::thresholds::DetectorThresholds;

fn load_fixture(name: &str) -> Vec<Reading> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let content = std::fs::read_to_string(&path).expect("Failed to read fixture");
    content
        .lines()
        .filter_map(|line| serde_json::from_str::<RawReading>(line).ok())
        .filter_map(|raw| Reading::try_from(raw).ok())
        .collect()
}

fn window_for(readings: &[Reading], room: &str) -> Window {
    Window::new(
        room,
        readings.iter().filter(|r| r.room == room).cloned().collect(),
    )
}

fn analyze(window: &Window) -> Vec<(Condition, Severity)> {
    DetectorEngine::default()
        .analyze(window, &DetectorThresholds::default())
        .into_iter()
        .map(|hit| (hit.condition, hit.severity))
        .collect()
}

#[test]
fn building_fixture_flags_each_problem_room() {
    let readings = load_fixture("building.jsonl");
    // the truncated line and the untimed reading never make it in
    assert_eq!(readings.len(), 5);

    assert_eq!(
        analyze(&window_for(&readings, "101")),
        vec![(Condition::EnergyWastage, Severity::High)]
    );
    assert!(analyze(&window_for(&readings, "202")).is_empty());
    assert_eq!(
        analyze(&window_for(&readings, "LAB1")),
        vec![(Condition::GasLeak, Severity::Critical)]
    );
    assert_eq!(
        analyze(&window_for(&readings, "013C")),
        vec![(Condition::PoorLighting, Severity::Low)]
    );
    assert_eq!(
        analyze(&window_for(&readings, "303")),
        vec![(Condition::FireHazard, Severity::Critical)]
    );
}

#[test]
fn numeric_room_ids_become_strings() {
    let readings = load_fixture("building.jsonl");
    assert!(readings.iter().any(|r| r.room == "202"));
}

#[test]
fn stuck_temperature_fixture_raises_only_temperature() {
    let readings = load_fixture("stuck_temperature.jsonl");
    assert_eq!(readings.len(), 10);
    let hits = analyze(&window_for(&readings, "101"));
    assert_eq!(
        hits,
        vec![(Condition::StuckSensor(SensorField::Temperature), Severity::High)]
    );
}

#[test]
fn stuck_temperature_clears_after_one_changed_value() {
    let mut readings = load_fixture("stuck_temperature.jsonl");
    let last = readings.last_mut().expect("fixture not empty");
    last.temperature = Some(25.3);
    assert!(analyze(&window_for(&readings, "101")).is_empty());
}

#[test]
fn dying_equipment_fixture_is_critical() {
    let readings = load_fixture("dying_equipment.jsonl");
    let hits = analyze(&window_for(&readings, "LAB2"));
    assert_eq!(hits, vec![(Condition::DyingEquipment, Severity::Critical)]);
}

#[test]
fn falling_power_is_not_dying_equipment() {
    let mut readings = load_fixture("dying_equipment.jsonl");
    let powers: Vec<f64> = readings.iter().rev().filter_map(|r| r.power).collect();
    for (reading, power) in readings.iter_mut().zip(powers) {
        reading.power = Some(power);
    }
    assert!(analyze(&window_for(&readings, "LAB2")).is_empty());
}

#[test]
fn simultaneous_hazards_are_reported_together() {
    let now = Utc::now();
    let window = Window::new(
        "LAB3",
        vec![
            Reading::new("LAB3", now - Duration::seconds(10)).with(SensorField::Gas, 900.0),
            Reading::new("LAB3", now)
                .with(SensorField::Temperature, 70.0)
                .with(SensorField::Occupancy, 0.0)
                .with(SensorField::Power, 2200.0),
        ],
    );
    let hits = analyze(&window);
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].1, Severity::Critical);
    assert_eq!(hits[1].1, Severity::Critical);
    assert!(hits.contains(&(Condition::FireHazard, Severity::Critical)));
    assert!(hits.contains(&(Condition::GasLeak, Severity::Critical)));
    assert_eq!(hits[2], (Condition::EnergyWastage, Severity::High));
}

#[test]
fn empty_window_has_no_hits() {
    assert!(analyze(&Window::empty("101")).is_empty());
}
