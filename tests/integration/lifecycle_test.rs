#![allow(clippy::expect_used)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use roomguard::application::services::lifecycle::AlertLifecycle;
use roomguard::domain::detectors::ConditionHit;
use roomguard::domain::entities::alert::{AlertEvent, EventKind};
use roomguard::domain::entities::condition::{Condition, ConditionKey};
use roomguard::domain::value_objects::lifecycle_policy::LifecyclePolicy;
use roomguard::domain::value_objects::severity::Severity;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("valid date")
}

fn hit(condition: Condition, severity: Severity) -> ConditionHit {
    ConditionHit::new(condition, severity, format!("{condition} detected"))
}

fn kinds(events: &[AlertEvent]) -> Vec<(EventKind, Condition, Severity)> {
    events
        .iter()
        .map(|e| (e.kind, e.condition, e.severity))
        .collect()
}

/// Drives one room through a sequence of per-minute hit sets.
fn drive(
    lifecycle: &mut AlertLifecycle,
    room: &str,
    steps: &[Vec<ConditionHit>],
) -> Vec<AlertEvent> {
    steps
        .iter()
        .enumerate()
        .flat_map(|(minute, hits)| {
            let now = t0() + Duration::minutes(i64::try_from(minute).expect("small"));
            lifecycle.evaluate_room(room, hits, now)
        })
        .collect()
}

#[test]
fn repeated_hits_within_cooldown_raise_once() {
    let mut lifecycle = AlertLifecycle::default();
    let wastage = vec![hit(Condition::EnergyWastage, Severity::High)];
    let events = drive(&mut lifecycle, "101", &vec![wastage; 5]);
    assert_eq!(
        kinds(&events),
        vec![(EventKind::Raise, Condition::EnergyWastage, Severity::High)]
    );
}

#[test]
fn severity_never_decreases_while_active() {
    let mut lifecycle = AlertLifecycle::default();
    let steps = vec![
        vec![hit(Condition::GasLeak, Severity::Medium)],
        vec![hit(Condition::GasLeak, Severity::Critical)],
        vec![hit(Condition::GasLeak, Severity::Low)],
        vec![hit(Condition::GasLeak, Severity::Medium)],
    ];
    let events = drive(&mut lifecycle, "LAB1", &steps);
    let severities: Vec<Severity> = events.iter().map(|e| e.severity).collect();
    assert_eq!(severities, vec![Severity::Medium, Severity::Critical]);

    let state = lifecycle
        .state(&ConditionKey::new("LAB1", Condition::GasLeak))
        .expect("still active");
    assert_eq!(state.current_severity, Severity::Critical);
}

#[test]
fn raise_resolve_alternate_per_key() {
    let mut lifecycle = AlertLifecycle::default();
    let on = vec![hit(Condition::PoorLighting, Severity::Low)];
    let off: Vec<ConditionHit> = vec![];
    let steps = vec![on.clone(), off.clone(), off.clone(), on, off.clone(), off];
    let events = drive(&mut lifecycle, "013C", &steps);
    let sequence: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(
        sequence,
        vec![
            EventKind::Raise,
            EventKind::Resolve,
            EventKind::Raise,
            EventKind::Resolve
        ]
    );
    assert!(lifecycle.is_empty());
}

#[test]
fn held_condition_escalates_to_critical_and_stays() {
    let mut lifecycle = AlertLifecycle::default();
    let wastage = vec![hit(Condition::EnergyWastage, Severity::High)];
    let events = drive(&mut lifecycle, "101", &vec![wastage; 45]);

    // reminders every cooldown period, escalation at the 30 minute mark
    let timeline: Vec<(i64, Severity)> = events
        .iter()
        .map(|e| ((e.timestamp - t0()).num_minutes(), e.severity))
        .collect();
    assert_eq!(
        timeline,
        vec![
            (0, Severity::High),
            (10, Severity::High),
            (20, Severity::High),
            (30, Severity::Critical),
            (40, Severity::Critical),
        ]
    );
    assert!(events[3].message.contains("escalated"));

    let state = lifecycle
        .state(&ConditionKey::new("101", Condition::EnergyWastage))
        .expect("still active");
    assert_eq!(state.current_severity, Severity::Critical);
}

#[test]
fn resolve_carries_last_severity() {
    let mut lifecycle = AlertLifecycle::default();
    let steps = vec![
        vec![hit(Condition::FireHazard, Severity::Critical)],
        vec![],
    ];
    let events = drive(&mut lifecycle, "303", &steps);
    assert_eq!(
        kinds(&events),
        vec![
            (EventKind::Raise, Condition::FireHazard, Severity::Critical),
            (EventKind::Resolve, Condition::FireHazard, Severity::Critical)
        ]
    );
}

#[test]
fn custom_policy_shortens_cooldown_and_escalation() {
    let policy = LifecyclePolicy {
        escalation: Duration::minutes(3),
        cooldown: Duration::minutes(2),
    };
    let mut lifecycle = AlertLifecycle::new(policy);
    let stuck = vec![hit(Condition::DyingEquipment, Severity::Medium)];
    let events = drive(&mut lifecycle, "LAB2", &vec![stuck; 4]);
    // minute 0 raise, minute 2 cooldown reminder, minute 3 escalation
    assert_eq!(
        kinds(&events),
        vec![
            (EventKind::Raise, Condition::DyingEquipment, Severity::Medium),
            (EventKind::Raise, Condition::DyingEquipment, Severity::Medium),
            (EventKind::Raise, Condition::DyingEquipment, Severity::Critical),
        ]
    );
}

#[test]
fn rooms_do_not_interfere() {
    let mut lifecycle = AlertLifecycle::default();
    let now = t0();
    lifecycle.evaluate_room("101", &[hit(Condition::EnergyWastage, Severity::High)], now);
    lifecycle.evaluate_room("202", &[hit(Condition::EnergyWastage, Severity::High)], now);

    let events = lifecycle.evaluate_room("101", &[], now + Duration::minutes(1));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].room, "101");
    assert_eq!(lifecycle.active_keys(), vec![ConditionKey::new("202", Condition::EnergyWastage)]);
}
