use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::domain::detectors::ConditionHit;
use crate::domain::entities::alert::AlertEvent;
use crate::domain::entities::condition::{Condition, ConditionKey};
use crate::domain::value_objects::lifecycle_policy::LifecyclePolicy;
use crate::domain::value_objects::severity::Severity;

/// Tracking record of one active condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertState {
    pub first_seen: DateTime<Utc>,
    pub current_severity: Severity,
    pub last_notified: DateTime<Utc>,
    /// Whether a RAISE for this key has ever left the core
    pub ever_raised: bool,
}

/// Turns per-cycle condition hits into RAISE and RESOLVE events, applying
/// escalation and repeat suppression. Performs no I/O.
///
/// Each engine instance owns its own state, so independent instances can run
/// side by side.
#[derive(Debug, Default)]
pub struct AlertLifecycle {
    policy: LifecyclePolicy,
    active: BTreeMap<ConditionKey, AlertState>,
}

impl AlertLifecycle {
    #[must_use]
    pub fn new(policy: LifecyclePolicy) -> Self {
        Self {
            policy,
            active: BTreeMap::new(),
        }
    }

    /// Feeds the complete set of hits currently true for `room`.
    ///
    /// Active keys of this room that are missing from `hits` resolve. Keys of
    /// other rooms are untouched.
    pub fn evaluate_room(
        &mut self,
        room: &str,
        hits: &[ConditionHit],
        now: DateTime<Utc>,
    ) -> Vec<AlertEvent> {
        let mut current: BTreeMap<Condition, &ConditionHit> = BTreeMap::new();
        for hit in hits {
            current
                .entry(hit.condition)
                .and_modify(|existing| {
                    if hit.severity > existing.severity {
                        *existing = hit;
                    }
                })
                .or_insert(hit);
        }

        let mut events = Vec::new();
        for (condition, hit) in &current {
            let key = ConditionKey::new(room, *condition);
            if let Some(event) = self.observe(key, hit, now) {
                events.push(event);
            }
        }

        let cleared: Vec<ConditionKey> = self
            .active
            .keys()
            .filter(|key| key.room == room && !current.contains_key(&key.condition))
            .cloned()
            .collect();
        for key in cleared {
            if let Some(state) = self.active.remove(&key) {
                if state.ever_raised {
                    tracing::info!(key = %key, "condition resolved");
                    events.push(AlertEvent::resolve(&key, state.current_severity, now));
                } else {
                    tracing::debug!(key = %key, "condition cleared without prior raise");
                }
            }
        }

        events
    }

    fn observe(
        &mut self,
        key: ConditionKey,
        hit: &ConditionHit,
        now: DateTime<Utc>,
    ) -> Option<AlertEvent> {
        if !self.active.contains_key(&key) {
            tracing::info!(key = %key, severity = %hit.severity, "condition raised");
            let event = AlertEvent::raise(&key, hit.severity, hit.message.clone(), now);
            self.active.insert(
                key,
                AlertState {
                    first_seen: now,
                    current_severity: hit.severity,
                    last_notified: now,
                    ever_raised: true,
                },
            );
            return Some(event);
        }

        let state = self.active.get_mut(&key)?;
        let escalated = now - state.first_seen >= self.policy.escalation;
        let mut severity = state.current_severity.max(hit.severity);
        if escalated {
            severity = Severity::Critical;
        }

        let changed = severity != state.current_severity;
        state.current_severity = severity;

        if !changed && now - state.last_notified < self.policy.cooldown {
            tracing::debug!(key = %key, "repeat suppressed by cooldown");
            return None;
        }

        state.last_notified = now;
        state.ever_raised = true;

        let message = if escalated && hit.severity < Severity::Critical {
            format!(
                "{} (escalated: active for {} min)",
                hit.message,
                (now - state.first_seen).num_minutes()
            )
        } else {
            hit.message.clone()
        };
        if changed {
            tracing::warn!(key = %key, severity = %severity, "condition severity raised");
        }
        Some(AlertEvent::raise(&key, severity, message, now))
    }

    #[must_use]
    pub fn state(&self, key: &ConditionKey) -> Option<&AlertState> {
        self.active.get(key)
    }

    #[must_use]
    pub fn active_keys(&self) -> Vec<ConditionKey> {
        self.active.keys().cloned().collect()
    }

    /// Rooms with at least one active condition.
    #[must_use]
    pub fn active_rooms(&self) -> BTreeSet<String> {
        self.active.keys().map(|k| k.room.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
