//! Pivots per-sensor telemetry messages into multi-field readings.
//!
//! Devices publish one message per sensor, `{"room": "101", "sensor": "temp",
//! "value": 23.4}`, on `campus/<room>/<sensor>`, with no timestamp. Messages for
//! the same room are merged into one reading stamped at the arrival of its
//! first field. A reading closes when a field repeats or when it has been open
//! longer than the coalesce period. Whole readings published as one JSON
//! object are passed on untouched; one without a timestamp is rejected later
//! like any other untimed reading.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::domain::entities::reading::{IngestionError, RawReading, SensorField};

/// Readings held while nobody fetches them; the oldest are dropped beyond this.
const MAX_BUFFERED: usize = 10_000;

#[derive(Debug)]
struct Pending {
    opened: DateTime<Utc>,
    reading: RawReading,
}

#[derive(Debug)]
pub struct ReadingAssembler {
    coalesce: Duration,
    pending: BTreeMap<String, Pending>,
    ready: Vec<RawReading>,
}

impl ReadingAssembler {
    #[must_use]
    pub fn new(coalesce: Duration) -> Self {
        Self {
            coalesce,
            pending: BTreeMap::new(),
            ready: Vec::new(),
        }
    }

    /// Accepts one MQTT message. Unknown sensors are ignored.
    ///
    /// # Errors
    ///
    /// Returns `IngestionError::Malformed` when the payload is not a usable
    /// JSON object, and `IngestionError::MissingRoom` when neither the payload
    /// nor the topic names a room.
    pub fn ingest(
        &mut self,
        topic: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(), IngestionError> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| IngestionError::Malformed(format!("{topic}: {e}")))?;
        let Value::Object(map) = &value else {
            return Err(IngestionError::Malformed(format!(
                "{topic}: payload is not a JSON object"
            )));
        };

        if map.contains_key("sensor") {
            self.ingest_sensor_value(topic, map, now)
        } else {
            let mut reading: RawReading = serde_json::from_value(value)
                .map_err(|e| IngestionError::Malformed(format!("{topic}: {e}")))?;
            if reading.room.trim().is_empty() {
                reading.room = room_from_topic(topic).ok_or(IngestionError::MissingRoom)?;
            }
            self.push_ready(reading);
            Ok(())
        }
    }

    fn ingest_sensor_value(
        &mut self,
        topic: &str,
        map: &serde_json::Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<(), IngestionError> {
        let room = match map.get("room") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => room_from_topic(topic).ok_or(IngestionError::MissingRoom)?,
        };

        let sensor = map
            .get("sensor")
            .and_then(Value::as_str)
            .ok_or_else(|| IngestionError::Malformed(format!("{topic}: sensor is not a string")))?;
        let Ok(field) = sensor.parse::<SensorField>() else {
            tracing::debug!(topic, sensor, "ignoring unsupported sensor");
            return Ok(());
        };

        let value = map
            .get("value")
            .and_then(numeric)
            .ok_or_else(|| IngestionError::Malformed(format!("{topic}: value is not numeric")))?;

        self.flush_expired(now);

        let repeated = self
            .pending
            .get(&room)
            .is_some_and(|p| p.reading.get(field).is_some());
        if repeated {
            if let Some(done) = self.pending.remove(&room) {
                self.push_ready(done.reading);
            }
        }

        let pending = self.pending.entry(room.clone()).or_insert_with(|| Pending {
            opened: now,
            reading: RawReading {
                room,
                timestamp: Some(now),
                ..RawReading::default()
            },
        });
        pending.reading.set(field, value);
        Ok(())
    }

    /// Closes readings that have been open for at least the coalesce period.
    pub fn flush_expired(&mut self, now: DateTime<Utc>) {
        let expired: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, p)| now - p.opened >= self.coalesce)
            .map(|(room, _)| room.clone())
            .collect();
        for room in expired {
            if let Some(done) = self.pending.remove(&room) {
                self.push_ready(done.reading);
            }
        }
    }

    /// Takes every closed reading, oldest first.
    pub fn drain(&mut self, now: DateTime<Utc>) -> Vec<RawReading> {
        self.flush_expired(now);
        std::mem::take(&mut self.ready)
    }

    /// Takes the closed readings accepted by `keep`, leaving the rest buffered.
    pub fn drain_where(
        &mut self,
        now: DateTime<Utc>,
        keep: impl Fn(&RawReading) -> bool,
    ) -> Vec<RawReading> {
        self.flush_expired(now);
        let (taken, rest) = std::mem::take(&mut self.ready)
            .into_iter()
            .partition(|r| keep(r));
        self.ready = rest;
        taken
    }

    #[must_use]
    pub fn pending_rooms(&self) -> usize {
        self.pending.len()
    }

    fn push_ready(&mut self, reading: RawReading) {
        if self.ready.len() >= MAX_BUFFERED {
            tracing::warn!("telemetry buffer full, dropping oldest reading");
            self.ready.remove(0);
        }
        self.ready.push(reading);
    }
}

/// `campus/<room>/<sensor>` → `<room>`
fn room_from_topic(topic: &str) -> Option<String> {
    let mut parts = topic.split('/');
    parts.next()?;
    parts
        .next()
        .map(str::trim)
        .filter(|room| !room.is_empty())
        .map(str::to_string)
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
