use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::entities::reading::Reading;
use crate::domain::entities::window::Window;
use crate::domain::value_objects::lifecycle_policy::WindowLimits;

/// Per-room bounded recent history. The only owner of window state.
#[derive(Debug, Default)]
pub struct WindowStore {
    limits: WindowLimits,
    rooms: BTreeMap<String, Vec<Reading>>,
}

impl WindowStore {
    #[must_use]
    pub fn new(limits: WindowLimits) -> Self {
        Self {
            limits,
            rooms: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn limits(&self) -> WindowLimits {
        self.limits
    }

    /// Inserts a reading in timestamp order. Returns `false` when it was
    /// dropped because the room already holds a reading at that instant.
    /// The oldest readings are discarded once the room exceeds its cap.
    pub fn append(&mut self, reading: Reading) -> bool {
        let readings = self.rooms.entry(reading.room.clone()).or_default();
        let pos = readings.partition_point(|r| r.timestamp <= reading.timestamp);
        if pos > 0 && readings[pos - 1].timestamp == reading.timestamp {
            tracing::debug!(
                room = %reading.room,
                timestamp = %reading.timestamp,
                "duplicate reading dropped"
            );
            return false;
        }
        readings.insert(pos, reading);

        let max = self.limits.max_readings.max(1);
        if readings.len() > max {
            let excess = readings.len() - max;
            readings.drain(..excess);
        }
        true
    }

    /// Eviction-applied view of one room. Unknown rooms yield an empty window.
    #[must_use]
    pub fn snapshot(&self, room: &str) -> Window {
        self.rooms
            .get(room)
            .map_or_else(|| Window::empty(room), |r| Window::new(room, r.clone()))
    }

    /// Drops readings older than the retention period in every room and
    /// forgets rooms left empty. Returns how many readings were removed.
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.limits.retention;
        let mut removed = 0;
        for readings in self.rooms.values_mut() {
            let keep_from = readings.partition_point(|r| r.timestamp < cutoff);
            removed += keep_from;
            readings.drain(..keep_from);
        }
        self.rooms.retain(|_, readings| !readings.is_empty());
        removed
    }

    #[must_use]
    pub fn rooms(&self) -> Vec<String> {
        self.rooms.keys().cloned().collect()
    }

    /// Most recent reading of every room, in room order.
    #[must_use]
    pub fn latest_by_room(&self) -> Vec<Reading> {
        self.rooms
            .values()
            .filter_map(|readings| readings.last().cloned())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
