use crate::domain::entities::reading::{Reading, SensorField};

/// Time-ordered recent readings of a single room, as seen by the detectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    room: String,
    readings: Vec<Reading>,
}

impl Window {
    /// Builds a window, sorting readings by timestamp and discarding any that
    /// belong to a different room.
    #[must_use]
    pub fn new(room: impl Into<String>, readings: Vec<Reading>) -> Self {
        let room = room.into();
        let mut readings: Vec<Reading> = readings.into_iter().filter(|r| r.room == room).collect();
        readings.sort_by_key(|r| r.timestamp);
        Self { room, readings }
    }

    #[must_use]
    pub fn empty(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            readings: Vec::new(),
        }
    }

    #[must_use]
    pub fn room(&self) -> &str {
        &self.room
    }

    #[must_use]
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.last()
    }

    /// Values of `field` across the window, oldest first, skipping readings
    /// that do not carry it.
    pub fn series(&self, field: SensorField) -> impl Iterator<Item = f64> + '_ {
        self.readings.iter().filter_map(move |r| r.value(field))
    }

    /// The last `n` values of `field`, oldest first. Shorter when the window
    /// holds fewer samples of that field.
    #[must_use]
    pub fn trailing(&self, field: SensorField, n: usize) -> Vec<f64> {
        let mut tail: Vec<f64> = self
            .readings
            .iter()
            .rev()
            .filter_map(|r| r.value(field))
            .take(n)
            .collect();
        tail.reverse();
        tail
    }

    /// The last `n` readings carrying both fields, as paired samples.
    #[must_use]
    pub fn trailing_pairs(&self, a: SensorField, b: SensorField, n: usize) -> Vec<(f64, f64)> {
        let mut tail: Vec<(f64, f64)> = self
            .readings
            .iter()
            .rev()
            .filter_map(|r| Some((r.value(a)?, r.value(b)?)))
            .take(n)
            .collect();
        tail.reverse();
        tail
    }
}
