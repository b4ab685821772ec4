pub mod dying_equipment;
pub mod lighting;
pub mod safety;
pub mod stats;
pub mod stuck_sensor;
pub mod wastage;

use thiserror::Error;

use crate::domain::entities::condition::Condition;
use crate::domain::entities::reading::SensorField;
use crate::domain::entities::window::Window;
use crate::domain::value_objects::severity::Severity;
use crate::domain::value_objects::thresholds::DetectorThresholds;

/// A condition a detector found to be true for the window's room.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionHit {
    pub condition: Condition,
    pub severity: Severity,
    pub message: String,
}

impl ConditionHit {
    #[must_use]
    pub fn new(condition: Condition, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            condition,
            severity,
            message: message.into(),
        }
    }
}

/// Raised when a window cannot support a check. Callers treat it as "no hit".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectorError {
    #[error("need {needed} samples of {field}, window has {available}")]
    InsufficientSamples {
        field: SensorField,
        needed: usize,
        available: usize,
    },
}

/// Fails with [`DetectorError::InsufficientSamples`] unless `samples` holds at least `needed` values.
pub(crate) fn require_samples<T>(
    field: SensorField,
    samples: &[T],
    needed: usize,
) -> Result<(), DetectorError> {
    if samples.len() < needed {
        Err(DetectorError::InsufficientSamples {
            field,
            needed,
            available: samples.len(),
        })
    } else {
        Ok(())
    }
}

/// A pure check over one room window. No I/O, no state between calls, so
/// detectors can run in any order.
pub trait Detector: Send + Sync {
    /// Returns the unique name of this detector
    fn name(&self) -> &'static str;

    /// Evaluates the window using the given thresholds
    fn evaluate(&self, window: &Window, thresholds: &DetectorThresholds) -> Vec<ConditionHit>;
}

/// Returns the full detector set
#[must_use]
pub fn default_detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(wastage::WastageDetector),
        Box::new(stuck_sensor::StuckSensorDetector),
        Box::new(dying_equipment::DyingEquipmentDetector),
        Box::new(safety::SafetyHazardDetector),
        Box::new(lighting::LightingIssueDetector),
    ]
}

/// Runs a collection of detectors against room windows
pub struct DetectorEngine {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorEngine {
    #[must_use]
    pub fn new(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self { detectors }
    }

    #[must_use]
    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Runs every detector on the window and returns the union of their hits,
    /// one per condition (highest severity wins), critical first.
    #[must_use]
    pub fn analyze(&self, window: &Window, thresholds: &DetectorThresholds) -> Vec<ConditionHit> {
        let mut hits: Vec<ConditionHit> = Vec::new();
        for hit in self
            .detectors
            .iter()
            .flat_map(|detector| detector.evaluate(window, thresholds))
        {
            match hits.iter_mut().find(|h| h.condition == hit.condition) {
                Some(existing) if hit.severity > existing.severity => *existing = hit,
                Some(_) => {}
                None => hits.push(hit),
            }
        }
        hits.sort_by(|a, b| b.severity.cmp(&a.severity));
        hits
    }
}

impl Default for DetectorEngine {
    fn default() -> Self {
        Self::new(default_detectors())
    }
}
