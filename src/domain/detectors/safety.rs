use crate::domain::entities::condition::Condition;
use crate::domain::entities::reading::SensorField;
use crate::domain::entities::window::Window;
use crate::domain::value_objects::severity::Severity;
use crate::domain::value_objects::thresholds::DetectorThresholds;

use super::{ConditionHit, Detector};

fn peak(window: &Window, field: SensorField) -> Option<f64> {
    window.series(field).reduce(f64::max)
}

/// Fire and gas checks over every sample in the window. Either, both or
/// neither may fire.
pub struct SafetyHazardDetector;

impl Detector for SafetyHazardDetector {
    fn name(&self) -> &'static str {
        "safety_hazard"
    }

    fn evaluate(&self, window: &Window, thresholds: &DetectorThresholds) -> Vec<ConditionHit> {
        let mut hits = Vec::new();

        if let Some(temp) =
            peak(window, SensorField::Temperature).filter(|t| *t > thresholds.temp_fire_c)
        {
            hits.push(ConditionHit::new(
                Condition::FireHazard,
                Severity::Critical,
                format!(
                    "Fire hazard in room {}: temperature reached {temp:.1} \u{b0}C (threshold {:.0} \u{b0}C)",
                    window.room(),
                    thresholds.temp_fire_c
                ),
            ));
        }

        if let Some(gas) = peak(window, SensorField::Gas).filter(|g| *g > thresholds.gas_leak_ppm) {
            hits.push(ConditionHit::new(
                Condition::GasLeak,
                Severity::Critical,
                format!(
                    "Gas leak in room {}: {gas:.0} ppm (threshold {:.0} ppm)",
                    window.room(),
                    thresholds.gas_leak_ppm
                ),
            ));
        }

        hits
    }
}
