use chrono::Duration;

use crate::domain::entities::condition::Condition;
use crate::domain::entities::reading::Reading;
use crate::domain::entities::window::Window;
use crate::domain::value_objects::severity::Severity;
use crate::domain::value_objects::thresholds::DetectorThresholds;

use super::{ConditionHit, Detector};

fn is_wasting(reading: &Reading, thresholds: &DetectorThresholds) -> bool {
    matches!(
        (reading.occupancy, reading.power),
        (Some(0), Some(power)) if power > thresholds.high_power_w
    )
}

/// Empty room drawing high power.
///
/// With `wastage_duration_minutes == 0` only the latest reading counts. Otherwise
/// the latest reading must match and the unbroken run of matching readings that
/// ends with it must span at least the configured duration.
pub struct WastageDetector;

impl Detector for WastageDetector {
    fn name(&self) -> &'static str {
        "wastage"
    }

    fn evaluate(&self, window: &Window, thresholds: &DetectorThresholds) -> Vec<ConditionHit> {
        let Some(latest) = window.latest() else {
            return vec![];
        };
        if !is_wasting(latest, thresholds) {
            return vec![];
        }

        let required = Duration::minutes(i64::from(thresholds.wastage_duration_minutes));
        if required > Duration::zero() {
            let run_start = window
                .readings()
                .iter()
                .rev()
                .take_while(|r| is_wasting(r, thresholds))
                .last()
                .map_or(latest.timestamp, |r| r.timestamp);
            let held = latest.timestamp - run_start;
            if held < required {
                tracing::debug!(
                    room = window.room(),
                    held_secs = held.num_seconds(),
                    "wastage not sustained long enough"
                );
                return vec![];
            }
        }

        let power = latest.power.unwrap_or_default();
        vec![ConditionHit::new(
            Condition::EnergyWastage,
            Severity::High,
            format!(
                "Room {} is empty but drawing {power:.0} W (threshold {:.0} W)",
                window.room(),
                thresholds.high_power_w
            ),
        )]
    }
}
