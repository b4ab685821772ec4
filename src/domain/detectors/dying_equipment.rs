use crate::domain::entities::condition::Condition;
use crate::domain::entities::reading::SensorField;
use crate::domain::entities::window::Window;
use crate::domain::value_objects::severity::Severity;
use crate::domain::value_objects::thresholds::DetectorThresholds;

use super::stats::ols_slope;
use super::{require_samples, ConditionHit, Detector};

/// Power draw climbing while temperature does not drop: the equipment works
/// harder without delivering cooling.
///
/// Both slopes come from the same trailing readings (those carrying power and
/// temperature) and are regressed against sample index.
pub struct DyingEquipmentDetector;

impl Detector for DyingEquipmentDetector {
    fn name(&self) -> &'static str {
        "dying_equipment"
    }

    fn evaluate(&self, window: &Window, thresholds: &DetectorThresholds) -> Vec<ConditionHit> {
        let needed = thresholds.trend_window_size;
        let pairs = window.trailing_pairs(SensorField::Power, SensorField::Temperature, needed);
        if let Err(e) = require_samples(SensorField::Power, &pairs, needed) {
            tracing::debug!(room = window.room(), error = %e, "trend check skipped");
            return vec![];
        }

        let (power, temperature): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let power_slope = ols_slope(&power);
        let temp_slope = ols_slope(&temperature);

        if power_slope > thresholds.trend_rise_threshold
            && temp_slope >= thresholds.trend_temp_tolerance
        {
            vec![ConditionHit::new(
                Condition::DyingEquipment,
                Severity::Critical,
                format!(
                    "Equipment in room {} degrading: power rising {power_slope:.1} W/sample, temperature trend {temp_slope:+.2} \u{b0}C/sample",
                    window.room()
                ),
            )]
        } else {
            vec![]
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::entities::reading::Reading;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(second: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
            .single()
            .expect("valid date")
            + Duration::seconds(second)
    }

    fn window(power: &[f64], temperature: &[f64]) -> Window {
        let readings = power
            .iter()
            .zip(temperature)
            .zip(0_i64..)
            .map(|((&p, &t), i)| {
                Reading::new("lab", at(i * 5))
                    .with(SensorField::Power, p)
                    .with(SensorField::Temperature, t)
            })
            .collect();
        Window::new("lab", readings)
    }

    fn rising_power() -> Vec<f64> {
        (0..10).map(|i| 1000.0 + 50.0 * f64::from(i)).collect()
    }

    #[test]
    fn rising_power_with_flat_temperature_triggers() {
        let hits = DyingEquipmentDetector.evaluate(
            &window(&rising_power(), &[24.0; 10]),
            &DetectorThresholds::default(),
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].condition, Condition::DyingEquipment);
        assert_eq!(hits[0].severity, Severity::Critical);
    }

    #[test]
    fn falling_power_does_not_trigger() {
        let power: Vec<f64> = rising_power().into_iter().rev().collect();
        assert!(DyingEquipmentDetector
            .evaluate(&window(&power, &[24.0; 10]), &DetectorThresholds::default())
            .is_empty());
    }

    #[test]
    fn effective_cooling_does_not_trigger() {
        let temperature: Vec<f64> = (0..10).map(|i| 26.0 - 0.5 * f64::from(i)).collect();
        assert!(DyingEquipmentDetector
            .evaluate(
                &window(&rising_power(), &temperature),
                &DetectorThresholds::default()
            )
            .is_empty());
    }

    #[test]
    fn slight_cooling_within_tolerance_still_triggers() {
        let temperature: Vec<f64> = (0..10).map(|i| 24.0 - 0.05 * f64::from(i)).collect();
        assert_eq!(
            DyingEquipmentDetector
                .evaluate(
                    &window(&rising_power(), &temperature),
                    &DetectorThresholds::default()
                )
                .len(),
            1
        );
    }

    #[test]
    fn short_window_is_no_hit() {
        let power: Vec<f64> = rising_power().into_iter().take(9).collect();
        assert!(DyingEquipmentDetector
            .evaluate(&window(&power, &[24.0; 9]), &DetectorThresholds::default())
            .is_empty());
    }
}
