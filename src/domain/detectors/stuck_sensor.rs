use crate::domain::entities::condition::Condition;
use crate::domain::entities::window::Window;
use crate::domain::value_objects::severity::Severity;
use crate::domain::value_objects::thresholds::DetectorThresholds;

use super::stats::sample_std_dev;
use super::{require_samples, ConditionHit, Detector};

/// Sensor frozen at a fixed value: the trailing samples of a field show
/// (almost) no variation.
pub struct StuckSensorDetector;

impl Detector for StuckSensorDetector {
    fn name(&self) -> &'static str {
        "stuck_sensor"
    }

    fn evaluate(&self, window: &Window, thresholds: &DetectorThresholds) -> Vec<ConditionHit> {
        let needed = thresholds.stuck_window_size;
        thresholds
            .stuck_fields
            .iter()
            .filter_map(|&field| {
                let samples = window.trailing(field, needed);
                if let Err(e) = require_samples(field, &samples, needed) {
                    tracing::debug!(room = window.room(), error = %e, "stuck-sensor check skipped");
                    return None;
                }
                let std = sample_std_dev(&samples);
                (std < thresholds.stuck_std_epsilon).then(|| {
                    ConditionHit::new(
                        Condition::StuckSensor(field),
                        Severity::High,
                        format!(
                            "{field} sensor in room {} reported {:.2} {} for {needed} samples (std {std:.1e})",
                            window.room(),
                            samples.last().copied().unwrap_or_default(),
                            field.unit(),
                        ),
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::entities::reading::{Reading, SensorField};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(second: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
            .single()
            .expect("valid date")
            + Duration::seconds(second)
    }

    fn temperatures(values: &[f64]) -> Window {
        let readings = values
            .iter()
            .zip(0_i64..)
            .map(|(&v, i)| Reading::new("101", at(i * 5)).with(SensorField::Temperature, v))
            .collect();
        Window::new("101", readings)
    }

    #[test]
    fn constant_temperature_is_stuck() {
        let window = temperatures(&[25.0; 10]);
        let hits = StuckSensorDetector.evaluate(&window, &DetectorThresholds::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].condition, Condition::StuckSensor(SensorField::Temperature));
        assert_eq!(hits[0].severity, Severity::High);
    }

    #[test]
    fn one_changed_value_clears_the_hit() {
        let mut values = [25.0; 10];
        values[4] = 25.3;
        let window = temperatures(&values);
        assert!(StuckSensorDetector
            .evaluate(&window, &DetectorThresholds::default())
            .is_empty());
    }

    #[test]
    fn too_few_samples_is_no_hit() {
        let window = temperatures(&[25.0; 9]);
        assert!(StuckSensorDetector
            .evaluate(&window, &DetectorThresholds::default())
            .is_empty());
    }

    #[test]
    fn only_trailing_samples_are_inspected() {
        let mut values = vec![18.0, 30.0, 12.0];
        values.extend([25.0; 10]);
        let window = temperatures(&values);
        assert_eq!(
            StuckSensorDetector
                .evaluate(&window, &DetectorThresholds::default())
                .len(),
            1
        );
    }

    #[test]
    fn each_configured_field_is_checked() {
        let readings = (0..10)
            .map(|i| {
                Reading::new("101", at(i * 5))
                    .with(SensorField::Temperature, 21.0 + 0.1 * i as f64)
                    .with(SensorField::Humidity, 40.0)
                    .with(SensorField::Power, 300.0)
            })
            .collect();
        let window = Window::new("101", readings);

        let hits = StuckSensorDetector.evaluate(&window, &DetectorThresholds::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].condition, Condition::StuckSensor(SensorField::Humidity));

        let thresholds = DetectorThresholds {
            stuck_fields: vec![SensorField::Power, SensorField::Humidity],
            ..DetectorThresholds::default()
        };
        assert_eq!(StuckSensorDetector.evaluate(&window, &thresholds).len(), 2);
    }
}
