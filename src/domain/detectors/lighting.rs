use crate::domain::entities::condition::Condition;
use crate::domain::entities::window::Window;
use crate::domain::value_objects::severity::Severity;
use crate::domain::value_objects::thresholds::DetectorThresholds;

use super::{ConditionHit, Detector};

pub struct LightingIssueDetector;

impl Detector for LightingIssueDetector {
    fn name(&self) -> &'static str {
        "lighting_issue"
    }

    fn evaluate(&self, window: &Window, thresholds: &DetectorThresholds) -> Vec<ConditionHit> {
        let dim = window.readings().iter().find_map(|r| match (r.occupancy, r.light) {
            (Some(people), Some(lux)) if people > 0 && lux < thresholds.light_dim_lux => {
                Some((people, lux))
            }
            _ => None,
        });

        dim.map(|(people, lux)| {
            ConditionHit::new(
                Condition::PoorLighting,
                Severity::Low,
                format!(
                    "Room {} is occupied ({people} people) but only {lux:.0} lux (threshold {:.0} lux)",
                    window.room(),
                    thresholds.light_dim_lux
                ),
            )
        })
        .into_iter()
        .collect()
    }
}
