use serde::{Deserialize, Serialize};

use crate::domain::entities::reading::SensorField;

/// Validated detector thresholds. Built from configuration at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorThresholds {
    /// Power draw (W) above which an empty room counts as wasting energy
    pub high_power_w: f64,
    /// Minutes the wastage condition must hold; 0 checks the latest reading only
    pub wastage_duration_minutes: u32,
    /// Temperature (°C) above which any sample signals a fire hazard
    pub temp_fire_c: f64,
    /// Gas concentration (ppm) above which any sample signals a leak
    pub gas_leak_ppm: f64,
    /// Illuminance (lux) below which an occupied room is too dark
    pub light_dim_lux: f64,
    /// Fields checked for frozen values
    pub stuck_fields: Vec<SensorField>,
    /// Number of trailing samples inspected by the stuck-sensor check
    pub stuck_window_size: usize,
    /// Standard deviation below which a sensor is considered frozen
    pub stuck_std_epsilon: f64,
    /// Number of trailing samples used for trend slopes
    pub trend_window_size: usize,
    /// Power slope (W per sample) above which equipment is degrading
    pub trend_rise_threshold: f64,
    /// Temperature slope (°C per sample) at or above which cooling is ineffective
    pub trend_temp_tolerance: f64,
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        Self {
            high_power_w: 1000.0,
            wastage_duration_minutes: 0,
            temp_fire_c: 50.0,
            gas_leak_ppm: 400.0,
            light_dim_lux: 100.0,
            stuck_fields: vec![SensorField::Temperature, SensorField::Humidity],
            stuck_window_size: 10,
            stuck_std_epsilon: 1e-4,
            trend_window_size: 10,
            trend_rise_threshold: 10.0,
            trend_temp_tolerance: -0.1,
        }
    }
}
