use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::application::services::evaluator::EvaluatorSettings;
use crate::domain::entities::reading::SensorField;
use crate::domain::value_objects::lifecycle_policy::{LifecyclePolicy, WindowLimits};
use crate::domain::value_objects::severity::Severity;
use crate::domain::value_objects::thresholds::DetectorThresholds;

/// Invalid configuration. The engine refuses to start on any of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("unknown sensor field in thresholds.stuck_fields: {0}")]
    UnknownField(String),
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

/// Top-level application configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub sinks: SinkConfig,
}

/// Loop timing and I/O timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_io_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_io_timeout")]
    pub emit_timeout_secs: u64,
    #[serde(default)]
    pub broadcast_live_status: bool,
}

/// Bounds of every room window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_retention_minutes")]
    pub retention_minutes: u64,
    #[serde(default = "default_max_readings")]
    pub max_readings: usize,
}

/// Detector thresholds as written by the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_high_power")]
    pub high_power_w: f64,
    #[serde(default)]
    pub wastage_duration_minutes: u32,
    #[serde(default = "default_temp_fire")]
    pub temp_fire_c: f64,
    #[serde(default = "default_gas_leak")]
    pub gas_leak_ppm: f64,
    #[serde(default = "default_light_dim")]
    pub light_dim_lux: f64,
    #[serde(default = "default_stuck_fields")]
    pub stuck_fields: Vec<String>,
    #[serde(default = "default_sample_window")]
    pub stuck_window_size: usize,
    #[serde(default = "default_stuck_epsilon")]
    pub stuck_std_epsilon: f64,
    #[serde(default = "default_sample_window")]
    pub trend_window_size: usize,
    #[serde(default = "default_trend_rise")]
    pub trend_rise_threshold: f64,
    #[serde(default = "default_trend_tolerance")]
    pub trend_temp_tolerance: f64,
}

/// Escalation and cooldown, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default = "default_escalation")]
    pub escalation_secs: u64,
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    File,
    Mqtt,
}

/// Where readings come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
    /// JSON-lines replay file (tilde-expanded at point of use)
    #[serde(default = "default_replay_path")]
    pub path: String,
    /// Shift replayed timestamps so the newest reading is "now"
    #[serde(default = "default_true")]
    pub rebase_timestamps: bool,
}

/// Broker connection shared by the MQTT source and sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
    #[serde(default = "default_readings_topic")]
    pub readings_topic: String,
    #[serde(default = "default_alerts_topic")]
    pub alerts_topic: String,
    #[serde(default = "default_live_topic")]
    pub live_topic: String,
    #[serde(default = "default_coalesce_ms")]
    pub coalesce_ms: u64,
}

/// Alert event destinations. Every enabled sink receives every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default = "default_true")]
    pub terminal: bool,
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub webhook_min_severity: Option<Severity>,
    #[serde(default)]
    pub mqtt: bool,
}

// --- Defaults ---

const fn default_interval() -> u64 {
    5
}

const fn default_io_timeout() -> u64 {
    3
}

const fn default_retention_minutes() -> u64 {
    10
}

const fn default_max_readings() -> usize {
    50
}

const fn default_high_power() -> f64 {
    1000.0
}

const fn default_temp_fire() -> f64 {
    50.0
}

const fn default_gas_leak() -> f64 {
    400.0
}

const fn default_light_dim() -> f64 {
    100.0
}

fn default_stuck_fields() -> Vec<String> {
    vec!["temperature".into(), "humidity".into()]
}

const fn default_sample_window() -> usize {
    10
}

const fn default_stuck_epsilon() -> f64 {
    1e-4
}

const fn default_trend_rise() -> f64 {
    10.0
}

const fn default_trend_tolerance() -> f64 {
    -0.1
}

const fn default_escalation() -> u64 {
    30 * 60
}

const fn default_cooldown() -> u64 {
    10 * 60
}

fn default_replay_path() -> String {
    "~/.local/share/roomguard/readings.jsonl".into()
}

fn default_mqtt_host() -> String {
    "localhost".into()
}

const fn default_mqtt_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "roomguard".into()
}

const fn default_keep_alive() -> u64 {
    30
}

fn default_readings_topic() -> String {
    "campus/#".into()
}

fn default_alerts_topic() -> String {
    "campusiq/alerts".into()
}

fn default_live_topic() -> String {
    "campusiq/live_data".into()
}

const fn default_coalesce_ms() -> u64 {
    1000
}

const fn default_true() -> bool {
    true
}

// --- Default impls ---

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            fetch_timeout_secs: default_io_timeout(),
            emit_timeout_secs: default_io_timeout(),
            broadcast_live_status: false,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            retention_minutes: default_retention_minutes(),
            max_readings: default_max_readings(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            high_power_w: default_high_power(),
            wastage_duration_minutes: 0,
            temp_fire_c: default_temp_fire(),
            gas_leak_ppm: default_gas_leak(),
            light_dim_lux: default_light_dim(),
            stuck_fields: default_stuck_fields(),
            stuck_window_size: default_sample_window(),
            stuck_std_epsilon: default_stuck_epsilon(),
            trend_window_size: default_sample_window(),
            trend_rise_threshold: default_trend_rise(),
            trend_temp_tolerance: default_trend_tolerance(),
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            escalation_secs: default_escalation(),
            cooldown_secs: default_cooldown(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::File,
            path: default_replay_path(),
            rebase_timestamps: default_true(),
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            client_id: default_client_id(),
            username: None,
            password: None,
            keep_alive_secs: default_keep_alive(),
            readings_topic: default_readings_topic(),
            alerts_topic: default_alerts_topic(),
            live_topic: default_live_topic(),
            coalesce_ms: default_coalesce_ms(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            terminal: default_true(),
            log_file: None,
            webhook_url: None,
            webhook_min_severity: None,
            mqtt: false,
        }
    }
}

// --- Validation ---

fn non_negative(key: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(invalid(key, format!("{value} is not a finite, non-negative number")))
    }
}

fn finite(key: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(key, format!("{value} is not finite")))
    }
}

fn at_least(key: &'static str, value: usize, min: usize) -> Result<usize, ConfigError> {
    if value >= min {
        Ok(value)
    } else {
        Err(invalid(key, format!("{value} is below the minimum of {min}")))
    }
}

fn positive_secs(key: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

fn chrono_secs(key: &'static str, secs: u64) -> Result<chrono::Duration, ConfigError> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| invalid(key, format!("{secs} seconds is out of range")))
}

impl TryFrom<&ThresholdConfig> for DetectorThresholds {
    type Error = ConfigError;

    fn try_from(config: &ThresholdConfig) -> Result<Self, Self::Error> {
        let stuck_fields = config
            .stuck_fields
            .iter()
            .map(|name| {
                name.parse::<SensorField>()
                    .map_err(|_| ConfigError::UnknownField(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let stuck_std_epsilon = non_negative("thresholds.stuck_std_epsilon", config.stuck_std_epsilon)?;
        if stuck_std_epsilon == 0.0 {
            return Err(invalid("thresholds.stuck_std_epsilon", "must be greater than zero"));
        }

        Ok(Self {
            high_power_w: non_negative("thresholds.high_power_w", config.high_power_w)?,
            wastage_duration_minutes: config.wastage_duration_minutes,
            temp_fire_c: finite("thresholds.temp_fire_c", config.temp_fire_c)?,
            gas_leak_ppm: non_negative("thresholds.gas_leak_ppm", config.gas_leak_ppm)?,
            light_dim_lux: non_negative("thresholds.light_dim_lux", config.light_dim_lux)?,
            stuck_fields,
            stuck_window_size: at_least("thresholds.stuck_window_size", config.stuck_window_size, 2)?,
            stuck_std_epsilon,
            trend_window_size: at_least("thresholds.trend_window_size", config.trend_window_size, 2)?,
            trend_rise_threshold: finite(
                "thresholds.trend_rise_threshold",
                config.trend_rise_threshold,
            )?,
            trend_temp_tolerance: finite(
                "thresholds.trend_temp_tolerance",
                config.trend_temp_tolerance,
            )?,
        })
    }
}

impl TryFrom<&LifecycleConfig> for LifecyclePolicy {
    type Error = ConfigError;

    fn try_from(config: &LifecycleConfig) -> Result<Self, Self::Error> {
        if config.escalation_secs == 0 {
            return Err(invalid("lifecycle.escalation_secs", "must be greater than zero"));
        }
        Ok(Self {
            escalation: chrono_secs("lifecycle.escalation_secs", config.escalation_secs)?,
            cooldown: chrono_secs("lifecycle.cooldown_secs", config.cooldown_secs)?,
        })
    }
}

impl TryFrom<&WindowConfig> for WindowLimits {
    type Error = ConfigError;

    fn try_from(config: &WindowConfig) -> Result<Self, Self::Error> {
        if config.retention_minutes == 0 {
            return Err(invalid("window.retention_minutes", "must be greater than zero"));
        }
        Ok(Self {
            retention: chrono_secs(
                "window.retention_minutes",
                config.retention_minutes.saturating_mul(60),
            )?,
            max_readings: at_least("window.max_readings", config.max_readings, 1)?,
        })
    }
}

/// Detectors must be able to see the history they ask for, otherwise they
/// would never fire.
fn check_window_fits(
    thresholds: &DetectorThresholds,
    limits: &WindowLimits,
) -> Result<(), ConfigError> {
    let wastage = chrono::Duration::minutes(i64::from(thresholds.wastage_duration_minutes));
    if thresholds.wastage_duration_minutes > 0 && wastage >= limits.retention {
        return Err(invalid(
            "thresholds.wastage_duration_minutes",
            format!(
                "{} min must be shorter than window.retention_minutes ({} min)",
                thresholds.wastage_duration_minutes,
                limits.retention.num_minutes()
            ),
        ));
    }
    if thresholds.stuck_window_size > limits.max_readings {
        return Err(invalid(
            "thresholds.stuck_window_size",
            format!("exceeds window.max_readings ({})", limits.max_readings),
        ));
    }
    if thresholds.trend_window_size > limits.max_readings {
        return Err(invalid(
            "thresholds.trend_window_size",
            format!("exceeds window.max_readings ({})", limits.max_readings),
        ));
    }
    Ok(())
}

// --- AppConfig methods ---

impl AppConfig {
    /// Load config from default path or create default config file
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined,
    /// the file cannot be read, or the TOML content is invalid.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_or_create(&path)
    }

    /// Load from a specific path, or create a default config file if missing
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is invalid,
    /// or the default config file cannot be written.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Load from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML content is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save config to a specific path, creating parent directories if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created,
    /// serialization fails, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        let content = self.to_toml()?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Effective configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Validates every section and builds the engine settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on the first invalid value.
    pub fn evaluator_settings(&self) -> Result<EvaluatorSettings, ConfigError> {
        self.validate_io()?;
        let thresholds = DetectorThresholds::try_from(&self.thresholds)?;
        let limits = WindowLimits::try_from(&self.window)?;
        check_window_fits(&thresholds, &limits)?;
        Ok(EvaluatorSettings {
            thresholds,
            limits,
            policy: LifecyclePolicy::try_from(&self.lifecycle)?,
            fetch_timeout: positive_secs("general.fetch_timeout_secs", self.general.fetch_timeout_secs)?,
            emit_timeout: positive_secs("general.emit_timeout_secs", self.general.emit_timeout_secs)?,
            broadcast_live_status: self.general.broadcast_live_status,
        })
    }

    /// Evaluation loop period.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the interval is zero.
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        positive_secs("general.interval_secs", self.general.interval_secs)
    }

    fn validate_io(&self) -> Result<(), ConfigError> {
        self.interval()?;
        if self.source.kind == SourceKind::File && self.source.path.trim().is_empty() {
            return Err(invalid("source.path", "required when source.kind = \"file\""));
        }
        let uses_mqtt = self.source.kind == SourceKind::Mqtt || self.sinks.mqtt;
        if uses_mqtt {
            if self.mqtt.host.trim().is_empty() {
                return Err(invalid("mqtt.host", "must not be empty"));
            }
            if self.mqtt.port == 0 {
                return Err(invalid("mqtt.port", "must not be zero"));
            }
            if self.mqtt.coalesce_ms == 0 {
                return Err(invalid("mqtt.coalesce_ms", "must be greater than zero"));
            }
        }
        Ok(())
    }

    /// Default config location under the user config directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("roomguard").join("config.toml"))
    }
}
