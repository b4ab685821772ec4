use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::domain::entities::reading::RawReading;
use crate::domain::ports::source::{FetchError, TelemetrySource};

use super::MqttConnection;

/// Live telemetry from the broker subscription. Each fetch hands over the
/// readings assembled since the previous one.
pub struct MqttTelemetrySource {
    connection: Arc<MqttConnection>,
}

impl MqttTelemetrySource {
    #[must_use]
    pub const fn new(connection: Arc<MqttConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl TelemetrySource for MqttTelemetrySource {
    async fn fetch_recent(
        &self,
        room: Option<&str>,
        window: Duration,
    ) -> Result<Vec<RawReading>, FetchError> {
        let cutoff = Utc::now() - window;
        let readings = self
            .connection
            .drain_readings(|r| room.map_or(true, |wanted| r.room == wanted));

        if readings.is_empty() && !self.connection.is_connected() {
            return Err(FetchError::Unavailable("MQTT broker not connected".into()));
        }

        Ok(readings
            .into_iter()
            .filter(|r| r.timestamp.map_or(true, |ts| ts >= cutoff))
            .collect())
    }
}
