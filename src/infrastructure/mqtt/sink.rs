use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::entities::alert::AlertEvent;
use crate::domain::entities::reading::Reading;
use crate::domain::ports::sink::{AlertSink, EmissionError};

use super::MqttConnection;

/// Publishes alert events and live room status on the shared broker connection.
pub struct MqttAlertSink {
    connection: Arc<MqttConnection>,
    alerts_topic: String,
    live_topic: String,
}

impl MqttAlertSink {
    #[must_use]
    pub const fn new(connection: Arc<MqttConnection>, alerts_topic: String, live_topic: String) -> Self {
        Self {
            connection,
            alerts_topic,
            live_topic,
        }
    }

    /// `{ "<room>": <latest reading>, ... }`
    #[must_use]
    pub fn live_status_payload(latest: &[Reading]) -> Value {
        let rooms: Map<String, Value> = latest
            .iter()
            .filter_map(|r| serde_json::to_value(r).ok().map(|v| (r.room.clone(), v)))
            .collect();
        Value::Object(rooms)
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), EmissionError> {
        if !self.connection.is_connected() {
            return Err(EmissionError::ChannelUnavailable(
                "MQTT broker not connected".into(),
            ));
        }
        self.connection
            .publish(topic, payload)
            .await
            .map_err(|e| EmissionError::SendFailed(format!("MQTT publish to {topic}: {e}")))
    }
}

#[async_trait]
impl AlertSink for MqttAlertSink {
    async fn emit(&self, event: &AlertEvent) -> Result<(), EmissionError> {
        let payload = serde_json::to_vec(event)
            .map_err(|e| EmissionError::SendFailed(format!("cannot serialize event: {e}")))?;
        self.publish(&self.alerts_topic, payload).await
    }

    async fn publish_live_status(&self, latest: &[Reading]) -> Result<(), EmissionError> {
        let payload = serde_json::to_vec(&Self::live_status_payload(latest))
            .map_err(|e| EmissionError::SendFailed(format!("cannot serialize status: {e}")))?;
        self.publish(&self.live_topic, payload).await
    }
}
