//! One long-lived broker connection shared by the MQTT source and sink.

pub mod assembler;
pub mod sink;
pub mod source;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;

use crate::application::config::MqttConfig;
use crate::domain::entities::reading::RawReading;

use self::assembler::ReadingAssembler;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub struct MqttConnection {
    client: AsyncClient,
    assembler: Arc<Mutex<ReadingAssembler>>,
    connected: Arc<AtomicBool>,
    event_loop: JoinHandle<()>,
}

impl MqttConnection {
    /// Starts the event loop. When `readings_topic` is given it is
    /// (re)subscribed on every connect and incoming telemetry is buffered.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn connect(config: &MqttConfig, readings_topic: Option<String>) -> Self {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, mut eventloop) = AsyncClient::new(options, 100);
        let coalesce =
            chrono::Duration::milliseconds(i64::try_from(config.coalesce_ms).unwrap_or(i64::MAX));
        let assembler = Arc::new(Mutex::new(ReadingAssembler::new(coalesce)));
        let connected = Arc::new(AtomicBool::new(false));

        let task_client = client.clone();
        let task_assembler = Arc::clone(&assembler);
        let task_connected = Arc::clone(&connected);
        let broker = format!("{}:{}", config.host, config.port);

        let event_loop = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        tracing::info!("MQTT connected to {broker}");
                        task_connected.store(true, Ordering::SeqCst);
                        if let Some(ref topic) = readings_topic {
                            if let Err(e) = task_client.try_subscribe(topic, QoS::AtLeastOnce) {
                                tracing::warn!("MQTT subscribe to {topic} failed: {e}");
                            }
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(msg))) => {
                        route_publish(&task_assembler, &msg.topic, &msg.payload);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        task_connected.store(false, Ordering::SeqCst);
                        tracing::warn!("MQTT connection error: {e}");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        });

        Self {
            client,
            assembler,
            connected,
            event_loop,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Feeds a message through the telemetry assembler as if it came from the broker.
    pub fn ingest_message(&self, topic: &str, payload: &[u8]) {
        route_publish(&self.assembler, topic, payload);
    }

    /// Takes buffered readings accepted by `keep`.
    pub fn drain_readings(&self, keep: impl Fn(&RawReading) -> bool) -> Vec<RawReading> {
        self.assembler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain_where(Utc::now(), keep)
    }

    pub(crate) async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> Result<(), rumqttc::ClientError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
    }

    /// Sends DISCONNECT and stops the event loop.
    pub async fn disconnect(&self) {
        if let Err(e) = self.client.disconnect().await {
            tracing::debug!("MQTT disconnect failed: {e}");
        }
        self.event_loop.abort();
    }
}

impl Drop for MqttConnection {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

fn route_publish(assembler: &Mutex<ReadingAssembler>, topic: &str, payload: &[u8]) {
    let result = assembler
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .ingest(topic, payload, Utc::now());
    if let Err(e) = result {
        tracing::warn!("Telemetry message on {topic} dropped: {e}");
    }
}
