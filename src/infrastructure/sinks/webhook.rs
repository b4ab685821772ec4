use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::entities::alert::{AlertEvent, EventKind};
use crate::domain::ports::sink::{AlertSink, EmissionError};
use crate::domain::value_objects::severity::Severity;

/// Webhook payload format, auto-detected from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WebhookFormat {
    Slack,
    Discord,
    Generic,
}

/// Posts alert events to an HTTP webhook endpoint.
///
/// Supports Slack (colored attachments), Discord (embeds) and generic JSON
/// payloads. Events below `min_severity` are skipped.
pub struct WebhookSink {
    url: String,
    client: reqwest::Client,
    min_severity: Severity,
}

impl WebhookSink {
    /// Creates a webhook sink targeting the given URL.
    ///
    /// # Errors
    ///
    /// Returns `EmissionError::ChannelUnavailable` if the HTTP client
    /// cannot be initialized (e.g. TLS backend failure).
    pub fn new(url: String, min_severity: Severity) -> Result<Self, EmissionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| {
                EmissionError::ChannelUnavailable(format!("cannot build HTTP client: {e}"))
            })?;

        Ok(Self {
            url,
            client,
            min_severity,
        })
    }

    fn detect_format(&self) -> WebhookFormat {
        // Compare the host only, so paths containing "slack" do not match
        let host = self
            .url
            .split("//")
            .nth(1)
            .and_then(|s| s.split('/').next())
            .and_then(|h| h.split(':').next())
            .unwrap_or("");

        if host == "hooks.slack.com" {
            WebhookFormat::Slack
        } else if host == "discord.com" || host == "discordapp.com" {
            WebhookFormat::Discord
        } else {
            WebhookFormat::Generic
        }
    }

    const fn severity_color_hex(event: &AlertEvent) -> &'static str {
        match (event.kind, event.severity) {
            (EventKind::Resolve, _) => "#2ECC71",
            (EventKind::Raise, Severity::Low) => "#3498DB",
            (EventKind::Raise, Severity::Medium) => "#E67E22",
            (EventKind::Raise, Severity::High) => "#E74C3C",
            (EventKind::Raise, Severity::Critical) => "#FF0000",
        }
    }

    const fn severity_color_decimal(event: &AlertEvent) -> u32 {
        match (event.kind, event.severity) {
            (EventKind::Resolve, _) => 0x00_2E_CC_71,
            (EventKind::Raise, Severity::Low) => 0x00_34_98_DB,
            (EventKind::Raise, Severity::Medium) => 0x00_E6_7E_22,
            (EventKind::Raise, Severity::High) => 0x00_E7_4C_3C,
            (EventKind::Raise, Severity::Critical) => 0x00_FF_00_00,
        }
    }

    fn title(event: &AlertEvent) -> String {
        match event.kind {
            EventKind::Raise => format!(
                "{} {} in room {}",
                event.severity.emoji(),
                event.condition,
                event.room
            ),
            EventKind::Resolve => format!("\u{2705} {} resolved in room {}", event.condition, event.room),
        }
    }

    fn format_event(&self, event: &AlertEvent) -> Value {
        match self.detect_format() {
            WebhookFormat::Slack => Self::format_slack(event),
            WebhookFormat::Discord => Self::format_discord(event),
            WebhookFormat::Generic => Self::format_generic(event),
        }
    }

    fn format_slack(event: &AlertEvent) -> Value {
        json!({
            "attachments": [{
                "color": Self::severity_color_hex(event),
                "blocks": [
                    {
                        "type": "header",
                        "text": { "type": "plain_text", "text": Self::title(event) }
                    },
                    {
                        "type": "section",
                        "fields": [
                            { "type": "mrkdwn", "text": format!("*Severity:*\n{}", event.severity) },
                            { "type": "mrkdwn", "text": format!("*Room:*\n{}", event.room) }
                        ]
                    },
                    {
                        "type": "section",
                        "text": { "type": "mrkdwn", "text": &event.message }
                    }
                ]
            }]
        })
    }

    fn format_discord(event: &AlertEvent) -> Value {
        json!({
            "username": "RoomGuard",
            "embeds": [{
                "title": Self::title(event),
                "description": &event.message,
                "color": Self::severity_color_decimal(event),
                "fields": [
                    { "name": "Severity", "value": event.severity.to_string(), "inline": true },
                    { "name": "Room", "value": &event.room, "inline": true }
                ],
                "timestamp": event.timestamp.to_rfc3339()
            }]
        })
    }

    fn format_generic(event: &AlertEvent) -> Value {
        json!({
            "source": "roomguard",
            "type": event.kind.to_string(),
            "room": &event.room,
            "condition": event.condition.to_string(),
            "severity": event.severity.to_string(),
            "message": &event.message,
            "timestamp": event.timestamp.to_rfc3339()
        })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    async fn emit(&self, event: &AlertEvent) -> Result<(), EmissionError> {
        if event.severity < self.min_severity {
            return Ok(());
        }
        let payload = self.format_event(event);
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmissionError::Timeout
                } else {
                    EmissionError::ChannelUnavailable(format!("webhook request failed: {e}"))
                }
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(EmissionError::SendFailed(format!(
                "webhook returned HTTP {}",
                response.status()
            )))
        }
    }
}
