use async_trait::async_trait;

use crate::domain::entities::alert::AlertEvent;
use crate::domain::entities::reading::Reading;
use crate::domain::ports::sink::{AlertSink, EmissionError};

/// Forwards events to multiple sinks.
///
/// Calls each sink in order and always calls all of them.
/// Returns the first error encountered (if any).
pub struct CompositeSink {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl CompositeSink {
    #[must_use]
    pub fn new(sinks: Vec<Box<dyn AlertSink>>) -> Self {
        Self { sinks }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Default for CompositeSink {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl AlertSink for CompositeSink {
    async fn emit(&self, event: &AlertEvent) -> Result<(), EmissionError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.emit(event).await {
                tracing::warn!("Sink delivery failed: {e}");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn publish_live_status(&self, latest: &[Reading]) -> Result<(), EmissionError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.publish_live_status(latest).await {
                tracing::warn!("Live status delivery failed: {e}");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
