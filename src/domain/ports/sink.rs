use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::alert::AlertEvent;
use crate::domain::entities::reading::Reading;

#[derive(Error, Debug)]
pub enum EmissionError {
    #[error("failed to emit alert event: {0}")]
    SendFailed(String),
    #[error("alert channel unavailable: {0}")]
    ChannelUnavailable(String),
    #[error("timeout while emitting alert event")]
    Timeout,
}

#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one lifecycle event. Called once per transition; the sink owns
    /// any retry policy.
    ///
    /// # Errors
    ///
    /// Returns `EmissionError` if the event could not be delivered.
    async fn emit(&self, event: &AlertEvent) -> Result<(), EmissionError>;

    /// Publish the latest reading of every room for live dashboards.
    ///
    /// # Errors
    ///
    /// Returns `EmissionError` if the status could not be delivered.
    async fn publish_live_status(&self, _latest: &[Reading]) -> Result<(), EmissionError> {
        Ok(())
    }
}
