use async_trait::async_trait;
use chrono::Duration;
use thiserror::Error;

use crate::domain::entities::reading::RawReading;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("telemetry source unavailable: {0}")]
    Unavailable(String),
    #[error("timeout while fetching readings")]
    Timeout,
    #[error("malformed telemetry batch: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch readings no older than `window`, for one room or all rooms.
    ///
    /// Readings come back unvalidated; the caller rejects those without a
    /// timestamp or with impossible values.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the source is unreachable, times out,
    /// or delivers a batch that cannot be decoded at all.
    async fn fetch_recent(
        &self,
        room: Option<&str>,
        window: Duration,
    ) -> Result<Vec<RawReading>, FetchError>;
}
