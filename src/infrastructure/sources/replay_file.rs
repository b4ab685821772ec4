use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::domain::entities::reading::RawReading;
use crate::domain::ports::source::{FetchError, TelemetrySource};

/// Readings recorded as JSON lines, re-read on every fetch.
///
/// With `rebase` set, timestamps are shifted so the newest reading in the file
/// lands at the time of the fetch, which lets old recordings drive the live
/// window. Lines that do not parse are skipped; readings without a timestamp
/// are passed through for the caller to reject.
pub struct ReplayFileSource {
    path: PathBuf,
    rebase: bool,
}

impl ReplayFileSource {
    #[must_use]
    pub fn new(path: &str, rebase: bool) -> Self {
        let expanded = shellexpand::tilde(path);
        Self {
            path: PathBuf::from(expanded.as_ref()),
            rebase,
        }
    }

    fn parse(&self, content: &str) -> Vec<RawReading> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(i, line)| match serde_json::from_str::<RawReading>(line) {
                Ok(reading) => Some(reading),
                Err(e) => {
                    tracing::warn!("{}:{}: skipping malformed line: {e}", self.path.display(), i + 1);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl TelemetrySource for ReplayFileSource {
    async fn fetch_recent(
        &self,
        room: Option<&str>,
        window: Duration,
    ) -> Result<Vec<RawReading>, FetchError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            FetchError::Unavailable(format!("cannot read {}: {e}", self.path.display()))
        })?;

        let mut readings = self.parse(&content);
        let now = Utc::now();

        if self.rebase {
            if let Some(newest) = readings.iter().filter_map(|r| r.timestamp).max() {
                let shift = now - newest;
                for ts in readings.iter_mut().filter_map(|r| r.timestamp.as_mut()) {
                    *ts += shift;
                }
            }
        }

        let cutoff = now - window;
        Ok(readings
            .into_iter()
            .filter(|r| room.map_or(true, |wanted| r.room == wanted))
            .filter(|r| r.timestamp.map_or(true, |ts| ts >= cutoff && ts <= now))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    const RECORDING: &str = r#"{"room": "101", "timestamp": "2026-03-02T09:00:00Z", "occupancy": 0, "power": 1500}
{"room": 202, "timestamp": "2026-03-02T09:00:05Z", "temp": 22.0, "PIR": true}

not json at all
{"room": "101", "temperature": 21.0}
{"room": "101", "timestamp": "2026-03-02T08:40:00Z", "gas": 210}
"#;

    fn recording() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create tempfile");
        file.write_all(RECORDING.as_bytes()).expect("write");
        file
    }

    #[tokio::test]
    async fn rebased_replay_keeps_recent_window_and_untimed_rows() {
        let file = recording();
        let source = ReplayFileSource::new(file.path().to_str().expect("utf8"), true);
        let readings = source
            .fetch_recent(None, Duration::minutes(10))
            .await
            .expect("readable");

        // the 08:40 row is 20 minutes older than the newest one
        assert_eq!(readings.len(), 3);
        assert!(readings.iter().any(|r| r.room == "202"));
        assert!(readings.iter().any(|r| r.timestamp.is_none()));
        let newest = readings
            .iter()
            .filter_map(|r| r.timestamp)
            .max()
            .expect("timestamps");
        assert!(Utc::now() - newest < Duration::seconds(5));
    }

    #[tokio::test]
    async fn room_filter_applies() {
        let file = recording();
        let source = ReplayFileSource::new(file.path().to_str().expect("utf8"), true);
        let readings = source
            .fetch_recent(Some("202"), Duration::minutes(10))
            .await
            .expect("readable");
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].occupancy, Some(1.0));
    }

    #[tokio::test]
    async fn without_rebase_old_rows_fall_outside_window() {
        let file = recording();
        let source = ReplayFileSource::new(file.path().to_str().expect("utf8"), false);
        let readings = source
            .fetch_recent(None, Duration::minutes(10))
            .await
            .expect("readable");
        assert_eq!(readings.len(), 1);
        assert!(readings[0].timestamp.is_none());
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.jsonl");
        let source = ReplayFileSource::new(path.to_str().expect("utf8"), true);
        assert!(matches!(
            source.fetch_recent(None, Duration::minutes(10)).await,
            Err(FetchError::Unavailable(_))
        ));
    }
}
