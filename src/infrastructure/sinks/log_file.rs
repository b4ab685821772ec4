use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::entities::alert::AlertEvent;
use crate::domain::ports::sink::{AlertSink, EmissionError};

const DEFAULT_LOG_PATH: &str = "~/.local/share/roomguard/alerts.jsonl";

/// Appends every event as one JSON line.
pub struct LogFileSink {
    path: PathBuf,
}

impl LogFileSink {
    #[must_use]
    pub fn new(path: &str) -> Self {
        let expanded = shellexpand::tilde(path);
        Self {
            path: PathBuf::from(expanded.as_ref()),
        }
    }

    fn append_json_line(&self, event: &AlertEvent) -> Result<(), EmissionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                EmissionError::ChannelUnavailable(format!("cannot create log directory: {e}"))
            })?;
        }

        let json = serde_json::to_string(event)
            .map_err(|e| EmissionError::SendFailed(format!("cannot serialize event: {e}")))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                EmissionError::ChannelUnavailable(format!("cannot open log file: {e}"))
            })?;

        writeln!(file, "{json}")
            .map_err(|e| EmissionError::SendFailed(format!("cannot write log file: {e}")))
    }
}

impl Default for LogFileSink {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_PATH)
    }
}

#[async_trait]
impl AlertSink for LogFileSink {
    async fn emit(&self, event: &AlertEvent) -> Result<(), EmissionError> {
        self.append_json_line(event)
    }
}
