use std::borrow::Cow;

use async_trait::async_trait;
use colored::Colorize;

use crate::domain::entities::alert::{AlertEvent, EventKind};
use crate::domain::ports::sink::{AlertSink, EmissionError};
use crate::domain::value_objects::severity::Severity;

const SEPARATOR_WIDTH: usize = 70;

/// Prints alert events to stdout.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl TerminalSink {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn render(event: &AlertEvent) -> String {
        let separator = "\u{2500}".repeat(SEPARATOR_WIDTH);
        let headline = match event.kind {
            EventKind::Raise => format!(
                "{} {} {}",
                severity_badge(event.severity),
                sanitize(&event.room).bold(),
                event.condition.to_string().bold()
            ),
            EventKind::Resolve => format!(
                "{} {} {}",
                " \u{2714} RESOLVED ".on_green().black().bold(),
                sanitize(&event.room).bold(),
                event.condition
            ),
        };
        format!(
            "{}\n{headline}\n{}\n{}",
            separator.dimmed(),
            sanitize(&event.message),
            event.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string().dimmed()
        )
    }
}

#[async_trait]
impl AlertSink for TerminalSink {
    async fn emit(&self, event: &AlertEvent) -> Result<(), EmissionError> {
        println!("{}", Self::render(event));
        Ok(())
    }
}

/// Strip ANSI escape sequences and C0/C1 control characters from a string,
/// preserving only printable content, newlines, and tabs.
pub(crate) fn sanitize(s: &str) -> Cow<'_, str> {
    if s.bytes()
        .any(|b| matches!(b, 0x00..=0x08 | 0x0B..=0x0C | 0x0E..=0x1F | 0x7F))
    {
        Cow::Owned(
            s.chars()
                .filter(|&c| !matches!(c as u32, 0x00..=0x08 | 0x0B..=0x0C | 0x0E..=0x1F | 0x7F))
                .collect(),
        )
    } else {
        Cow::Borrowed(s)
    }
}

#[must_use]
pub(crate) fn severity_badge(severity: Severity) -> String {
    let label = format!(" {} {} ", severity.emoji(), severity);
    match severity {
        Severity::Critical => label.on_red().white().bold().to_string(),
        Severity::High => label.on_yellow().black().bold().to_string(),
        Severity::Medium => label.on_bright_yellow().black().to_string(),
        Severity::Low => label.on_blue().white().to_string(),
    }
}
