use colored::Colorize;

use crate::application::services::evaluator::CycleReport;
use crate::domain::entities::alert::{AlertEvent, EventKind};
use crate::infrastructure::sinks::terminal::{sanitize, severity_badge};

pub fn print_section_header(title: &str) {
    println!("{}", title.bold().cyan());
    let display_width = title.chars().count();
    println!("{}", "─".repeat(display_width).cyan());
}

/// One line per event: kind, severity, room, condition, message.
#[must_use]
pub fn format_event_line(event: &AlertEvent) -> String {
    let kind = match event.kind {
        EventKind::Raise => "RAISE  ".red().bold(),
        EventKind::Resolve => "RESOLVE".green().bold(),
    };
    format!(
        "{kind} {} {} {:<28} {}",
        severity_badge(event.severity),
        format!("{:<8}", sanitize(&event.room)).bold(),
        event.condition.to_string(),
        sanitize(&event.message).dimmed()
    )
}

pub fn format_events(events: &[AlertEvent]) {
    println!();
    for event in events {
        println!("{}", format_event_line(event));
    }
    println!();
}

pub fn print_no_events() {
    println!();
    println!("{}", "✅ All rooms nominal, no alert events".green().bold());
    println!();
}

#[must_use]
pub fn format_summary(report: &CycleReport) -> String {
    let mut summary = format!(
        "{} room(s) evaluated, {} reading(s) accepted, {} rejected, {} duplicate",
        report.rooms_evaluated,
        report.readings_accepted,
        report.readings_rejected,
        report.readings_duplicate
    );
    if let Some(ref e) = report.fetch_error {
        summary.push_str(&format!(" (fetch failed: {e})"));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::condition::{Condition, ConditionKey};
    use crate::domain::value_objects::severity::Severity;
    use chrono::Utc;
    use colored::control;

    fn disable_colors() {
        control::set_override(false);
    }

    #[test]
    fn event_line_contains_fields() {
        disable_colors();
        let event = AlertEvent::raise(
            &ConditionKey::new("101", Condition::EnergyWastage),
            Severity::High,
            "empty but drawing 1500 W",
            Utc::now(),
        );
        let line = format_event_line(&event);
        assert!(line.starts_with("RAISE"));
        assert!(line.contains("HIGH"));
        assert!(line.contains("101"));
        assert!(line.contains("EnergyWastage"));
        assert!(line.contains("1500 W"));
    }

    #[test]
    fn event_line_strips_escape_sequences() {
        disable_colors();
        let event = AlertEvent::raise(
            &ConditionKey::new("1\x1b[2J01", Condition::GasLeak),
            Severity::Critical,
            "gas\x1b]0;pwn\x07",
            Utc::now(),
        );
        assert!(!format_event_line(&event).contains('\x1b'));
    }

    #[test]
    fn summary_mentions_fetch_error() {
        let report = CycleReport {
            rooms_evaluated: 2,
            readings_accepted: 7,
            fetch_error: Some("broker down".into()),
            ..CycleReport::default()
        };
        let summary = format_summary(&report);
        assert!(summary.starts_with("2 room(s) evaluated, 7 reading(s) accepted"));
        assert!(summary.contains("broker down"));
    }
}
