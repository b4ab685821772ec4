use crate::application::services::evaluator::{CycleReport, Evaluator};
use crate::presentation::cli::formatters::event_fmt;

/// Runs one evaluation cycle and prints the outcome.
///
/// The evaluator handed in here is wired to a sink that delivers nothing, so
/// a scan never notifies anyone.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub async fn run_scan(evaluator: &mut Evaluator<'_>, json: bool) -> anyhow::Result<CycleReport> {
    let report = evaluator.run_once().await;

    if json {
        print_report_json(&report)?;
    } else {
        print_report_human(&report);
    }

    Ok(report)
}

fn print_report_json(report: &CycleReport) -> anyhow::Result<()> {
    let output = serde_json::to_string_pretty(report)?;
    println!("{output}");
    Ok(())
}

fn print_report_human(report: &CycleReport) {
    event_fmt::print_section_header("🔍 Room scan");
    println!("{}", event_fmt::format_summary(report));
    if report.events.is_empty() {
        event_fmt::print_no_events();
    } else {
        println!("{} alert event(s):", report.events.len());
        event_fmt::format_events(&report.events);
    }
}
