use std::path::Path;

use colored::Colorize;

use crate::application::config::AppConfig;
use crate::presentation::cli::formatters::event_fmt::print_section_header;

/// Prints the effective configuration, or with `check` only validates it.
///
/// # Errors
///
/// Returns an error if any configured value is invalid or serialization fails.
pub fn run_config(config: &AppConfig, path: &Path, check: bool) -> anyhow::Result<()> {
    config.evaluator_settings()?;

    if check {
        println!(
            "{} {}",
            "✔ Configuration valid:".green().bold(),
            path.display()
        );
        return Ok(());
    }

    print_section_header(&format!("⚙ Configuration ({})", path.display()));
    println!("{}", config.to_toml()?);
    Ok(())
}
