use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use roomguard::application::config::{AppConfig, SourceKind};
use roomguard::application::services::evaluator::Evaluator;
use roomguard::domain::detectors::DetectorEngine;
use roomguard::domain::ports::sink::AlertSink;
use roomguard::domain::ports::source::TelemetrySource;
use roomguard::domain::value_objects::severity::Severity;
use roomguard::infrastructure::mqtt::sink::MqttAlertSink;
use roomguard::infrastructure::mqtt::source::MqttTelemetrySource;
use roomguard::infrastructure::mqtt::MqttConnection;
use roomguard::infrastructure::sinks::composite::CompositeSink;
use roomguard::infrastructure::sinks::log_file::LogFileSink;
use roomguard::infrastructure::sinks::terminal::TerminalSink;
use roomguard::infrastructure::sinks::webhook::WebhookSink;
use roomguard::infrastructure::sources::replay_file::ReplayFileSource;
use roomguard::presentation::cli::app::{Cli, Commands};
use roomguard::presentation::cli::commands::config::run_config;
use roomguard::presentation::cli::commands::daemon::{run_daemon, shutdown_signal};
use roomguard::presentation::cli::commands::scan::run_scan;

fn print_banner() {
    println!("{}", "━".repeat(40).cyan());
    println!("{}", "  ROOMGUARD: Room Telemetry Watchdog".bold().cyan());
    println!("{}", "━".repeat(40).cyan());
}

/// `RUST_LOG` wins over the `--verbose` default when set.
fn setup_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn open_mqtt(config: &AppConfig) -> Option<Arc<MqttConnection>> {
    let reads = config.source.kind == SourceKind::Mqtt;
    if !reads && !config.sinks.mqtt {
        return None;
    }
    let topic = reads.then(|| config.mqtt.readings_topic.clone());
    Some(Arc::new(MqttConnection::connect(&config.mqtt, topic)))
}

fn build_source(
    config: &AppConfig,
    mqtt: Option<&Arc<MqttConnection>>,
) -> anyhow::Result<Box<dyn TelemetrySource>> {
    match config.source.kind {
        SourceKind::File => Ok(Box::new(ReplayFileSource::new(
            &config.source.path,
            config.source.rebase_timestamps,
        ))),
        SourceKind::Mqtt => {
            let connection =
                mqtt.ok_or_else(|| anyhow::anyhow!("MQTT source configured without a connection"))?;
            Ok(Box::new(MqttTelemetrySource::new(Arc::clone(connection))))
        }
    }
}

fn build_sinks(
    config: &AppConfig,
    mqtt: Option<&Arc<MqttConnection>>,
) -> anyhow::Result<CompositeSink> {
    let mut sinks: Vec<Box<dyn AlertSink>> = Vec::new();
    if config.sinks.terminal {
        sinks.push(Box::new(TerminalSink::new()));
    }
    if let Some(ref path) = config.sinks.log_file {
        sinks.push(Box::new(LogFileSink::new(path)));
    }
    if let Some(ref url) = config.sinks.webhook_url {
        let min_severity = config.sinks.webhook_min_severity.unwrap_or(Severity::High);
        sinks.push(Box::new(WebhookSink::new(url.clone(), min_severity)?));
    }
    if config.sinks.mqtt {
        if let Some(connection) = mqtt {
            sinks.push(Box::new(MqttAlertSink::new(
                Arc::clone(connection),
                config.mqtt.alerts_topic.clone(),
                config.mqtt.live_topic.clone(),
            )));
        }
    }
    if sinks.is_empty() {
        tracing::warn!("No alert sink enabled, events will only be logged");
    }
    Ok(CompositeSink::new(sinks))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    let config_path = match cli.config {
        Some(ref path) => path.clone(),
        None => AppConfig::config_path()?,
    };
    let config = if cli.config.is_some() {
        AppConfig::load_from(&config_path)?
    } else {
        AppConfig::load_or_create(&config_path)?
    };

    if let Some(Commands::Config { check }) = cli.command {
        return run_config(&config, &config_path, check);
    }

    // Refuse to start on an invalid configuration
    let settings = config.evaluator_settings()?;
    let period = config.interval()?;

    // Manual DI: main.rs is the only place that knows concrete types
    let mqtt = open_mqtt(&config);
    let source = build_source(&config, mqtt.as_ref())?;
    let engine = DetectorEngine::default();

    match cli.command {
        Some(Commands::Scan { json }) => {
            if mqtt.is_some() && config.source.kind == SourceKind::Mqtt {
                // let the broker deliver a batch before the single cycle
                tokio::time::sleep(period.max(Duration::from_millis(config.mqtt.coalesce_ms))).await;
            }
            let sink = CompositeSink::new(vec![]);
            let mut scan_settings = settings;
            scan_settings.broadcast_live_status = false;
            let mut evaluator = Evaluator::new(&*source, &sink, &engine, scan_settings);
            let report = run_scan(&mut evaluator, json).await?;
            tracing::debug!("Scan complete: {} event(s)", report.events.len());
        }
        Some(Commands::Daemon) | None => {
            print_banner();
            println!("Config: {}", config_path.display().to_string().dimmed());
            let sink = build_sinks(&config, mqtt.as_ref())?;
            let mut evaluator = Evaluator::new(&*source, &sink, &engine, settings);
            run_daemon(&mut evaluator, period, shutdown_signal()).await?;
        }
        // handled before any connection is opened
        Some(Commands::Config { .. }) => {}
    }

    if let Some(connection) = mqtt {
        connection.disconnect().await;
    }

    Ok(())
}
