use std::future::Future;
use std::time::Duration;

use crate::application::services::evaluator::Evaluator;

/// Run the evaluation loop at `period` until `shutdown` completes.
///
/// A cycle that is already running when shutdown fires is finished first, so
/// its alert events are delivered. Missed ticks are skipped rather than
/// replayed back to back.
///
/// # Errors
///
/// Never fails today; cycle-level problems are logged and the loop continues.
pub async fn run_daemon(
    evaluator: &mut Evaluator<'_>,
    period: Duration,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    tracing::info!("Daemon started (interval: {}s)", period.as_secs_f64());
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping");
                println!("\nStopping roomguard...");
                break;
            }
            _ = interval.tick() => {
                let report = evaluator.run_once().await;
                tracing::info!(
                    "Cycle complete: {} reading(s), {} room(s), {} event(s), {} emission failure(s)",
                    report.readings_accepted,
                    report.rooms_evaluated,
                    report.events.len(),
                    report.emission_failures
                );
            }
        }
    }
    Ok(())
}

/// Resolves on Ctrl+C, or on SIGTERM where the platform has it.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
