use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;

use crate::application::services::lifecycle::AlertLifecycle;
use crate::application::services::window_store::WindowStore;
use crate::domain::detectors::DetectorEngine;
use crate::domain::entities::alert::AlertEvent;
use crate::domain::entities::reading::{RawReading, Reading};
use crate::domain::ports::sink::{AlertSink, EmissionError};
use crate::domain::ports::source::{FetchError, TelemetrySource};
use crate::domain::value_objects::lifecycle_policy::{LifecyclePolicy, WindowLimits};
use crate::domain::value_objects::thresholds::DetectorThresholds;

/// Everything the evaluation loop needs besides its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorSettings {
    pub thresholds: DetectorThresholds,
    pub limits: WindowLimits,
    pub policy: LifecyclePolicy,
    pub fetch_timeout: Duration,
    pub emit_timeout: Duration,
    pub broadcast_live_status: bool,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            thresholds: DetectorThresholds::default(),
            limits: WindowLimits::default(),
            policy: LifecyclePolicy::default(),
            fetch_timeout: Duration::from_secs(3),
            emit_timeout: Duration::from_secs(3),
            broadcast_live_status: false,
        }
    }
}

/// Outcome of one evaluation cycle.
#[derive(Debug, Default, Serialize)]
pub struct CycleReport {
    pub readings_accepted: usize,
    pub readings_duplicate: usize,
    pub readings_rejected: usize,
    pub readings_evicted: usize,
    pub rooms_evaluated: usize,
    pub events: Vec<AlertEvent>,
    pub emission_failures: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl CycleReport {
    #[must_use]
    pub fn events_emitted(&self) -> usize {
        self.events.len() - self.emission_failures
    }
}

/// Orchestrates a cycle: fetch → validate → window → detect → lifecycle → emit.
pub struct Evaluator<'a> {
    source: &'a dyn TelemetrySource,
    sink: &'a dyn AlertSink,
    engine: &'a DetectorEngine,
    settings: EvaluatorSettings,
    store: WindowStore,
    lifecycle: AlertLifecycle,
}

impl<'a> Evaluator<'a> {
    #[must_use]
    pub fn new(
        source: &'a dyn TelemetrySource,
        sink: &'a dyn AlertSink,
        engine: &'a DetectorEngine,
        settings: EvaluatorSettings,
    ) -> Self {
        let store = WindowStore::new(settings.limits);
        let lifecycle = AlertLifecycle::new(settings.policy);
        Self {
            source,
            sink,
            engine,
            settings,
            store,
            lifecycle,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &EvaluatorSettings {
        &self.settings
    }

    #[must_use]
    pub const fn store(&self) -> &WindowStore {
        &self.store
    }

    #[must_use]
    pub const fn lifecycle(&self) -> &AlertLifecycle {
        &self.lifecycle
    }

    /// Run a single cycle stamped with the current time.
    pub async fn run_once(&mut self) -> CycleReport {
        self.run_cycle(Utc::now()).await
    }

    /// Run a single evaluation cycle at `now`.
    ///
    /// A failed fetch still sweeps every known room, so conditions resolve as
    /// data ages out. Emission failures are counted and logged, never retried.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport::default();

        match self.fetch().await {
            Ok(batch) => self.ingest(batch, &mut report),
            Err(e) => {
                tracing::warn!("Telemetry fetch failed: {e}");
                report.fetch_error = Some(e.to_string());
            }
        }

        report.readings_evicted = self.store.evict_expired(now);

        let mut rooms: BTreeSet<String> = self.store.rooms().into_iter().collect();
        rooms.extend(self.lifecycle.active_rooms());
        report.rooms_evaluated = rooms.len();

        let mut events = Vec::new();
        for room in &rooms {
            let window = self.store.snapshot(room);
            let hits = self.engine.analyze(&window, &self.settings.thresholds);
            events.extend(self.lifecycle.evaluate_room(room, &hits, now));
        }

        if events.is_empty() {
            tracing::debug!("{} room(s) evaluated, no new events", rooms.len());
        } else {
            tracing::info!("{} alert event(s) this cycle", events.len());
        }

        report.emission_failures = self.emit_all(&events).await;
        report.events = events;

        if self.settings.broadcast_live_status {
            self.broadcast_live_status().await;
        }

        report
    }

    async fn fetch(&self) -> Result<Vec<RawReading>, FetchError> {
        let request = self
            .source
            .fetch_recent(None, self.settings.limits.retention);
        tokio::time::timeout(self.settings.fetch_timeout, request)
            .await
            .unwrap_or(Err(FetchError::Timeout))
    }

    fn ingest(
        &mut self,
        batch: Vec<RawReading>,
        report: &mut CycleReport,
    ) {
        for raw in batch {
            match Reading::try_from(raw) {
                Ok(reading) => {
                    if self.store.append(reading) {
                        report.readings_accepted += 1;
                    } else {
                        report.readings_duplicate += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!("Reading rejected: {e}");
                    report.readings_rejected += 1;
                }
            }
        }
    }

    /// Emits every event concurrently, each under its own timeout, so one
    /// slow delivery cannot hold back the rest. Returns the failure count.
    async fn emit_all(&self, events: &[AlertEvent]) -> usize {
        let sink = self.sink;
        let timeout = self.settings.emit_timeout;
        let outcomes = join_all(events.iter().map(|event| async move {
            let outcome = tokio::time::timeout(timeout, sink.emit(event))
                .await
                .unwrap_or(Err(EmissionError::Timeout));
            (event, outcome)
        }))
        .await;

        outcomes
            .into_iter()
            .filter(|(event, outcome)| match outcome {
                Ok(()) => false,
                Err(e) => {
                    tracing::warn!("Alert event {} for {} dropped: {e}", event.kind, event.key());
                    true
                }
            })
            .count()
    }

    async fn broadcast_live_status(&self) {
        let latest = self.store.latest_by_room();
        if latest.is_empty() {
            return;
        }
        let publish = self.sink.publish_live_status(&latest);
        match tokio::time::timeout(self.settings.emit_timeout, publish).await {
            Ok(Ok(())) => tracing::debug!("Live status published for {} room(s)", latest.len()),
            Ok(Err(e)) => tracing::warn!("Live status publish failed: {e}"),
            Err(_) => tracing::warn!("Live status publish timed out"),
        }
    }
}
