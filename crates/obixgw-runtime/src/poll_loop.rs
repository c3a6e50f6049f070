//! Poll scheduler: wires gateway reads → decision engine → bus emitter.
//! Runs as a tokio task, one sequential cycle per poll period.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use obixgw_core::{
    Decision, FailureTracker, MappingConfig, PointMapping, PointReading, PointState, ReportAction,
    decide,
};
use obixgw_obix::{PointReader, RemoteReadError};

use crate::emitter::BusEmitter;

/// Outcome counters of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub emitted: usize,
    pub skipped: usize,
    pub read_failed: usize,
    /// Readings rejected by the point's bounds.
    pub discarded: usize,
    /// Emit decisions whose publish failed; those events are dropped.
    pub publish_failed: usize,
    /// Points left unread because shutdown was requested mid-cycle.
    pub not_polled: usize,
}

impl CycleReport {
    pub fn points(&self) -> usize {
        self.emitted + self.skipped + self.read_failed + self.discarded
    }
}

#[derive(Debug, Default)]
struct PointSlot {
    state: PointState,
    failures: FailureTracker,
}

/// Owns the per-point state for the lifetime of the daemon. Only the
/// scheduler task touches it, so no lock is needed.
pub struct PollScheduler<R, E> {
    config: Arc<MappingConfig>,
    reader: Arc<R>,
    emitter: E,
    points: HashMap<String, PointSlot>,
}

impl<R, E> PollScheduler<R, E>
where
    R: PointReader + 'static,
    E: BusEmitter,
{
    pub fn new(config: Arc<MappingConfig>, reader: Arc<R>, emitter: E) -> Self {
        let points = config
            .iter()
            .map(|m| (m.remote_id.clone(), PointSlot::default()))
            .collect();
        Self {
            config,
            reader,
            emitter,
            points,
        }
    }

    /// Current state of a mapped point.
    #[cfg(test)]
    pub fn state(&self, remote_id: &str) -> Option<&PointState> {
        self.points.get(remote_id).map(|slot| &slot.state)
    }

    /// Poll every mapped point once, in mapping order.
    ///
    /// A failure on one point is logged and never affects the others.
    /// All decisions of the cycle are taken against `now`.
    pub async fn poll_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        self.poll_points(now, None).await
    }

    /// Same as [`poll_cycle`](Self::poll_cycle), but stops before the
    /// next read once `cancel` fires. A read already in flight completes
    /// and its result is processed.
    async fn poll_points(
        &mut self,
        now: DateTime<Utc>,
        cancel: Option<&CancellationToken>,
    ) -> CycleReport {
        let mut report = CycleReport::default();
        let config = Arc::clone(&self.config);

        for (index, mapping) in config.iter().enumerate() {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                report.not_polled = config.len() - index;
                tracing::info!(
                    not_polled = report.not_polled,
                    "shutdown requested, cycle cut short"
                );
                break;
            }

            let result = read_mapped(&self.reader, mapping).await;
            let slot = self.points.entry(mapping.remote_id.clone()).or_default();

            let reading = match result {
                Ok(reading) => reading,
                Err(e) => {
                    report.read_failed += 1;
                    log_read_failure(mapping, slot.failures.record_failure(now), &e);
                    continue;
                }
            };

            if let Some(failures) = slot.failures.record_success() {
                tracing::info!(
                    remote_id = %mapping.remote_id,
                    failures,
                    "point readable again"
                );
            }

            if let (Some(bounds), Some(v)) = (mapping.bounds, reading.value.as_f64()) {
                if !bounds.contains(v) {
                    report.discarded += 1;
                    tracing::warn!(
                        remote_id = %mapping.remote_id,
                        variable = %mapping.variable_name,
                        value = v,
                        "reading out of bounds, discarded"
                    );
                    continue;
                }
            }

            let (next, decision) = decide(mapping, &slot.state, &reading, now);
            slot.state = next;

            match decision {
                Decision::Skip => {
                    report.skipped += 1;
                    tracing::trace!(
                        variable = %mapping.variable_name,
                        value = %reading.value,
                        "no significant change"
                    );
                }
                Decision::Emit { reason, event } => {
                    report.emitted += 1;
                    tracing::debug!(
                        variable = %event.variable_name,
                        value = %event.value,
                        reason = reason.as_str(),
                        "emitting sensor event"
                    );
                    // State stays advanced even if the bus rejects the event.
                    if let Err(e) = self.emitter.publish(&event) {
                        report.publish_failed += 1;
                        tracing::warn!(
                            variable = %event.variable_name,
                            "publish failed, event dropped: {e}"
                        );
                    }
                }
            }
        }

        report
    }

    /// Run cycles every `period` until `cancel` fires.
    ///
    /// Cycles never overlap: a cycle longer than the period delays the
    /// next one, which then starts right away without any catch-up burst.
    /// Cancellation is observed between cycles and between points; an
    /// in-flight read is never pre-empted. Returns the number of cycles
    /// run, counting one that was cut short.
    pub async fn run(&mut self, period: Duration, cancel: CancellationToken) -> u64 {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycles = 0;

        tracing::info!(
            points = self.config.len(),
            period_secs = period.as_secs_f64(),
            "poll loop started"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let started = Instant::now();
            let report = self.poll_points(Utc::now(), Some(&cancel)).await;
            cycles += 1;
            let elapsed = started.elapsed();

            tracing::debug!(
                cycle = cycles,
                points = report.points(),
                emitted = report.emitted,
                skipped = report.skipped,
                read_failed = report.read_failed,
                discarded = report.discarded,
                publish_failed = report.publish_failed,
                not_polled = report.not_polled,
                elapsed_ms = elapsed.as_millis() as u64,
                "poll cycle done"
            );
            if elapsed > period {
                tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    period_ms = period.as_millis() as u64,
                    "poll cycle overran its period"
                );
            }
        }

        tracing::info!(cycles, "poll loop stopped");
        cycles
    }
}

/// Read one mapped point on the blocking pool and coerce the value to
/// the mapping's declared type.
pub async fn read_mapped<R: PointReader + 'static>(
    reader: &Arc<R>,
    mapping: &PointMapping,
) -> Result<PointReading, RemoteReadError> {
    let reader = Arc::clone(reader);
    let remote_id = mapping.remote_id.clone();
    let mut reading = tokio::task::spawn_blocking(move || reader.read(&remote_id))
        .await
        .map_err(|e| RemoteReadError::Task(e.to_string()))??;
    reading.value = mapping.variable_type.coerce(reading.value)?;
    Ok(reading)
}

fn log_read_failure(mapping: &PointMapping, action: ReportAction, err: &RemoteReadError) {
    let remote_id = mapping.remote_id.as_str();
    match action {
        ReportAction::Report { count } => {
            tracing::warn!(remote_id, count, "read failed: {err}");
        }
        ReportAction::ReportLast { count } => {
            tracing::warn!(remote_id, count, "read failed: {err}");
            tracing::warn!(remote_id, "max error count reached, muting reports for this point");
        }
        ReportAction::Solid { since } => {
            tracing::error!(remote_id, %since, "point failing continuously: {err}");
        }
        ReportAction::Suppress => {
            tracing::debug!(remote_id, "read failed: {err}");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
