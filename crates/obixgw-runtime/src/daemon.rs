//! Daemon wiring: gateway client, event sink, scheduler task and
//! shutdown handling.

use std::fs::OpenOptions;
use std::sync::Arc;

use anyhow::Context;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use obixgw_core::MappingConfig;
use obixgw_obix::ObixClient;

use crate::cli::DaemonOpts;
use crate::emitter::{BusEmitter, JsonLinesEmitter};
use crate::poll_loop::PollScheduler;

/// Run the daemon: starts the poll loop, waits for a shutdown signal,
/// then lets the in-flight read finish before returning.
pub async fn run_daemon(config: MappingConfig, opts: DaemonOpts) -> anyhow::Result<()> {
    let period = match opts.poll_interval {
        Some(0) => anyhow::bail!("--poll-interval must be greater than zero"),
        Some(secs) => Duration::from_secs(secs),
        None => config.poll_interval(),
    };

    let gateway = config.gateway_connection().clone();
    let reader = tokio::task::spawn_blocking(move || ObixClient::from_config(&gateway))
        .await?
        .context("invalid gateway_connection")?;
    tracing::info!(
        host = %reader.connection().host,
        node_id = %reader.connection().node_id,
        device_id = %reader.connection().device_id,
        "gateway client ready"
    );

    let emitter = build_emitter(&opts)?;
    let mut scheduler = PollScheduler::new(Arc::new(config), Arc::new(reader), emitter);

    let cancel = CancellationToken::new();
    let poll_cancel = cancel.clone();
    let mut poll_handle = tokio::spawn(async move { scheduler.run(period, poll_cancel).await });

    let signalled = tokio::select! {
        () = shutdown_signal() => true,
        res = &mut poll_handle => {
            tracing::warn!("poll loop exited unexpectedly");
            res.context("poll loop task failed")?;
            false
        }
    };

    if signalled {
        cancel.cancel();
        let cycles = poll_handle.await.context("poll loop task failed")?;
        tracing::info!(cycles, "poll loop drained");
    }

    tracing::info!("daemon stopped");
    Ok(())
}

fn build_emitter(opts: &DaemonOpts) -> anyhow::Result<Box<dyn BusEmitter>> {
    match &opts.output {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open event output {}", path.display()))?;
            tracing::info!(path = %path.display(), "publishing events to file");
            Ok(Box::new(JsonLinesEmitter::new(file)))
        }
        None => Ok(Box::new(JsonLinesEmitter::stdout())),
    }
}

/// Resolves on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!("failed to register SIGTERM handler: {e}");
                ctrl_c.await.ok();
                tracing::info!("received ctrl-c, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("received ctrl-c, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use obixgw_core::{PointValue, SensorEvent, VariableType};

    #[test]
    fn file_emitter_appends_lines() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("events.jsonl");
        let opts = DaemonOpts {
            output: Some(path.clone()),
            ..DaemonOpts::default()
        };
        let event = SensorEvent {
            variable_name: "temp_office".to_string(),
            variable_type: VariableType::Numeric,
            value: PointValue::Number(21.5),
            unit: None,
            timestamp: Utc::now(),
        };

        build_emitter(&opts).expect("emitter").publish(&event).expect("publish");
        build_emitter(&opts).expect("emitter").publish(&event).expect("publish");

        let text = std::fs::read_to_string(&path).expect("read events");
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn unwritable_output_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let opts = DaemonOpts {
            output: Some(dir.path().join("missing").join("events.jsonl")),
            ..DaemonOpts::default()
        };
        assert!(build_emitter(&opts).is_err());
    }

    #[tokio::test]
    async fn zero_interval_override_is_rejected() {
        let config = MappingConfig::new(60, serde_json::Value::Null, Vec::new()).expect("config");
        let opts = DaemonOpts {
            poll_interval: Some(0),
            ..DaemonOpts::default()
        };
        assert!(run_daemon(config, opts).await.is_err());
    }

    #[tokio::test]
    async fn missing_gateway_section_is_fatal() {
        let config = MappingConfig::new(60, serde_json::Value::Null, Vec::new()).expect("config");
        let err = run_daemon(config, DaemonOpts::default()).await.unwrap_err();
        assert!(format!("{err:#}").contains("gateway_connection"));
    }
}
