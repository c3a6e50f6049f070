//! Bus emitter: the boundary where sensor events leave the gateway.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use obixgw_core::SensorEvent;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("bus write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("event encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Publishes one event on the internal bus.
///
/// Called once per emit decision, in mapping order within a cycle. A
/// failed publish is not retried by the caller.
pub trait BusEmitter: Send + Sync {
    fn publish(&self, event: &SensorEvent) -> Result<(), PublishError>;
}

impl<T: BusEmitter + ?Sized> BusEmitter for Box<T> {
    fn publish(&self, event: &SensorEvent) -> Result<(), PublishError> {
        (**self).publish(event)
    }
}

impl<T: BusEmitter + ?Sized> BusEmitter for std::sync::Arc<T> {
    fn publish(&self, event: &SensorEvent) -> Result<(), PublishError> {
        (**self).publish(event)
    }
}

/// Writes each event as one JSON object per line, flushed immediately.
pub struct JsonLinesEmitter<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesEmitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl JsonLinesEmitter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> BusEmitter for JsonLinesEmitter<W> {
    fn publish(&self, event: &SensorEvent) -> Result<(), PublishError> {
        // Encode before locking so a bad event never leaves a partial line.
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(&line)?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use obixgw_core::{PointValue, VariableType};

    fn event(name: &str, value: PointValue) -> SensorEvent {
        SensorEvent {
            variable_name: name.to_string(),
            variable_type: VariableType::Numeric,
            value,
            unit: Some("celsius".to_string()),
            timestamp: DateTime::parse_from_rfc3339("2026-02-25T12:00:00Z")
                .expect("valid RFC3339")
                .with_timezone(&Utc),
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "bus gone"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_one_line_per_event() {
        let emitter = JsonLinesEmitter::new(Vec::new());
        emitter
            .publish(&event("temp_office", PointValue::Number(21.5)))
            .expect("publish");
        emitter
            .publish(&event("temp_lab", PointValue::Number(19.0)))
            .expect("publish");

        let text = String::from_utf8(emitter.into_inner()).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).expect("json line");
        assert_eq!(first["variable_name"], "temp_office");
        assert_eq!(first["variable_type"], "numeric");
        assert_eq!(first["value"], 21.5);
        assert_eq!(first["unit"], "celsius");
        assert_eq!(first["timestamp"], "2026-02-25T12:00:00Z");
    }

    #[test]
    fn io_failure_is_reported() {
        let emitter = JsonLinesEmitter::new(BrokenPipe);
        let err = emitter
            .publish(&event("temp_office", PointValue::Number(1.0)))
            .unwrap_err();
        assert!(matches!(err, PublishError::Io(_)));
    }

    #[test]
    fn boxed_emitter_delegates() {
        let emitter: Box<dyn BusEmitter> = Box::new(JsonLinesEmitter::new(Vec::new()));
        emitter
            .publish(&event("temp_office", PointValue::Number(1.0)))
            .expect("publish");
    }
}
