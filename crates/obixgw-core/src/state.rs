use chrono::{DateTime, TimeDelta, Utc};

use crate::value::PointValue;

/// Per-point memory carried between poll cycles.
///
/// Starts empty at daemon startup. Owned by the poll scheduler; the
/// decision engine only ever returns an updated copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointState {
    /// Last value actually emitted on the bus.
    pub last_value: Option<PointValue>,
    /// When `last_value` was emitted.
    pub last_emit_time: Option<DateTime<Utc>>,
    /// Most recent successful read, emitted or not.
    pub last_read_value: Option<PointValue>,
    pub last_read_time: Option<DateTime<Utc>>,
}

impl PointState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_emitted(&self) -> bool {
        self.last_value.is_some()
    }

    /// Time elapsed since the last emission, if there was one.
    pub fn since_last_emit(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.last_emit_time
            .map(|emitted| now.signed_duration_since(emitted))
    }
}
