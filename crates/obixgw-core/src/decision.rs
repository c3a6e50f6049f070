//! Change/TTL decision engine.
//!
//! Decides, for one point and one fresh reading, whether the value is
//! worth announcing on the bus. Rules are evaluated in order:
//!
//! 1. **First read**: nothing was ever emitted for the point.
//! 2. **Significant change** (numeric): `|new - last| >= significant_change`
//!    and the value actually moved. The comparison tolerates the rounding
//!    error of decimal steps, so 21.0 → 21.2 reaches a threshold of 0.2.
//! 3. **Value changed** (non-numeric): `new != last`.
//! 4. **TTL elapsed**: `ttl_seconds > 0` and the last emission is at
//!    least `ttl_seconds` old (keep-alive re-announcement).
//! 5. Otherwise skip.
//!
//! [`decide`] is pure: same inputs, same decision, same next state.

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::PointMapping;
use crate::event::SensorEvent;
use crate::state::PointState;
use crate::value::{PointReading, PointValue};

/// Why a reading was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitReason {
    FirstRead,
    SignificantChange,
    ValueChanged,
    TtlElapsed,
}

impl EmitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstRead => "first_read",
            Self::SignificantChange => "significant_change",
            Self::ValueChanged => "value_changed",
            Self::TtlElapsed => "ttl_elapsed",
        }
    }
}

/// Outcome of a decision for one reading.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Emit {
        reason: EmitReason,
        event: SensorEvent,
    },
    Skip,
}

impl Decision {
    pub fn is_emit(&self) -> bool {
        matches!(self, Self::Emit { .. })
    }

    pub fn event(&self) -> Option<&SensorEvent> {
        match self {
            Self::Emit { event, .. } => Some(event),
            Self::Skip => None,
        }
    }

    pub fn reason(&self) -> Option<EmitReason> {
        match self {
            Self::Emit { reason, .. } => Some(*reason),
            Self::Skip => None,
        }
    }
}

/// Evaluate one reading against the point's previous state.
///
/// Returns the next state and the decision. The read bookkeeping
/// (`last_read_*`) advances on both paths; `last_value` and
/// `last_emit_time` only advance on emit.
pub fn decide(
    mapping: &PointMapping,
    state: &PointState,
    reading: &PointReading,
    now: DateTime<Utc>,
) -> (PointState, Decision) {
    let mut next = state.clone();
    next.last_read_value = Some(reading.value.clone());
    next.last_read_time = Some(now);

    let Some(reason) = emit_reason(mapping, state, &reading.value, now) else {
        return (next, Decision::Skip);
    };

    next.last_value = Some(reading.value.clone());
    next.last_emit_time = Some(now);

    let event = SensorEvent {
        variable_name: mapping.variable_name.clone(),
        variable_type: mapping.variable_type,
        value: reading.value.clone(),
        unit: reading.unit.clone(),
        timestamp: now,
    };

    (next, Decision::Emit { reason, event })
}

fn emit_reason(
    mapping: &PointMapping,
    state: &PointState,
    value: &PointValue,
    now: DateTime<Utc>,
) -> Option<EmitReason> {
    let Some(last) = state.last_value.as_ref() else {
        return Some(EmitReason::FirstRead);
    };

    if mapping.variable_type.is_numeric() {
        if let (Some(new), Some(old)) = (value.as_f64(), last.as_f64()) {
            // A zero threshold means "any change", never "every read".
            if reaches_threshold(new, old, mapping.significant_change) {
                return Some(EmitReason::SignificantChange);
            }
        } else if value != last {
            return Some(EmitReason::ValueChanged);
        }
    } else if value != last {
        return Some(EmitReason::ValueChanged);
    }

    if ttl_elapsed(mapping.ttl_seconds, state, now) {
        return Some(EmitReason::TtlElapsed);
    }

    None
}

/// `|new - old| >= threshold` for a value that actually moved, tolerant
/// of the rounding error of the subtraction: 21.0 → 21.2 gives a delta
/// of 0.1999999999999993, which must still reach a threshold of 0.2.
fn reaches_threshold(new: f64, old: f64, threshold: f64) -> bool {
    let delta = (new - old).abs();
    let slack = THRESHOLD_ULPS * f64::EPSILON * new.abs().max(old.abs()).max(threshold);
    delta > 0.0 && delta + slack >= threshold
}

/// Rounding slack, in units of the largest operand's epsilon.
const THRESHOLD_ULPS: f64 = 8.0;

fn ttl_elapsed(ttl_seconds: u64, state: &PointState, now: DateTime<Utc>) -> bool {
    if ttl_seconds == 0 {
        return false;
    }
    let Some(ttl) = i64::try_from(ttl_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
    else {
        return false;
    };
    state.since_last_emit(now).is_some_and(|elapsed| elapsed >= ttl)
}

// ─── Tests ───────────────────────────────────────────────────────────
