//! obixgw-core: pure polling-and-notification model.
//! Mapping config, point values and state, the change/TTL decision
//! engine, and read-failure report throttling. No IO, no async; every
//! time-dependent function takes `now` as a parameter.

pub mod config;
pub mod decision;
pub mod event;
pub mod period;
pub mod report;
pub mod state;
pub mod value;

pub use config::{Bounds, ConfigError, MappingConfig, PointMapping};
pub use decision::{Decision, EmitReason, decide};
pub use event::SensorEvent;
pub use report::{FailureTracker, ReportAction};
pub use state::PointState;
pub use value::{PointReading, PointValue, ValueError, VariableType};
