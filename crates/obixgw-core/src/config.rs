//! Mapping configuration: which remote points are polled, which bus
//! variables they feed, and the per-point emission policy.
//!
//! The document is deserialized into loose `Raw*` structs first and then
//! validated into the immutable [`MappingConfig`], so that every failure
//! can name the offending mapping instead of surfacing a bare serde error.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::period::{PeriodError, PeriodSpec};
use crate::value::{ValueError, VariableType};

/// Poll interval used when the document does not set one (5 minutes).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5 * 60;

// ─── Errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed mapping config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("mappings[{index}]{}: {source}", remote_id_label(.remote_id.as_deref()))]
    InvalidMapping {
        index: usize,
        remote_id: Option<String>,
        source: serde_json::Error,
    },

    #[error("mappings[{index}]: remote_id is missing or empty")]
    MissingRemoteId { index: usize },

    #[error("mappings[{index}] (remote_id \"{remote_id}\"): variable_name is missing or empty")]
    MissingVariableName { index: usize, remote_id: String },

    #[error("mappings[{index}] (remote_id \"{remote_id}\"): variable_type is missing")]
    MissingVariableType { index: usize, remote_id: String },

    #[error("mappings[{index}] (remote_id \"{remote_id}\"): {source}")]
    UnknownVariableType {
        index: usize,
        remote_id: String,
        source: ValueError,
    },

    #[error(
        "mappings[{index}]: variable_name \"{variable_name}\" is already used by mappings[{first_index}]"
    )]
    DuplicateVariableName {
        index: usize,
        first_index: usize,
        variable_name: String,
    },

    #[error("mappings[{index}]: remote_id \"{remote_id}\" is already used by mappings[{first_index}]")]
    DuplicateRemoteId {
        index: usize,
        first_index: usize,
        remote_id: String,
    },

    #[error(
        "mappings[{index}] (remote_id \"{remote_id}\"): significant_change must be a finite value >= 0, got {value}"
    )]
    InvalidSignificantChange {
        index: usize,
        remote_id: String,
        value: f64,
    },

    #[error("mappings[{index}] (remote_id \"{remote_id}\"): invalid bounds: {detail}")]
    InvalidBounds {
        index: usize,
        remote_id: String,
        detail: String,
    },

    #[error("{field}: {source}")]
    InvalidPeriod { field: String, source: PeriodError },

    #[error("poll_interval_seconds must be greater than zero")]
    ZeroPollInterval,
}

fn remote_id_label(remote_id: Option<&str>) -> String {
    remote_id
        .map(|id| format!(" (remote_id \"{id}\")"))
        .unwrap_or_default()
}

// ─── Model ────────────────────────────────────────────────────────

/// Acceptance window for numeric readings. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Bounds {
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    fn check(&self) -> Result<(), String> {
        for (side, bound) in [("min", self.min), ("max", self.max)] {
            match bound {
                Some(b) if !b.is_finite() => return Err(format!("{side} must be finite, got {b}")),
                _ => {}
            }
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => {
                Err(format!("min {min} is greater than max {max}"))
            }
            _ => Ok(()),
        }
    }
}

/// One configured remote point and its emission policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointMapping {
    pub remote_id: String,
    pub variable_name: String,
    pub variable_type: VariableType,
    /// Minimum numeric delta worth announcing; 0 means any change.
    pub significant_change: f64,
    /// Keep-alive re-announcement period; 0 disables it.
    pub ttl_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

impl PointMapping {
    pub fn new(
        remote_id: impl Into<String>,
        variable_name: impl Into<String>,
        variable_type: VariableType,
    ) -> Self {
        Self {
            remote_id: remote_id.into(),
            variable_name: variable_name.into(),
            variable_type,
            significant_change: 0.0,
            ttl_seconds: 0,
            bounds: None,
        }
    }

    #[must_use]
    pub fn with_significant_change(mut self, delta: f64) -> Self {
        self.significant_change = delta;
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, secs: u64) -> Self {
        self.ttl_seconds = secs;
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.bounds = Some(Bounds { min, max });
        self
    }
}

/// The full, validated mapping set. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingConfig {
    poll_interval_seconds: u64,
    gateway_connection: serde_json::Value,
    mappings: Vec<PointMapping>,
}

impl MappingConfig {
    /// Build and validate a config from already-typed mappings.
    pub fn new(
        poll_interval_seconds: u64,
        gateway_connection: serde_json::Value,
        mappings: Vec<PointMapping>,
    ) -> Result<Self, ConfigError> {
        if poll_interval_seconds == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        validate(&mappings)?;
        Ok(Self {
            poll_interval_seconds,
            gateway_connection,
            mappings,
        })
    }

    /// Parse and validate a JSON mapping document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(s)?;
        raw.into_config()
    }

    pub fn poll_interval_seconds(&self) -> u64 {
        self.poll_interval_seconds
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Gateway connection parameters, passed through untouched to the
    /// reader that knows how to interpret them.
    pub fn gateway_connection(&self) -> &serde_json::Value {
        &self.gateway_connection
    }

    /// Mappings in source order. This order is the polling order.
    pub fn mappings(&self) -> &[PointMapping] {
        &self.mappings
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PointMapping> {
        self.mappings.iter()
    }

    pub fn find(&self, remote_id: &str) -> Option<&PointMapping> {
        self.mappings.iter().find(|m| m.remote_id == remote_id)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl<'a> IntoIterator for &'a MappingConfig {
    type Item = &'a PointMapping;
    type IntoIter = std::slice::Iter<'a, PointMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.iter()
    }
}

fn validate(mappings: &[PointMapping]) -> Result<(), ConfigError> {
    let mut names: HashMap<&str, usize> = HashMap::new();
    let mut ids: HashMap<&str, usize> = HashMap::new();

    for (index, m) in mappings.iter().enumerate() {
        if m.remote_id.trim().is_empty() {
            return Err(ConfigError::MissingRemoteId { index });
        }
        if m.variable_name.trim().is_empty() {
            return Err(ConfigError::MissingVariableName {
                index,
                remote_id: m.remote_id.clone(),
            });
        }
        if let Some(&first_index) = ids.get(m.remote_id.as_str()) {
            return Err(ConfigError::DuplicateRemoteId {
                index,
                first_index,
                remote_id: m.remote_id.clone(),
            });
        }
        if let Some(&first_index) = names.get(m.variable_name.as_str()) {
            return Err(ConfigError::DuplicateVariableName {
                index,
                first_index,
                variable_name: m.variable_name.clone(),
            });
        }
        if !m.significant_change.is_finite() || m.significant_change < 0.0 {
            return Err(ConfigError::InvalidSignificantChange {
                index,
                remote_id: m.remote_id.clone(),
                value: m.significant_change,
            });
        }
        if let Some(bounds) = &m.bounds {
            let checked = if m.variable_type.is_numeric() {
                bounds.check()
            } else {
                Err(format!(
                    "bounds only apply to numeric points, this one is {}",
                    m.variable_type
                ))
            };
            checked.map_err(|detail| ConfigError::InvalidBounds {
                index,
                remote_id: m.remote_id.clone(),
                detail,
            })?;
        }

        ids.insert(m.remote_id.as_str(), index);
        names.insert(m.variable_name.as_str(), index);
    }
    Ok(())
}

// ─── Raw document ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    poll_interval_seconds: Option<PeriodSpec>,
    #[serde(default)]
    gateway_connection: serde_json::Value,
    /// Applied to mappings that do not set `ttl_seconds` themselves.
    #[serde(default)]
    default_ttl_seconds: Option<PeriodSpec>,
    /// Kept loose so a malformed entry can be reported with its index.
    #[serde(default)]
    mappings: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMapping {
    #[serde(default)]
    remote_id: Option<String>,
    #[serde(default)]
    variable_name: Option<String>,
    #[serde(default)]
    variable_type: Option<String>,
    #[serde(default)]
    significant_change: Option<f64>,
    #[serde(default)]
    ttl_seconds: Option<PeriodSpec>,
    #[serde(default)]
    bounds: Option<Bounds>,
}

fn period_secs(period: &PeriodSpec, field: impl Into<String>) -> Result<u64, ConfigError> {
    period.to_secs().map_err(|source| ConfigError::InvalidPeriod {
        field: field.into(),
        source,
    })
}

impl RawConfig {
    fn into_config(self) -> Result<MappingConfig, ConfigError> {
        let poll_interval = match &self.poll_interval_seconds {
            Some(period) => period_secs(period, "poll_interval_seconds")?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };
        let default_ttl = match &self.default_ttl_seconds {
            Some(period) => period_secs(period, "default_ttl_seconds")?,
            None => 0,
        };

        let mappings = self
            .mappings
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                RawMapping::from_value(index, value)?.into_mapping(index, default_ttl)
            })
            .collect::<Result<Vec<_>, _>>()?;

        MappingConfig::new(poll_interval, self.gateway_connection, mappings)
    }
}

impl RawMapping {
    fn from_value(index: usize, value: serde_json::Value) -> Result<Self, ConfigError> {
        let remote_id = value
            .get("remote_id")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        serde_json::from_value(value).map_err(|source| ConfigError::InvalidMapping {
            index,
            remote_id,
            source,
        })
    }

    fn into_mapping(self, index: usize, default_ttl: u64) -> Result<PointMapping, ConfigError> {
        let remote_id = self
            .remote_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(ConfigError::MissingRemoteId { index })?;

        let variable_type = match self.variable_type.as_deref() {
            Some(t) => t
                .parse::<VariableType>()
                .map_err(|source| ConfigError::UnknownVariableType {
                    index,
                    remote_id: remote_id.clone(),
                    source,
                })?,
            None => {
                return Err(ConfigError::MissingVariableType { index, remote_id });
            }
        };

        let ttl_seconds = match &self.ttl_seconds {
            Some(period) => period_secs(period, format!("mappings[{index}].ttl_seconds"))?,
            None => default_ttl,
        };

        Ok(PointMapping {
            remote_id,
            variable_name: self.variable_name.unwrap_or_default(),
            variable_type,
            significant_change: self.significant_change.unwrap_or(0.0),
            ttl_seconds,
            bounds: self.bounds,
        })
    }
}
