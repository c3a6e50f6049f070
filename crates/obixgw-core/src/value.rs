use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// ─── Variable type ────────────────────────────────────────────────

/// Semantic type of a mapped variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    Numeric,
    Boolean,
    String,
    Enumerated,
}

impl VariableType {
    pub const ALL: [Self; 4] = [Self::Numeric, Self::Boolean, Self::String, Self::Enumerated];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Enumerated => "enumerated",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Numeric)
    }

    /// Check a reading against this type, normalizing it where the
    /// gateway representation is looser than the mapping (a plain
    /// string read for an enumerated point becomes an enum value).
    pub fn coerce(self, value: PointValue) -> Result<PointValue, ValueError> {
        match (self, value) {
            (Self::Numeric, PointValue::Number(n)) if !n.is_finite() => {
                Err(ValueError::NonFinite(n))
            }
            (Self::Numeric, v @ PointValue::Number(_))
            | (Self::Boolean, v @ PointValue::Bool(_))
            | (Self::String, v @ PointValue::Text(_))
            | (Self::Enumerated, v @ PointValue::Enum(_)) => Ok(v),
            (Self::Enumerated, PointValue::Text(s)) => Ok(PointValue::Enum(s)),
            (expected, found) => Err(ValueError::TypeMismatch {
                expected,
                found: found.kind_name(),
            }),
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "numeric" | "number" => Ok(Self::Numeric),
            "boolean" | "bool" => Ok(Self::Boolean),
            "string" | "str" => Ok(Self::String),
            "enumerated" | "enum" => Ok(Self::Enumerated),
            _ => Err(ValueError::UnknownType(s.to_string())),
        }
    }
}

// ─── Values ───────────────────────────────────────────────────────

/// A value read from a remote point.
///
/// Serialized as the bare JSON scalar so that bus consumers see
/// `21.5`, `true` or `"occupied"` rather than a tagged object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PointValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Enum(String),
}

impl PointValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::Text(_) => "string",
            Self::Enum(_) => "enum",
        }
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) | Self::Enum(s) => f.write_str(s),
        }
    }
}

/// A successful read: the value plus the engineering unit the gateway
/// attached to it, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointReading {
    pub value: PointValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl PointReading {
    pub fn new(value: PointValue) -> Self {
        Self { value, unit: None }
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("unknown variable type \"{0}\" (expected numeric, boolean, string or enumerated)")]
    UnknownType(String),

    #[error("expected a {expected} value, got {found}")]
    TypeMismatch {
        expected: VariableType,
        found: &'static str,
    },

    #[error("non-finite numeric value {0}")]
    NonFinite(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_variable_type_aliases() {
        assert_eq!("numeric".parse(), Ok(VariableType::Numeric));
        assert_eq!("Number".parse(), Ok(VariableType::Numeric));
        assert_eq!("bool".parse(), Ok(VariableType::Boolean));
        assert_eq!("STRING".parse(), Ok(VariableType::String));
        assert_eq!("enum".parse(), Ok(VariableType::Enumerated));
    }

    #[test]
    fn parse_unknown_variable_type() {
        let err = "temperature".parse::<VariableType>().unwrap_err();
        assert_eq!(err, ValueError::UnknownType("temperature".to_string()));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for t in VariableType::ALL {
            assert_eq!(t.to_string().parse::<VariableType>(), Ok(t));
        }
    }

    #[test]
    fn coerce_accepts_matching_kinds() {
        assert_eq!(
            VariableType::Numeric.coerce(PointValue::Number(1.5)),
            Ok(PointValue::Number(1.5))
        );
        assert_eq!(
            VariableType::Boolean.coerce(PointValue::Bool(true)),
            Ok(PointValue::Bool(true))
        );
    }

    #[test]
    fn coerce_text_to_enum() {
        assert_eq!(
            VariableType::Enumerated.coerce(PointValue::Text("auto".into())),
            Ok(PointValue::Enum("auto".into()))
        );
    }

    #[test]
    fn coerce_rejects_mismatch() {
        let err = VariableType::Numeric
            .coerce(PointValue::Bool(false))
            .unwrap_err();
        assert_eq!(
            err,
            ValueError::TypeMismatch {
                expected: VariableType::Numeric,
                found: "bool"
            }
        );
        assert_eq!(err.to_string(), "expected a numeric value, got bool");
    }

    #[test]
    fn coerce_rejects_nan() {
        assert!(matches!(
            VariableType::Numeric.coerce(PointValue::Number(f64::NAN)),
            Err(ValueError::NonFinite(_))
        ));
    }

    #[test]
    fn values_serialize_as_bare_scalars() {
        let json = serde_json::to_string(&PointValue::Number(21.5)).expect("serialize");
        assert_eq!(json, "21.5");
        let json = serde_json::to_string(&PointValue::Enum("occupied".into())).expect("serialize");
        assert_eq!(json, "\"occupied\"");
    }

    #[test]
    fn reading_omits_missing_unit() {
        let json = serde_json::to_value(PointReading::new(PointValue::Bool(true))).expect("ok");
        assert_eq!(json, serde_json::json!({"value": true}));
        let json = serde_json::to_value(PointReading::new(PointValue::Number(3.0)).with_unit("celsius"))
            .expect("ok");
        assert_eq!(json, serde_json::json!({"value": 3.0, "unit": "celsius"}));
    }
}
