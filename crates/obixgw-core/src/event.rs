use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::value::{PointValue, VariableType};

/// Normalized event handed to the bus emitter. This is the only
/// artifact that crosses the boundary to the internal bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorEvent {
    pub variable_name: String,
    pub variable_type: VariableType,
    pub value: PointValue,
    /// Engineering unit reported by the gateway, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_flat() {
        let event = SensorEvent {
            variable_name: "temp1".to_string(),
            variable_type: VariableType::Numeric,
            value: PointValue::Number(21.0),
            unit: Some("celsius".to_string()),
            timestamp: DateTime::from_timestamp(0, 0).expect("epoch"),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "variable_name": "temp1",
                "variable_type": "numeric",
                "value": 21.0,
                "unit": "celsius",
                "timestamp": "1970-01-01T00:00:00Z"
            })
        );
    }

    #[test]
    fn unit_omitted_when_absent() {
        let event = SensorEvent {
            variable_name: "door".to_string(),
            variable_type: VariableType::Boolean,
            value: PointValue::Bool(false),
            unit: None,
            timestamp: DateTime::from_timestamp(0, 0).expect("epoch"),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert!(json.get("unit").is_none());
    }
}
