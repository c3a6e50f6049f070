//! Period values used by the configuration: either a plain number of
//! seconds or a compact string such as `"90s"`, `"5m"`, `"2h"`, `"1d"`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("empty period")]
    Empty,

    #[error("invalid period \"{0}\" (expected <digits>[s|m|h|d])")]
    Invalid(String),

    #[error("period \"{0}\" is too large")]
    Overflow(String),
}

/// Parse a period string into seconds. A bare number is seconds.
pub fn parse_period(s: &str) -> Result<u64, PeriodError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(PeriodError::Empty);
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return Err(PeriodError::Invalid(s.to_string()));
    }

    let multiplier: u64 = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        _ => return Err(PeriodError::Invalid(s.to_string())),
    };

    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| PeriodError::Overflow(s.to_string()))
}

/// Raw period as it appears in the JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PeriodSpec {
    Seconds(u64),
    Text(String),
}

impl PeriodSpec {
    pub fn to_secs(&self) -> Result<u64, PeriodError> {
        match self {
            Self::Seconds(n) => Ok(*n),
            Self::Text(s) => parse_period(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_seconds() {
        assert_eq!(parse_period("300"), Ok(300));
        assert_eq!(parse_period("45s"), Ok(45));
    }

    #[test]
    fn unit_suffixes() {
        assert_eq!(parse_period("5m"), Ok(300));
        assert_eq!(parse_period("2h"), Ok(7_200));
        assert_eq!(parse_period("1d"), Ok(86_400));
        assert_eq!(parse_period(" 60m "), Ok(3_600));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_period(""), Err(PeriodError::Empty));
        assert!(matches!(parse_period("h"), Err(PeriodError::Invalid(_))));
        assert!(matches!(parse_period("5w"), Err(PeriodError::Invalid(_))));
        assert!(matches!(parse_period("-5"), Err(PeriodError::Invalid(_))));
        assert!(matches!(parse_period("1.5h"), Err(PeriodError::Invalid(_))));
    }

    #[test]
    fn rejects_overflow() {
        assert!(matches!(
            parse_period("99999999999999999999d"),
            Err(PeriodError::Overflow(_))
        ));
    }

    #[test]
    fn spec_accepts_number_or_string() {
        let n: PeriodSpec = serde_json::from_str("120").expect("number");
        assert_eq!(n.to_secs(), Ok(120));
        let s: PeriodSpec = serde_json::from_str("\"2h\"").expect("string");
        assert_eq!(s.to_secs(), Ok(7_200));
    }
}
