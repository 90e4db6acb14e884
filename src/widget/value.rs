use super::kind::ValueType;
use crate::error::{Result, TetherError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Value held by a configuration widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WidgetValue {
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
    None,
}

impl WidgetValue {
    /// The value type this variant satisfies.
    pub fn value_type(&self) -> ValueType {
        match self {
            WidgetValue::Text(_) => ValueType::String,
            WidgetValue::Integer(_) => ValueType::Number,
            WidgetValue::Timestamp(_) => ValueType::Date,
            WidgetValue::None => ValueType::Structural,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            WidgetValue::Text(_) => "text",
            WidgetValue::Integer(_) => "integer",
            WidgetValue::Timestamp(_) => "timestamp",
            WidgetValue::None => "none",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WidgetValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            WidgetValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            WidgetValue::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, WidgetValue::None)
    }

    /// Parse user input into a value of the given type.
    ///
    /// Dates accept either RFC 3339 or whole seconds since the Unix epoch.
    pub fn parse_as(value_type: ValueType, input: &str) -> Result<Self> {
        let invalid = |expected: &str| {
            TetherError::Unsupported(format!("cannot parse '{}' as {}", input, expected))
        };

        match value_type {
            ValueType::String => Ok(WidgetValue::Text(input.to_string())),
            ValueType::Number => input
                .trim()
                .parse::<i64>()
                .map(WidgetValue::Integer)
                .map_err(|_| invalid("an integer")),
            ValueType::Date => {
                let input = input.trim();
                if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
                    return Ok(WidgetValue::Timestamp(parsed.with_timezone(&Utc)));
                }
                input
                    .parse::<i64>()
                    .ok()
                    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                    .map(WidgetValue::Timestamp)
                    .ok_or_else(|| invalid("a date"))
            }
            ValueType::Structural => Err(invalid("a structural widget value")),
        }
    }
}

impl fmt::Display for WidgetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetValue::Text(text) => f.write_str(text),
            WidgetValue::Integer(value) => write!(f, "{}", value),
            WidgetValue::Timestamp(value) => write!(f, "{}", value.to_rfc3339()),
            WidgetValue::None => Ok(()),
        }
    }
}

impl From<&str> for WidgetValue {
    fn from(value: &str) -> Self {
        WidgetValue::Text(value.to_string())
    }
}

impl From<String> for WidgetValue {
    fn from(value: String) -> Self {
        WidgetValue::Text(value)
    }
}

impl From<i64> for WidgetValue {
    fn from(value: i64) -> Self {
        WidgetValue::Integer(value)
    }
}

impl From<bool> for WidgetValue {
    fn from(value: bool) -> Self {
        WidgetValue::Integer(value as i64)
    }
}

impl From<DateTime<Utc>> for WidgetValue {
    fn from(value: DateTime<Utc>) -> Self {
        WidgetValue::Timestamp(value)
    }
}
