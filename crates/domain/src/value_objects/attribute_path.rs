//! Dotted attribute paths into host document data

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::DomainError;

/// A dotted path such as `currency.gold` or `system.quantity`.
///
/// Paths address nested objects inside a document's data blob. Segments must
/// be non-empty; array indices are not supported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttributePath(String);

impl AttributePath {
    pub fn parse(path: &str) -> Result<Self, DomainError> {
        let path = path.trim();
        if path.is_empty() || path.split('.').any(str::is_empty) {
            return Err(DomainError::validation(format!(
                "invalid attribute path: {path:?}"
            )));
        }
        Ok(Self(path.to_string()))
    }

    /// Build a path from a literal known to be well formed.
    pub(crate) fn from_static(path: &'static str) -> Self {
        Self(path.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Raw value at this path, if every segment resolves.
    pub fn get<'a>(&self, data: &'a Value) -> Option<&'a Value> {
        self.segments()
            .try_fold(data, |current, segment| current.as_object()?.get(segment))
    }

    /// True when the path resolves to any value (including zero).
    pub fn exists(&self, data: &Value) -> bool {
        self.get(data).is_some_and(|v| !v.is_null())
    }

    /// Numeric value at this path. Numeric strings are accepted, as hosts
    /// frequently store form input verbatim.
    pub fn get_number(&self, data: &Value) -> Option<f64> {
        match self.get(data)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn get_string(&self, data: &Value) -> Option<String> {
        match self.get(data)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Write `value`, creating intermediate objects as needed.
    pub fn set(&self, data: &mut Value, value: Value) {
        let mut current = data;
        let segments: Vec<&str> = self.segments().collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };
        for segment in parents {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let Value::Object(map) = current else {
                return;
            };
            current = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        if let Value::Object(map) = current {
            map.insert(last.to_string(), value);
        }
    }

    pub fn set_number(&self, data: &mut Value, value: f64) {
        self.set(data, number_value(value));
    }
}

/// Encode a number the way the host would: whole numbers stay integers.
pub fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::Number(Number::from(value as i64))
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for AttributePath {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AttributePath> for String {
    fn from(value: AttributePath) -> Self {
        value.0
    }
}

impl std::str::FromStr for AttributePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested_number() {
        let data = json!({"currency": {"gold": 5, "silver": "12"}});
        let gold = AttributePath::parse("currency.gold").unwrap();
        let silver = AttributePath::parse("currency.silver").unwrap();
        assert_eq!(gold.get_number(&data), Some(5.0));
        assert_eq!(silver.get_number(&data), Some(12.0));
    }

    #[test]
    fn test_missing_path() {
        let data = json!({"currency": {"gold": 5}});
        let copper = AttributePath::parse("currency.copper").unwrap();
        assert!(!copper.exists(&data));
        assert_eq!(copper.get_number(&data), None);
    }

    #[test]
    fn test_zero_still_exists() {
        let data = json!({"hp": 0});
        assert!(AttributePath::parse("hp").unwrap().exists(&data));
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut data = json!({});
        AttributePath::parse("system.quantity")
            .unwrap()
            .set_number(&mut data, 3.0);
        assert_eq!(data, json!({"system": {"quantity": 3}}));
    }

    #[test]
    fn test_fractional_numbers_survive() {
        let mut data = json!({});
        AttributePath::parse("weight").unwrap().set_number(&mut data, 0.5);
        assert_eq!(data, json!({"weight": 0.5}));
    }

    #[test]
    fn test_rejects_empty_segments() {
        assert!(AttributePath::parse("").is_err());
        assert!(AttributePath::parse("a..b").is_err());
        assert!(AttributePath::parse(".a").is_err());
    }
}
