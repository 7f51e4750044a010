//! Typed Field Access over Raw JSON Objects
//!
//! Every front-end hands the pipeline a loosely typed object (a JSON body, a
//! set of prompt answers). `FieldReader` is the only place where those values
//! are checked for presence and converted to their declared types.

use crate::error::ValidationError;
use serde_json::{Map, Value};

/// Reader for named fields of a raw input object
pub struct FieldReader<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> FieldReader<'a> {
    /// Wrap a raw input object
    pub fn new(fields: &'a Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Get a field that must be present and non-null
    pub fn require(&self, field: &'static str) -> Result<&'a Value, ValidationError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
            Some(value) => Ok(value),
        }
    }

    /// Read a categorical label
    pub fn string(&self, field: &'static str) -> Result<String, ValidationError> {
        match self.require(field)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(mismatch(field, "a string", other)),
        }
    }

    /// Read a finite floating point number
    pub fn float(&self, field: &'static str) -> Result<f64, ValidationError> {
        let value = self.require(field)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        parsed
            .filter(|v| v.is_finite())
            .ok_or_else(|| mismatch(field, "a number", value))
    }

    /// Read a non-negative integer
    pub fn unsigned(&self, field: &'static str) -> Result<u32, ValidationError> {
        let value = self.require(field)?;
        let parsed = match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().and_then(integral))
                .and_then(|v| u32::try_from(v).ok()),
            Value::String(s) => s.trim().parse::<u32>().ok(),
            _ => None,
        };

        parsed.ok_or_else(|| mismatch(field, "a non-negative integer", value))
    }

    /// Read a signed integer
    pub fn integer(&self, field: &'static str) -> Result<i32, ValidationError> {
        let value = self.require(field)?;
        let parsed = match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|v| v.fract() == 0.0 && v.abs() <= i32::MAX as f64)
                        .map(|v| v as i64)
                })
                .and_then(|v| i32::try_from(v).ok()),
            Value::String(s) => s.trim().parse::<i32>().ok(),
            _ => None,
        };

        parsed.ok_or_else(|| mismatch(field, "an integer", value))
    }

    /// Read a boolean flag
    ///
    /// Accepts JSON booleans, `0`/`1`, and the usual yes/no spellings.
    pub fn boolean(&self, field: &'static str) -> Result<bool, ValidationError> {
        let value = self.require(field)?;
        let parsed = match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_u64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "y" | "yes" | "1" => Some(true),
                "false" | "n" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        };

        parsed.ok_or_else(|| mismatch(field, "a boolean", value))
    }
}

/// Whole, non-negative float as u64
fn integral(v: f64) -> Option<u64> {
    if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 {
        Some(v as u64)
    } else {
        None
    }
}

fn mismatch(field: &'static str, expected: &'static str, found: &Value) -> ValidationError {
    let found = match found {
        Value::String(s) => format!("{:?}", s),
        other => other.to_string(),
    };
    ValidationError::TypeMismatch {
        field,
        expected,
        found,
    }
}
