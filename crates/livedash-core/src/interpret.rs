//! Coercion of untyped wire values into a homogeneous typed sequence.
//!
//! Every value in a metric is coerced under the metric's declared type. A
//! value that cannot be coerced is reported with its position so only that
//! metric is degraded.

use serde_json::Value;

use crate::error::{DashError, Result};
use crate::model::DataType;

/// A metric's values after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedSequence {
    Integers(Vec<i32>),
    Reals(Vec<f64>),
    Strings(Vec<String>),
}

impl TypedSequence {
    pub fn len(&self) -> usize {
        match self {
            Self::Integers(v) => v.len(),
            Self::Reals(v) => v.len(),
            Self::Strings(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widen to reals for charting. Strings are never charted.
    pub fn as_reals(&self) -> Result<Vec<f64>> {
        match self {
            Self::Integers(v) => Ok(v.iter().map(|&i| f64::from(i)).collect()),
            Self::Reals(v) => Ok(v.clone()),
            Self::Strings(_) => Err(DashError::NonNumeric),
        }
    }

    /// First element rendered as display text.
    pub fn first_display(&self) -> Option<String> {
        match self {
            Self::Integers(v) => v.first().map(|i| i.to_string()),
            Self::Reals(v) => v.first().map(|f| f.to_string()),
            Self::Strings(v) => v.first().cloned(),
        }
    }

    /// First element, only when the sequence was declared as strings.
    pub fn first_str(&self) -> Option<&str> {
        match self {
            Self::Strings(v) => v.first().map(String::as_str),
            _ => None,
        }
    }
}

/// Coerce `values` under `data_type`.
pub fn interpret(values: &[Value], data_type: DataType) -> Result<TypedSequence> {
    let indexed = values.iter().enumerate();
    Ok(match data_type {
        DataType::Integer => TypedSequence::Integers(
            indexed
                .map(|(i, v)| to_i32(i, v))
                .collect::<Result<_>>()?,
        ),
        DataType::Real => {
            TypedSequence::Reals(indexed.map(|(i, v)| to_f64(i, v)).collect::<Result<_>>()?)
        }
        DataType::Text => TypedSequence::Strings(
            indexed
                .map(|(i, v)| to_text(i, v))
                .collect::<Result<_>>()?,
        ),
    })
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string {s:?}"),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}

fn mismatch(index: usize, expected: &'static str, value: &Value) -> DashError {
    DashError::Conversion {
        index,
        expected,
        found: describe(value),
    }
}

/// Truncate toward zero, refusing anything that does not fit an i32.
fn truncate_i32(f: f64) -> Option<i32> {
    let t = f.trunc();
    if t.is_finite() && t >= f64::from(i32::MIN) && t <= f64::from(i32::MAX) {
        Some(t as i32)
    } else {
        None
    }
}

fn to_i32(index: usize, value: &Value) -> Result<i32> {
    let converted = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i32::try_from(i).ok(),
            None => n.as_f64().and_then(truncate_i32),
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => i32::try_from(i).ok(),
                Err(_) => s.parse::<f64>().ok().and_then(truncate_i32),
            }
        }
        Value::Bool(b) => Some(i32::from(*b)),
        Value::Null => Some(0),
        Value::Array(_) | Value::Object(_) => None,
    };
    converted.ok_or_else(|| mismatch(index, "integer", value))
}

fn to_f64(index: usize, value: &Value) -> Result<f64> {
    let converted = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::Array(_) | Value::Object(_) => None,
    };
    converted
        .filter(|f| f.is_finite())
        .ok_or_else(|| mismatch(index, "real", value))
}

fn to_text(index: usize, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(mismatch(index, "string", value)),
    }
}
