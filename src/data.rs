use serde::Serialize;
use std::collections::HashMap;

/// A single field value as parsed from CSV text.
///
/// CSV fields are untyped; values are coerced opportunistically at parse
/// time so downstream analysis sees numbers and booleans rather than raw
/// tokens. Serializes untagged so records round-trip as plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    /// Coerce a raw CSV field into a typed value.
    ///
    /// Empty fields become `Null`, `true`/`false` become booleans,
    /// finite numeric tokens become numbers, everything else stays a string.
    pub fn from_field(raw: &str) -> Value {
        if raw.is_empty() {
            return Value::Null;
        }
        match raw {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
        if let Ok(n) = raw.trim().parse::<f64>() {
            if n.is_finite() {
                return Value::Number(n);
            }
        }
        Value::String(raw.to_string())
    }

    /// Numeric view of the value for chart series construction.
    ///
    /// Booleans chart as 0/1 and numeric-looking strings are parsed;
    /// everything else contributes 0.0 rather than aborting the render.
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            Value::Null => 0.0,
        }
    }

    /// Display form used for axis labels and pie slice names.
    pub fn as_label(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Value::String(s) => s.clone(),
        }
    }
}

/// One data row: header name to field value.
///
/// Ragged rows are permitted, so a record's key set may be a strict subset
/// of the dataset headers (missing trailing fields are simply absent).
pub type Record = HashMap<String, Value>;

/// Parsed CSV: ordered headers plus ordered data records.
///
/// Constructed once per request and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }
}
