//! Scalar values carried by options and positional arguments.

use std::fmt;

use crate::error::{Result, ShellError};

/// A string or number destined for the argument vector.
///
/// Two values are equal when they render to the same token, so `1` and
/// `"1"` are the same value as far as an option is concerned.
#[derive(Debug, Clone)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
}

impl Value {
    pub(crate) fn validate(&self) -> Result<()> {
        match self {
            Value::Float(f) if !f.is_finite() => {
                Err(ShellError::InvalidValue(format!(
                    "value can only be a string or finite number, [{}] given",
                    f
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn to_token(&self) -> String { self.to_string() }
}

impl Default for Value {
    fn default() -> Self { Value::Text(String::new()) }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            _ => self.to_token() == other.to_token(),
        }
    }
}

impl Eq for Value {}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Text(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::Text(s) }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self { Value::Text(s.clone()) }
}

macro_rules! int_from {
    ($($t:ty),*) => {
        $(impl From<$t> for Value { fn from(n: $t) -> Self { Value::Int(n as i64) } })*
    };
}

int_from!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(n: f32) -> Self { Value::Float(n as f64) }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Value::Float(n) }
}
