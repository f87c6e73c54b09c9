use std::fmt;

use crate::envelope::RequestParam;
use crate::error::{Result, WireError};

/// The fixed set of wire parameter tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Int,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Bool,
}

impl ParamKind {
    pub const ALL: [ParamKind; 7] = [
        ParamKind::Int,
        ParamKind::Int32,
        ParamKind::Int64,
        ParamKind::Float32,
        ParamKind::Float64,
        ParamKind::String,
        ParamKind::Bool,
    ];

    /// The wire tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            ParamKind::Int => "int",
            ParamKind::Int32 => "int32",
            ParamKind::Int64 => "int64",
            ParamKind::Float32 => "float32",
            ParamKind::Float64 => "float64",
            ParamKind::String => "string",
            ParamKind::Bool => "bool",
        }
    }

    /// Resolve a wire tag. `None` for anything outside the supported set.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "int" => Some(ParamKind::Int),
            "int32" => Some(ParamKind::Int32),
            "int64" => Some(ParamKind::Int64),
            "float32" => Some(ParamKind::Float32),
            "float64" => Some(ParamKind::Float64),
            "string" => Some(ParamKind::String),
            "bool" => Some(ParamKind::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A typed call argument.
///
/// This is the in-memory side of the tagged-union wire encoding: each
/// variant maps to exactly one wire tag, and values round-trip through
/// [`Value::to_wire`] / [`Value::from_wire`] without loss.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bool(bool),
}

impl Value {
    /// The wire tag kind of this value.
    pub fn kind(&self) -> ParamKind {
        match self {
            Value::Int(_) => ParamKind::Int,
            Value::Int32(_) => ParamKind::Int32,
            Value::Int64(_) => ParamKind::Int64,
            Value::Float32(_) => ParamKind::Float32,
            Value::Float64(_) => ParamKind::Float64,
            Value::String(_) => ParamKind::String,
            Value::Bool(_) => ParamKind::Bool,
        }
    }

    /// Encode as a tagged wire parameter.
    ///
    /// Total for every variant. Integers and bools use their canonical
    /// decimal/keyword form; floats use the shortest decimal that parses
    /// back to the same value, so re-encoding is idempotent.
    pub fn to_wire(&self) -> RequestParam {
        let value = match self {
            Value::Int(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Float32(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Bool(v) => v.to_string(),
        };
        RequestParam {
            tag: self.kind().tag().to_string(),
            value,
        }
    }

    /// Decode a tagged wire parameter.
    ///
    /// An unknown tag or an unparsable value string is an explicit error,
    /// never a silent absent value.
    pub fn from_wire(param: &RequestParam) -> Result<Self> {
        let kind = ParamKind::from_tag(&param.tag)
            .ok_or_else(|| WireError::UnknownTag(param.tag.clone()))?;
        let bad = || WireError::BadValue {
            tag: kind.tag(),
            value: param.value.clone(),
        };
        Ok(match kind {
            ParamKind::Int => Value::Int(param.value.parse().map_err(|_| bad())?),
            ParamKind::Int32 => Value::Int32(param.value.parse().map_err(|_| bad())?),
            ParamKind::Int64 => Value::Int64(param.value.parse().map_err(|_| bad())?),
            ParamKind::Float32 => Value::Float32(param.value.parse().map_err(|_| bad())?),
            ParamKind::Float64 => Value::Float64(param.value.parse().map_err(|_| bad())?),
            ParamKind::String => Value::String(param.value.clone()),
            ParamKind::Bool => Value::Bool(param.value.parse().map_err(|_| bad())?),
        })
    }

    /// Build a value from dynamically-typed JSON input.
    ///
    /// This is the fallible entry point for untyped callers (the CLI, or
    /// anything bridging from configuration). Nested structures, arrays,
    /// and null have no wire representation and fail before any I/O.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Bool(v) => Ok(Value::Bool(*v)),
            serde_json::Value::String(v) => Ok(Value::String(v.clone())),
            serde_json::Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(Value::Int(v))
                } else if let Some(v) = n.as_f64() {
                    Ok(Value::Float64(v))
                } else {
                    Err(WireError::UnsupportedParam(n.to_string()))
                }
            }
            other => Err(WireError::UnsupportedParam(json_type_name(other).to_string())),
        }
    }
}

fn json_type_name(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// Conversion from a decoded [`Value`] into a native argument slot.
///
/// Integer slots accept any integer-tagged value that fits their range;
/// narrowing that would lose bits is an [`WireError::OutOfRange`] error,
/// not a wrap. `f64` slots additionally accept `float32` values.
pub trait FromValue: Sized {
    /// The wire tag a parameter slot of this type declares.
    const KIND: ParamKind;

    fn from_value(value: &Value) -> Result<Self>;
}

fn narrow_int<T: TryFrom<i64>>(v: i64, target: &'static str) -> Result<T> {
    T::try_from(v).map_err(|_| WireError::OutOfRange {
        target,
        value: v.to_string(),
    })
}

impl FromValue for i64 {
    const KIND: ParamKind = ParamKind::Int;

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Int(v) | Value::Int64(v) => Ok(*v),
            Value::Int32(v) => Ok(i64::from(*v)),
            other => Err(WireError::TypeMismatch {
                expected: Self::KIND.tag(),
                got: other.kind().tag(),
            }),
        }
    }
}

impl FromValue for i32 {
    const KIND: ParamKind = ParamKind::Int32;

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Int32(v) => Ok(*v),
            Value::Int(v) | Value::Int64(v) => narrow_int(*v, "int32"),
            other => Err(WireError::TypeMismatch {
                expected: Self::KIND.tag(),
                got: other.kind().tag(),
            }),
        }
    }
}

impl FromValue for f32 {
    const KIND: ParamKind = ParamKind::Float32;

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float32(v) => Ok(*v),
            other => Err(WireError::TypeMismatch {
                expected: Self::KIND.tag(),
                got: other.kind().tag(),
            }),
        }
    }
}

impl FromValue for f64 {
    const KIND: ParamKind = ParamKind::Float64;

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float64(v) => Ok(*v),
            Value::Float32(v) => Ok(f64::from(*v)),
            other => Err(WireError::TypeMismatch {
                expected: Self::KIND.tag(),
                got: other.kind().tag(),
            }),
        }
    }
}

impl FromValue for String {
    const KIND: ParamKind = ParamKind::String;

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v.clone()),
            other => Err(WireError::TypeMismatch {
                expected: Self::KIND.tag(),
                got: other.kind().tag(),
            }),
        }
    }
}

impl FromValue for bool {
    const KIND: ParamKind = ParamKind::Bool;

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(*v),
            other => Err(WireError::TypeMismatch {
                expected: Self::KIND.tag(),
                got: other.kind().tag(),
            }),
        }
    }
}
