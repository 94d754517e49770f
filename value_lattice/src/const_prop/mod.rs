//! Concrete values and per-kind arithmetic.
//!
//! The value engine evaluates operators on concrete values, one combination
//! of operand values at a time. This module defines those concrete values and
//! the numeric arithmetic each primitive kind uses.
//!
//! # Module structure
//!
//! - `number_math`: `NumberMath` trait and promoted `Number` operands

pub mod number_math;

pub use number_math::{Number, NumberMath};

use crate::kind::{PrimitiveKind, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single concrete value of a covered kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ConcreteValue {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
}

impl ConcreteValue {
    /// Static kind of the value.
    pub fn kind(&self) -> ValueKind {
        match self.primitive_kind() {
            Some(p) => ValueKind::Primitive(p),
            None => ValueKind::String,
        }
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            ConcreteValue::Boolean(_) => PrimitiveKind::Boolean,
            ConcreteValue::Byte(_) => PrimitiveKind::Byte,
            ConcreteValue::Short(_) => PrimitiveKind::Short,
            ConcreteValue::Char(_) => PrimitiveKind::Char,
            ConcreteValue::Int(_) => PrimitiveKind::Int,
            ConcreteValue::Long(_) => PrimitiveKind::Long,
            ConcreteValue::Float(_) => PrimitiveKind::Float,
            ConcreteValue::Double(_) => PrimitiveKind::Double,
            ConcreteValue::Str(_) => return None,
        })
    }

    /// Integral value widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConcreteValue::Byte(v) => Some(*v as i64),
            ConcreteValue::Short(v) => Some(*v as i64),
            ConcreteValue::Char(v) => Some(*v as i64),
            ConcreteValue::Int(v) => Some(*v as i64),
            ConcreteValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConcreteValue::Float(v) => Some(*v as f64),
            ConcreteValue::Double(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConcreteValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConcreteValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// An integral value of `kind`, truncated to its width.
    pub fn from_integral(value: i64, kind: PrimitiveKind) -> Option<ConcreteValue> {
        let wrapped = kind.wrap(value);
        Some(match kind {
            PrimitiveKind::Byte => ConcreteValue::Byte(wrapped as i8),
            PrimitiveKind::Short => ConcreteValue::Short(wrapped as i16),
            PrimitiveKind::Char => ConcreteValue::Char(wrapped as u16),
            PrimitiveKind::Int => ConcreteValue::Int(wrapped as i32),
            PrimitiveKind::Long => ConcreteValue::Long(wrapped),
            PrimitiveKind::Float => ConcreteValue::Float(value as f32),
            PrimitiveKind::Double => ConcreteValue::Double(value as f64),
            PrimitiveKind::Boolean => return None,
        })
    }

    /// A floating value of a floating `kind`.
    pub fn from_floating(value: f64, kind: PrimitiveKind) -> Option<ConcreteValue> {
        match kind {
            PrimitiveKind::Float => Some(ConcreteValue::Float(value as f32)),
            PrimitiveKind::Double => Some(ConcreteValue::Double(value)),
            _ => None,
        }
    }

    /// Primitive conversion to `kind`, as an explicit cast performs it.
    pub fn coerce(&self, kind: PrimitiveKind) -> Option<ConcreteValue> {
        if self.primitive_kind() == Some(kind) {
            return Some(self.clone());
        }
        match (self, kind) {
            (ConcreteValue::Boolean(_), _) | (_, PrimitiveKind::Boolean) => None,
            (ConcreteValue::Float(_) | ConcreteValue::Double(_), k) if k.is_integral() => {
                let d = self.as_f64()?;
                let widened = if k == PrimitiveKind::Long {
                    d as i64
                } else {
                    d as i32 as i64
                };
                ConcreteValue::from_integral(widened, k)
            }
            (_, k) if k.is_integral() => ConcreteValue::from_integral(self.as_i64()?, k),
            (_, PrimitiveKind::Float) => match self {
                ConcreteValue::Double(d) => Some(ConcreteValue::Float(*d as f32)),
                other => Some(ConcreteValue::Float(other.as_i64()? as f32)),
            },
            (_, _) => Some(ConcreteValue::Double(self.as_f64()?)),
        }
    }

    /// Canonical string form used by string conversion and concatenation.
    pub fn to_canonical_string(&self) -> String {
        match self {
            ConcreteValue::Boolean(b) => b.to_string(),
            ConcreteValue::Char(c) => char::from_u32(*c as u32)
                .map(String::from)
                .unwrap_or_else(|| char::REPLACEMENT_CHARACTER.to_string()),
            ConcreteValue::Float(f) => canonical_float_string(*f),
            ConcreteValue::Double(d) => canonical_double_string(*d),
            ConcreteValue::Str(s) => s.clone(),
            other => other.as_i64().map(|v| v.to_string()).unwrap_or_default(),
        }
    }
}

impl fmt::Display for ConcreteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcreteValue::Str(s) => write!(f, "{:?}", s),
            ConcreteValue::Char(_) => write!(f, "'{}'", self.to_canonical_string()),
            other => write!(f, "{}", other.to_canonical_string()),
        }
    }
}

/// Canonical string form of a double.
///
/// ```text
/// 1.0   -> "1.0"        1.5e10 -> "1.5E10"
/// NaN   -> "NaN"        -inf   -> "-Infinity"
/// ```
pub fn canonical_double_string(value: f64) -> String {
    format_floating(value, value.to_string(), |v| format!("{:E}", v))
}

/// Canonical string form of a float.
pub fn canonical_float_string(value: f32) -> String {
    format_floating(value as f64, value.to_string(), |_| format!("{:E}", value))
}

fn format_floating(value: f64, plain: String, scientific: impl Fn(f64) -> String) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-3..1e7).contains(&magnitude) {
        let text = scientific(value);
        return match text.split_once('E') {
            Some((mantissa, exponent)) if !mantissa.contains('.') => {
                format!("{}.0E{}", mantissa, exponent)
            }
            _ => text,
        };
    }
    if plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}
