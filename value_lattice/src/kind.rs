//! Static representation kinds of analyzed expressions.
//!
//! The host type model is reduced to the handful of kinds the value engine
//! cares about: the primitive widths, their boxed forms, strings, arrays, and
//! every other declared type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive representation kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Char
                | PrimitiveKind::Int
                | PrimitiveKind::Long
        )
    }

    pub fn is_floating(self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integral() || self.is_floating()
    }

    /// Unary numeric promotion: sub-int integral kinds widen to `Int`.
    pub fn unary_promote(self) -> PrimitiveKind {
        match self {
            PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char => PrimitiveKind::Int,
            other => other,
        }
    }

    /// Binary numeric promotion.
    ///
    /// ```text
    /// double > float > long > int
    /// ```
    pub fn promote(self, other: PrimitiveKind) -> PrimitiveKind {
        use PrimitiveKind::*;
        match (self.unary_promote(), other.unary_promote()) {
            (Double, _) | (_, Double) => Double,
            (Float, _) | (_, Float) => Float,
            (Long, _) | (_, Long) => Long,
            _ => Int,
        }
    }

    /// Truncate an integral value to this kind's width (two's complement).
    ///
    /// Non-integral kinds return the value unchanged.
    pub fn wrap(self, value: i64) -> i64 {
        match self {
            PrimitiveKind::Byte => value as i8 as i64,
            PrimitiveKind::Short => value as i16 as i64,
            PrimitiveKind::Char => value as u16 as i64,
            PrimitiveKind::Int => value as i32 as i64,
            _ => value,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Name of the boxing class for this kind.
    pub fn box_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Char => "Character",
            PrimitiveKind::Int => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Static representation kind of an expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueKind {
    /// A primitive value.
    Primitive(PrimitiveKind),
    /// A boxed primitive (`Integer`, `Character`, ...).
    Boxed(PrimitiveKind),
    /// A string-like value.
    String,
    /// An array of any element type.
    Array,
    /// Any other declared reference type.
    Declared(String),
}

impl ValueKind {
    pub const BOOLEAN: ValueKind = ValueKind::Primitive(PrimitiveKind::Boolean);
    pub const BYTE: ValueKind = ValueKind::Primitive(PrimitiveKind::Byte);
    pub const SHORT: ValueKind = ValueKind::Primitive(PrimitiveKind::Short);
    pub const CHAR: ValueKind = ValueKind::Primitive(PrimitiveKind::Char);
    pub const INT: ValueKind = ValueKind::Primitive(PrimitiveKind::Int);
    pub const LONG: ValueKind = ValueKind::Primitive(PrimitiveKind::Long);
    pub const FLOAT: ValueKind = ValueKind::Primitive(PrimitiveKind::Float);
    pub const DOUBLE: ValueKind = ValueKind::Primitive(PrimitiveKind::Double);

    /// The primitive kind, unboxing boxed primitives.
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            ValueKind::Primitive(p) | ValueKind::Boxed(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_integral(&self) -> bool {
        self.primitive().is_some_and(PrimitiveKind::is_integral)
    }

    pub fn is_floating(&self) -> bool {
        self.primitive().is_some_and(PrimitiveKind::is_floating)
    }

    pub fn is_numeric(&self) -> bool {
        self.primitive().is_some_and(PrimitiveKind::is_numeric)
    }

    pub fn is_boolean(&self) -> bool {
        self.primitive() == Some(PrimitiveKind::Boolean)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, ValueKind::String)
    }

    /// True for every kind compared by identity under `==`.
    pub fn is_reference(&self) -> bool {
        !matches!(self, ValueKind::Primitive(_))
    }

    /// Whether values of this kind are tracked by the value engine.
    pub fn is_covered(&self) -> bool {
        !matches!(self, ValueKind::Declared(_))
    }

    /// Result kind of a binary operator applied to operands of these kinds.
    ///
    /// Shifts take the promoted kind of the left operand, comparisons and
    /// logical operators yield `boolean`, and `+` with a string operand is
    /// string concatenation.
    pub fn binary_result(
        op: crate::ir::BinaryOp,
        lhs: &ValueKind,
        rhs: &ValueKind,
    ) -> ValueKind {
        use crate::ir::BinaryOp;
        if op == BinaryOp::Add && (lhs.is_string() || rhs.is_string()) {
            return ValueKind::String;
        }
        if op.is_comparison() || op.is_logical() {
            return ValueKind::BOOLEAN;
        }
        match (lhs.primitive(), rhs.primitive()) {
            (Some(PrimitiveKind::Boolean), Some(PrimitiveKind::Boolean)) => ValueKind::BOOLEAN,
            (Some(l), _) if op.is_shift() => ValueKind::Primitive(l.unary_promote()),
            (Some(l), Some(r)) => ValueKind::Primitive(l.promote(r)),
            _ => lhs.clone(),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Primitive(p) => write!(f, "{}", p),
            ValueKind::Boxed(p) => write!(f, "{}", p.box_name()),
            ValueKind::String => write!(f, "String"),
            ValueKind::Array => write!(f, "array"),
            ValueKind::Declared(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::BinaryOp;

    #[test]
    fn test_binary_promotion() {
        use PrimitiveKind::*;
        assert_eq!(Byte.promote(Short), Int);
        assert_eq!(Char.promote(Int), Int);
        assert_eq!(Int.promote(Long), Long);
        assert_eq!(Long.promote(Float), Float);
        assert_eq!(Float.promote(Double), Double);
    }

    #[test]
    fn test_wrap_truncates() {
        assert_eq!(PrimitiveKind::Byte.wrap(200), -56);
        assert_eq!(PrimitiveKind::Short.wrap(40_000), -25_536);
        assert_eq!(PrimitiveKind::Char.wrap(-1), 65_535);
        assert_eq!(PrimitiveKind::Int.wrap(1 << 32), 0);
        assert_eq!(PrimitiveKind::Long.wrap(i64::MAX), i64::MAX);
    }

    #[test]
    fn test_binary_result_kinds() {
        assert_eq!(
            ValueKind::binary_result(BinaryOp::Add, &ValueKind::String, &ValueKind::INT),
            ValueKind::String
        );
        assert_eq!(
            ValueKind::binary_result(BinaryOp::Lt, &ValueKind::INT, &ValueKind::LONG),
            ValueKind::BOOLEAN
        );
        assert_eq!(
            ValueKind::binary_result(BinaryOp::Shl, &ValueKind::BYTE, &ValueKind::LONG),
            ValueKind::INT
        );
        assert_eq!(
            ValueKind::binary_result(
                BinaryOp::Mul,
                &ValueKind::Boxed(PrimitiveKind::Int),
                &ValueKind::LONG
            ),
            ValueKind::LONG
        );
    }
}
