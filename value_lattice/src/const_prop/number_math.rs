//! Per-kind numeric arithmetic.
//!
//! Operands are promoted to one of four computational kinds (`int`, `long`,
//! `float`, `double`) before an operator is applied. Integer arithmetic wraps
//! on overflow, shift counts are masked to the operand width, and integer
//! division or remainder by zero is an evaluation exception (`None`).

use crate::const_prop::ConcreteValue;
use crate::kind::PrimitiveKind;

/// Overflow-correct operators on one numeric representation.
pub trait NumberMath: Copy + PartialOrd {
    fn plus(self, rhs: Self) -> Self;
    fn minus(self, rhs: Self) -> Self;
    fn times(self, rhs: Self) -> Self;
    /// `None` when the operation throws (integer division by zero).
    fn divide(self, rhs: Self) -> Option<Self>;
    /// `None` when the operation throws (integer remainder by zero).
    fn remainder(self, rhs: Self) -> Option<Self>;
    fn unary_minus(self) -> Self;
    /// Bitwise and shift operators; `None` for floating kinds.
    fn shift_left(self, amount: i64) -> Option<Self>;
    fn signed_shift_right(self, amount: i64) -> Option<Self>;
    fn unsigned_shift_right(self, amount: i64) -> Option<Self>;
    fn bitwise_and(self, rhs: Self) -> Option<Self>;
    fn bitwise_or(self, rhs: Self) -> Option<Self>;
    fn bitwise_xor(self, rhs: Self) -> Option<Self>;
    fn bitwise_complement(self) -> Option<Self>;
}

macro_rules! integral_math {
    ($ty:ty, $unsigned:ty) => {
        impl NumberMath for $ty {
            fn plus(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }
            fn minus(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }
            fn times(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }
            fn divide(self, rhs: Self) -> Option<Self> {
                (rhs != 0).then(|| self.wrapping_div(rhs))
            }
            fn remainder(self, rhs: Self) -> Option<Self> {
                (rhs != 0).then(|| self.wrapping_rem(rhs))
            }
            fn unary_minus(self) -> Self {
                self.wrapping_neg()
            }
            fn shift_left(self, amount: i64) -> Option<Self> {
                Some(self.wrapping_shl(amount as u32))
            }
            fn signed_shift_right(self, amount: i64) -> Option<Self> {
                Some(self.wrapping_shr(amount as u32))
            }
            fn unsigned_shift_right(self, amount: i64) -> Option<Self> {
                Some((self as $unsigned).wrapping_shr(amount as u32) as $ty)
            }
            fn bitwise_and(self, rhs: Self) -> Option<Self> {
                Some(self & rhs)
            }
            fn bitwise_or(self, rhs: Self) -> Option<Self> {
                Some(self | rhs)
            }
            fn bitwise_xor(self, rhs: Self) -> Option<Self> {
                Some(self ^ rhs)
            }
            fn bitwise_complement(self) -> Option<Self> {
                Some(!self)
            }
        }
    };
}

macro_rules! floating_math {
    ($ty:ty) => {
        impl NumberMath for $ty {
            fn plus(self, rhs: Self) -> Self {
                self + rhs
            }
            fn minus(self, rhs: Self) -> Self {
                self - rhs
            }
            fn times(self, rhs: Self) -> Self {
                self * rhs
            }
            fn divide(self, rhs: Self) -> Option<Self> {
                Some(self / rhs)
            }
            fn remainder(self, rhs: Self) -> Option<Self> {
                Some(self % rhs)
            }
            fn unary_minus(self) -> Self {
                -self
            }
            fn shift_left(self, _amount: i64) -> Option<Self> {
                None
            }
            fn signed_shift_right(self, _amount: i64) -> Option<Self> {
                None
            }
            fn unsigned_shift_right(self, _amount: i64) -> Option<Self> {
                None
            }
            fn bitwise_and(self, _rhs: Self) -> Option<Self> {
                None
            }
            fn bitwise_or(self, _rhs: Self) -> Option<Self> {
                None
            }
            fn bitwise_xor(self, _rhs: Self) -> Option<Self> {
                None
            }
            fn bitwise_complement(self) -> Option<Self> {
                None
            }
        }
    };
}

integral_math!(i32, u32);
integral_math!(i64, u64);
floating_math!(f32);
floating_math!(f64);

/// A numeric operand after numeric promotion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Number {
    /// Promote a concrete value to the computational kind `kind`.
    pub fn promoted(value: &ConcreteValue, kind: PrimitiveKind) -> Option<Number> {
        match kind.unary_promote() {
            PrimitiveKind::Int => Some(Number::Int(value.as_i64()? as i32)),
            PrimitiveKind::Long => Some(Number::Long(value.as_i64()?)),
            PrimitiveKind::Float => match value {
                ConcreteValue::Double(d) => Some(Number::Float(*d as f32)),
                other => Some(Number::Float(other.as_f64()? as f32)),
            },
            PrimitiveKind::Double => Some(Number::Double(value.as_f64()?)),
            _ => None,
        }
    }

    pub fn kind(self) -> PrimitiveKind {
        match self {
            Number::Int(_) => PrimitiveKind::Int,
            Number::Long(_) => PrimitiveKind::Long,
            Number::Float(_) => PrimitiveKind::Float,
            Number::Double(_) => PrimitiveKind::Double,
        }
    }

    /// Shift count as an `i64`, for use as the right operand of a shift.
    pub fn as_shift_amount(self) -> Option<i64> {
        match self {
            Number::Int(v) => Some(v as i64),
            Number::Long(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Number> for ConcreteValue {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(v) => ConcreteValue::Int(v),
            Number::Long(v) => ConcreteValue::Long(v),
            Number::Float(v) => ConcreteValue::Float(v),
            Number::Double(v) => ConcreteValue::Double(v),
        }
    }
}
