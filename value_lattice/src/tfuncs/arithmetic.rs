//! Arithmetic operators on promoted numeric operands.
//!
//! Integer arithmetic wraps on overflow and throws on division or remainder
//! by zero; floating arithmetic follows IEEE 754.

use crate::const_prop::{ConcreteValue, NumberMath};
use crate::evaluator::EvalError;

/// A numeric representation operands can be promoted to.
pub trait Operand: NumberMath {
    /// Promote a concrete operand to this representation.
    fn extract(value: &ConcreteValue) -> Option<Self>;
    fn into_value(self) -> ConcreteValue;
}

impl Operand for i32 {
    fn extract(value: &ConcreteValue) -> Option<Self> {
        value.as_i64().map(|v| v as i32)
    }
    fn into_value(self) -> ConcreteValue {
        ConcreteValue::Int(self)
    }
}

impl Operand for i64 {
    fn extract(value: &ConcreteValue) -> Option<Self> {
        value.as_i64()
    }
    fn into_value(self) -> ConcreteValue {
        ConcreteValue::Long(self)
    }
}

impl Operand for f32 {
    fn extract(value: &ConcreteValue) -> Option<Self> {
        match value {
            ConcreteValue::Float(v) => Some(*v),
            ConcreteValue::Double(v) => Some(*v as f32),
            other => other.as_i64().map(|v| v as f32),
        }
    }
    fn into_value(self) -> ConcreteValue {
        ConcreteValue::Float(self)
    }
}

impl Operand for f64 {
    fn extract(value: &ConcreteValue) -> Option<Self> {
        value.as_f64()
    }
    fn into_value(self) -> ConcreteValue {
        ConcreteValue::Double(self)
    }
}

pub(crate) fn unsupported(op: &str, operands: &[ConcreteValue]) -> EvalError {
    let shown: Vec<String> = operands.iter().map(ToString::to_string).collect();
    EvalError::UnsupportedOperands {
        op: op.to_string(),
        operands: shown.join(", "),
    }
}

/// Both operands of a binary operator, promoted to `T`.
pub(crate) fn pair<T: Operand>(op: &str, operands: &[ConcreteValue]) -> Result<(T, T), EvalError> {
    match operands {
        [a, b] => match (T::extract(a), T::extract(b)) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(unsupported(op, operands)),
        },
        _ => Err(unsupported(op, operands)),
    }
}

pub(crate) fn single<T: Operand>(op: &str, operands: &[ConcreteValue]) -> Result<T, EvalError> {
    match operands {
        [a] => T::extract(a).ok_or_else(|| unsupported(op, operands)),
        _ => Err(unsupported(op, operands)),
    }
}

pub fn add<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, b) = pair::<T>("+", operands)?;
    Ok(a.plus(b).into_value())
}

pub fn sub<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, b) = pair::<T>("-", operands)?;
    Ok(a.minus(b).into_value())
}

pub fn mul<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, b) = pair::<T>("*", operands)?;
    Ok(a.times(b).into_value())
}

pub fn div<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, b) = pair::<T>("/", operands)?;
    a.divide(b)
        .map(Operand::into_value)
        .ok_or_else(|| EvalError::Exception("ArithmeticException: / by zero".to_string()))
}

pub fn rem<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, b) = pair::<T>("%", operands)?;
    a.remainder(b)
        .map(Operand::into_value)
        .ok_or_else(|| EvalError::Exception("ArithmeticException: / by zero".to_string()))
}

pub fn neg<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    Ok(single::<T>("-", operands)?.unary_minus().into_value())
}

pub fn pos<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    Ok(single::<T>("+", operands)?.into_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConcreteValue::{Byte, Double, Int, Long};

    #[test]
    fn test_int_add_wraps() {
        assert_eq!(add::<i32>(&[Int(i32::MAX), Int(1)]), Ok(Int(i32::MIN)));
    }

    #[test]
    fn test_promoted_operands() {
        assert_eq!(add::<i32>(&[Byte(100), Byte(100)]), Ok(Int(200)));
        assert_eq!(mul::<i64>(&[Int(1 << 20), Long(1 << 20)]), Ok(Long(1 << 40)));
        assert_eq!(div::<f64>(&[Int(1), Double(4.0)]), Ok(Double(0.25)));
    }

    #[test]
    fn test_division_by_zero_throws() {
        assert!(matches!(div::<i32>(&[Int(1), Int(0)]), Err(EvalError::Exception(_))));
        assert!(matches!(rem::<i64>(&[Long(1), Long(0)]), Err(EvalError::Exception(_))));
        assert!(matches!(
            div::<f64>(&[Double(1.0), Double(0.0)]),
            Ok(Double(d)) if d.is_infinite()
        ));
    }

    #[test]
    fn test_remainder_sign_follows_dividend() {
        assert_eq!(rem::<i32>(&[Int(-7), Int(3)]), Ok(Int(-1)));
        assert_eq!(rem::<i32>(&[Int(7), Int(-3)]), Ok(Int(1)));
    }

    #[test]
    fn test_wrong_operand_count() {
        assert!(matches!(
            add::<i32>(&[Int(1)]),
            Err(EvalError::UnsupportedOperands { .. })
        ));
    }
}
