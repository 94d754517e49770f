//! Relational, equality and boolean operators.

use super::arithmetic::{pair, unsupported, Operand};
use crate::const_prop::ConcreteValue;
use crate::evaluator::EvalError;

fn compare<T: Operand>(
    op: &str,
    operands: &[ConcreteValue],
    test: fn(&T, &T) -> bool,
) -> Result<ConcreteValue, EvalError> {
    let (a, b) = pair::<T>(op, operands)?;
    Ok(ConcreteValue::Boolean(test(&a, &b)))
}

pub fn lt<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    compare::<T>("<", operands, T::lt)
}

pub fn le<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    compare::<T>("<=", operands, T::le)
}

pub fn gt<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    compare::<T>(">", operands, T::gt)
}

pub fn ge<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    compare::<T>(">=", operands, T::ge)
}

/// Numeric equality: `NaN == NaN` is false and `0.0 == -0.0` is true.
pub fn eq<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    compare::<T>("==", operands, |a, b| a.partial_cmp(b) == Some(std::cmp::Ordering::Equal))
}

pub fn ne<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    compare::<T>("!=", operands, |a, b| a.partial_cmp(b) != Some(std::cmp::Ordering::Equal))
}

// ── boolean ──

fn bools(op: &str, operands: &[ConcreteValue]) -> Result<(bool, bool), EvalError> {
    match operands {
        [a, b] => match (a.as_bool(), b.as_bool()) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(unsupported(op, operands)),
        },
        _ => Err(unsupported(op, operands)),
    }
}

pub fn bool_not(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    match operands {
        [ConcreteValue::Boolean(b)] => Ok(ConcreteValue::Boolean(!b)),
        _ => Err(unsupported("!", operands)),
    }
}

pub fn bool_and(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, b) = bools("&&", operands)?;
    Ok(ConcreteValue::Boolean(a && b))
}

pub fn bool_or(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, b) = bools("||", operands)?;
    Ok(ConcreteValue::Boolean(a || b))
}

pub fn bool_xor(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, b) = bools("^", operands)?;
    Ok(ConcreteValue::Boolean(a ^ b))
}

pub fn bool_eq(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, b) = bools("==", operands)?;
    Ok(ConcreteValue::Boolean(a == b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConcreteValue::{Boolean, Char, Double, Int, Long};

    #[test]
    fn test_mixed_width_comparison() {
        assert_eq!(lt::<i64>(&[Int(-1), Long(0)]), Ok(Boolean(true)));
        assert_eq!(ge::<i32>(&[Char(65), Int(65)]), Ok(Boolean(true)));
    }

    #[test]
    fn test_nan_is_unordered() {
        let nan = Double(f64::NAN);
        assert_eq!(eq::<f64>(&[nan.clone(), nan.clone()]), Ok(Boolean(false)));
        assert_eq!(ne::<f64>(&[nan.clone(), nan.clone()]), Ok(Boolean(true)));
        assert_eq!(lt::<f64>(&[nan, Double(1.0)]), Ok(Boolean(false)));
        assert_eq!(eq::<f64>(&[Double(0.0), Double(-0.0)]), Ok(Boolean(true)));
    }

    #[test]
    fn test_boolean_ops() {
        assert_eq!(bool_not(&[Boolean(true)]), Ok(Boolean(false)));
        assert_eq!(bool_and(&[Boolean(true), Boolean(false)]), Ok(Boolean(false)));
        assert_eq!(bool_or(&[Boolean(true), Boolean(false)]), Ok(Boolean(true)));
        assert_eq!(bool_xor(&[Boolean(true), Boolean(true)]), Ok(Boolean(false)));
        assert!(bool_and(&[Boolean(true), Int(1)]).is_err());
    }
}
