//! Bitwise and shift operators on `int` and `long` operands.
//!
//! Shift amounts may be `int` or `long`; only the low 5 (int) or 6 (long)
//! bits of the amount are used.

use super::arithmetic::{pair, single, unsupported, Operand};
use crate::const_prop::ConcreteValue;
use crate::evaluator::EvalError;

fn shift_operands<T: Operand>(
    op: &str,
    operands: &[ConcreteValue],
) -> Result<(T, i64), EvalError> {
    match operands {
        [value, amount] => match (T::extract(value), amount.as_i64()) {
            (Some(v), Some(n)) => Ok((v, n)),
            _ => Err(unsupported(op, operands)),
        },
        _ => Err(unsupported(op, operands)),
    }
}

fn integral_only(
    op: &str,
    operands: &[ConcreteValue],
    result: Option<ConcreteValue>,
) -> Result<ConcreteValue, EvalError> {
    result.ok_or_else(|| unsupported(op, operands))
}

pub fn and<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, b) = pair::<T>("&", operands)?;
    integral_only("&", operands, a.bitwise_and(b).map(Operand::into_value))
}

pub fn or<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, b) = pair::<T>("|", operands)?;
    integral_only("|", operands, a.bitwise_or(b).map(Operand::into_value))
}

pub fn xor<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, b) = pair::<T>("^", operands)?;
    integral_only("^", operands, a.bitwise_xor(b).map(Operand::into_value))
}

pub fn complement<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let a = single::<T>("~", operands)?;
    integral_only("~", operands, a.bitwise_complement().map(Operand::into_value))
}

pub fn shl<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, n) = shift_operands::<T>("<<", operands)?;
    integral_only("<<", operands, a.shift_left(n).map(Operand::into_value))
}

pub fn shr<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, n) = shift_operands::<T>(">>", operands)?;
    integral_only(">>", operands, a.signed_shift_right(n).map(Operand::into_value))
}

pub fn ushr<T: Operand>(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    let (a, n) = shift_operands::<T>(">>>", operands)?;
    integral_only(">>>", operands, a.unsigned_shift_right(n).map(Operand::into_value))
}
