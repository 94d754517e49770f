//! String concatenation.

use super::arithmetic::unsupported;
use crate::const_prop::ConcreteValue;
use crate::evaluator::EvalError;

/// `a + b` where at least one side is a string. The other side is converted
/// through its canonical string form.
pub fn concat(operands: &[ConcreteValue]) -> Result<ConcreteValue, EvalError> {
    match operands {
        [a, b] => Ok(ConcreteValue::Str(format!(
            "{}{}",
            a.to_canonical_string(),
            b.to_canonical_string()
        ))),
        _ => Err(unsupported("+", operands)),
    }
}
