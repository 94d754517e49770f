//! Cartesian evaluation boundary.
//!
//! Operators and library methods are evaluated the same way: every
//! combination of the receiver's and the arguments' possible concrete values
//! is run through one implementation, and the results are collected. An
//! [`Evaluator`] is injected into the transfer function, so the host decides
//! how (or whether) methods actually run.
//!
//! # Failure contract
//!
//! - A combination that throws is reported and omitted; the others still run.
//! - A method that cannot be resolved fails the whole call.
//! - More combinations than the configured limit fail the whole call.
//!
//! Callers treat a failed call, and an empty result list, as `Unknown`.

pub mod native;

pub use native::{NativeEvaluator, NativeFn};

use crate::const_prop::ConcreteValue;
use crate::diagnostics::emit_too_many_combinations;
use crate::ir::MethodId;
use crate::tfuncs::{OperandKind, Operator};
use thiserror::Error;

/// Errors from evaluating one operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("{0} requires a receiver")]
    MissingReceiver(String),

    #[error("{method} expects {expected} argument(s), got {found}")]
    Arity {
        method: String,
        expected: usize,
        found: usize,
    },

    /// The evaluated operation threw.
    #[error("exception: {0}")]
    Exception(String),

    #[error("too many argument combinations: {count} (limit {max})")]
    TooManyCombinations { count: usize, max: usize },

    #[error("unsupported operands for {op}: {operands}")]
    UnsupportedOperands { op: String, operands: String },
}

/// What to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OpId {
    /// A primitive operator on operands promoted to `kind`.
    Operator { op: Operator, kind: OperandKind },
    /// A library method.
    Method(MethodId),
}

impl std::fmt::Display for OpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpId::Operator { op, kind } => write!(f, "{} ({:?})", op.symbol(), kind),
            OpId::Method(method) => write!(f, "{}", method),
        }
    }
}

/// Evaluates an operation over sets of possible operand values.
pub trait Evaluator: std::fmt::Debug {
    /// Evaluate `op` for every combination of `receiver` × `args`.
    ///
    /// `args[i]` holds the possible values of the i-th argument. The result
    /// holds one entry per combination that did not throw.
    fn try_eval(
        &self,
        op: &OpId,
        receiver: Option<&[ConcreteValue]>,
        args: &[Vec<ConcreteValue>],
        max_combinations: usize,
    ) -> Result<Vec<ConcreteValue>, EvalError>;
}

/// An evaluator that resolves nothing, for hosts that disable evaluation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledEvaluator;

impl Evaluator for DisabledEvaluator {
    fn try_eval(
        &self,
        op: &OpId,
        _receiver: Option<&[ConcreteValue]>,
        _args: &[Vec<ConcreteValue>],
        _max_combinations: usize,
    ) -> Result<Vec<ConcreteValue>, EvalError> {
        Err(EvalError::MethodNotFound(op.to_string()))
    }
}

/// Number of combinations of the given candidate lists, saturating.
pub fn combination_count(receiver: Option<&[ConcreteValue]>, args: &[Vec<ConcreteValue>]) -> usize {
    let base = receiver.map_or(1, <[ConcreteValue]>::len);
    args.iter()
        .fold(base, |acc, values| acc.saturating_mul(values.len()))
}

/// Run `eval_one` over the cartesian product of receiver and arguments.
///
/// Combinations that throw are skipped; any other error aborts.
pub fn cartesian_eval<F>(
    receiver: Option<&[ConcreteValue]>,
    args: &[Vec<ConcreteValue>],
    max_combinations: usize,
    mut eval_one: F,
) -> Result<Vec<ConcreteValue>, EvalError>
where
    F: FnMut(Option<&ConcreteValue>, &[ConcreteValue]) -> Result<ConcreteValue, EvalError>,
{
    let count = combination_count(receiver, args);
    if count > max_combinations {
        emit_too_many_combinations(count, max_combinations);
        return Err(EvalError::TooManyCombinations {
            count,
            max: max_combinations,
        });
    }
    if count == 0 {
        return Ok(Vec::new());
    }

    let receivers: Vec<Option<&ConcreteValue>> = match receiver {
        Some(values) => values.iter().map(Some).collect(),
        None => vec![None],
    };

    let mut results = Vec::with_capacity(count);
    let mut indices = vec![0usize; args.len()];
    let mut tuple: Vec<ConcreteValue> = Vec::with_capacity(args.len());
    for recv in receivers {
        indices.iter_mut().for_each(|i| *i = 0);
        loop {
            tuple.clear();
            tuple.extend(args.iter().zip(&indices).map(|(values, &i)| values[i].clone()));
            match eval_one(recv, &tuple) {
                Ok(value) => results.push(value),
                Err(EvalError::Exception(_)) => {}
                Err(other) => return Err(other),
            }
            if !advance(&mut indices, args) {
                break;
            }
        }
    }
    Ok(results)
}

/// Odometer step over the argument lists; false once every tuple was visited.
fn advance(indices: &mut [usize], args: &[Vec<ConcreteValue>]) -> bool {
    for pos in (0..indices.len()).rev() {
        indices[pos] += 1;
        if indices[pos] < args[pos].len() {
            return true;
        }
        indices[pos] = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i32]) -> Vec<ConcreteValue> {
        values.iter().map(|&v| ConcreteValue::Int(v)).collect()
    }

    fn add(
        _recv: Option<&ConcreteValue>,
        args: &[ConcreteValue],
    ) -> Result<ConcreteValue, EvalError> {
        let sum: i64 = args.iter().filter_map(ConcreteValue::as_i64).sum();
        Ok(ConcreteValue::Long(sum))
    }

    #[test]
    fn test_cartesian_visits_every_tuple() {
        let args = vec![ints(&[1, 2]), ints(&[10, 20, 30])];
        let results = cartesian_eval(None, &args, 100, add).unwrap();
        let sums: Vec<i64> = results.iter().filter_map(ConcreteValue::as_i64).collect();
        assert_eq!(sums, vec![11, 21, 31, 12, 22, 32]);
    }

    #[test]
    fn test_cartesian_with_receiver() {
        let recv = ints(&[100, 200]);
        let args = vec![ints(&[1])];
        let results = cartesian_eval(Some(&recv), &args, 100, |r, a| {
            let base = r.and_then(ConcreteValue::as_i64).unwrap_or(0);
            Ok(ConcreteValue::Long(base + a[0].as_i64().unwrap_or(0)))
        })
        .unwrap();
        assert_eq!(results, vec![ConcreteValue::Long(101), ConcreteValue::Long(201)]);
    }

    #[test]
    fn test_cartesian_no_args() {
        let results = cartesian_eval(None, &[], 10, |_, _| Ok(ConcreteValue::Int(7))).unwrap();
        assert_eq!(results, ints(&[7]));
    }

    #[test]
    fn test_exceptions_are_omitted() {
        let args = vec![ints(&[0, 2])];
        let results = cartesian_eval(None, &args, 10, |_, a| match a[0].as_i64() {
            Some(0) => Err(EvalError::Exception("/ by zero".into())),
            Some(v) => Ok(ConcreteValue::Long(10 / v)),
            None => unreachable!(),
        })
        .unwrap();
        assert_eq!(results, vec![ConcreteValue::Long(5)]);
    }

    #[test]
    fn test_too_many_combinations() {
        let args = vec![ints(&[1, 2, 3]), ints(&[1, 2, 3])];
        let err = cartesian_eval(None, &args, 8, add).unwrap_err();
        assert_eq!(err, EvalError::TooManyCombinations { count: 9, max: 8 });
    }

    #[test]
    fn test_empty_argument_list_yields_nothing() {
        let args = vec![ints(&[1]), Vec::new()];
        assert_eq!(cartesian_eval(None, &args, 8, add).unwrap(), Vec::new());
    }

    #[test]
    fn test_disabled_evaluator() {
        let op = OpId::Method(MethodId::instance("String", "length"));
        assert!(matches!(
            DisabledEvaluator.try_eval(&op, None, &[], 10),
            Err(EvalError::MethodNotFound(_))
        ));
    }
}
