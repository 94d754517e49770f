//! Operator registry for concrete evaluation.
//!
//! Maps an operator and the kind its operands are promoted to onto the
//! function that evaluates one combination of operand values. The transfer
//! function drives the table through the [`Evaluator`] trait, so primitive
//! operators and library methods share one calling convention.

use super::Operator;
use crate::const_prop::ConcreteValue;
use crate::diagnostics::emit_operator_failed;
use crate::evaluator::{cartesian_eval, EvalError, Evaluator, OpId};
use crate::ir::{BinaryOp, UnaryOp};
use crate::kind::{PrimitiveKind, ValueKind};
use std::collections::HashMap;

/// Computational kind the operands of an operator are promoted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperandKind {
    Int,
    Long,
    Float,
    Double,
    Boolean,
    String,
}

impl OperandKind {
    fn from_primitive(kind: PrimitiveKind) -> Option<OperandKind> {
        match kind.unary_promote() {
            PrimitiveKind::Int => Some(OperandKind::Int),
            PrimitiveKind::Long => Some(OperandKind::Long),
            PrimitiveKind::Float => Some(OperandKind::Float),
            PrimitiveKind::Double => Some(OperandKind::Double),
            PrimitiveKind::Boolean => Some(OperandKind::Boolean),
            _ => None,
        }
    }

    /// Operand kind of `lhs op rhs`, or `None` when the operator does not apply.
    ///
    /// # Examples
    /// ```text
    /// byte + short    → Int
    /// int * long      → Long
    /// long << int     → Long   (left operand only)
    /// String + int    → String
    /// boolean && boolean → Boolean
    /// ```
    pub fn for_binary(op: BinaryOp, lhs: &ValueKind, rhs: &ValueKind) -> Option<OperandKind> {
        if op == BinaryOp::Add && (lhs.is_string() || rhs.is_string()) {
            return Some(OperandKind::String);
        }
        let (l, r) = (lhs.primitive()?, rhs.primitive()?);
        if l == PrimitiveKind::Boolean || r == PrimitiveKind::Boolean {
            let boolean_op = op.is_logical()
                || matches!(
                    op,
                    BinaryOp::Eq
                        | BinaryOp::Ne
                        | BinaryOp::BitAnd
                        | BinaryOp::BitOr
                        | BinaryOp::BitXor
                );
            return (l == r && boolean_op).then_some(OperandKind::Boolean);
        }
        if op.is_logical() {
            return None;
        }
        if op.is_shift() {
            return r.is_integral().then(|| Self::from_primitive(l)).flatten();
        }
        Self::from_primitive(l.promote(r))
    }

    /// Operand kind of a unary operator on `operand`.
    pub fn for_unary(op: UnaryOp, operand: &ValueKind) -> Option<OperandKind> {
        let p = operand.primitive()?;
        match op {
            UnaryOp::Not => (p == PrimitiveKind::Boolean).then_some(OperandKind::Boolean),
            _ if p.is_numeric() => Self::from_primitive(p),
            _ => None,
        }
    }
}

/// Evaluates one combination of operand values.
pub type OperatorFn = fn(&[ConcreteValue]) -> Result<ConcreteValue, EvalError>;

/// Registry of operator implementations.
///
/// # Example
/// ```
/// use value_lattice::tfuncs::{OperandKind, Operator, OperatorTable};
/// use value_lattice::const_prop::ConcreteValue;
/// use value_lattice::ir::BinaryOp;
///
/// let table = OperatorTable::with_defaults();
/// let sum = table
///     .evaluate(
///         Operator::Binary(BinaryOp::Add),
///         OperandKind::Int,
///         &[ConcreteValue::Int(2), ConcreteValue::Int(3)],
///     )
///     .unwrap();
/// assert_eq!(sum, ConcreteValue::Int(5));
/// ```
#[derive(Debug, Default)]
pub struct OperatorTable {
    functions: HashMap<(Operator, OperandKind), OperatorFn>,
}

impl OperatorTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with every standard operator registered.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        super::register_all(&mut table);
        table
    }

    pub fn register(&mut self, op: Operator, kind: OperandKind, func: OperatorFn) {
        self.functions.insert((op, kind), func);
    }

    pub fn lookup(&self, op: Operator, kind: OperandKind) -> Option<OperatorFn> {
        self.functions.get(&(op, kind)).copied()
    }

    pub fn contains(&self, op: Operator, kind: OperandKind) -> bool {
        self.functions.contains_key(&(op, kind))
    }

    /// Evaluates `op` on one combination of operands.
    pub fn evaluate(
        &self,
        op: Operator,
        kind: OperandKind,
        operands: &[ConcreteValue],
    ) -> Result<ConcreteValue, EvalError> {
        let func = self.lookup(op, kind).ok_or_else(|| {
            EvalError::MethodNotFound(format!("{} ({:?})", op.symbol(), kind))
        })?;
        func(operands)
    }
}

impl Evaluator for OperatorTable {
    fn try_eval(
        &self,
        op: &OpId,
        receiver: Option<&[ConcreteValue]>,
        args: &[Vec<ConcreteValue>],
        max_combinations: usize,
    ) -> Result<Vec<ConcreteValue>, EvalError> {
        let (operator, kind) = match op {
            OpId::Operator { op, kind } => (*op, *kind),
            OpId::Method(method) => return Err(EvalError::MethodNotFound(method.to_string())),
        };
        if receiver.is_some() {
            return Err(EvalError::UnsupportedOperands {
                op: operator.symbol().to_string(),
                operands: "receiver".to_string(),
            });
        }
        let func = self.lookup(operator, kind).ok_or_else(|| {
            EvalError::MethodNotFound(format!("{} ({:?})", operator.symbol(), kind))
        })?;
        let label = operator.symbol();
        cartesian_eval(None, args, max_combinations, |_, operands| {
            func(operands).inspect_err(|err| {
                if let EvalError::Exception(_) = err {
                    let shown: Vec<String> = operands.iter().map(ToString::to_string).collect();
                    emit_operator_failed(label, &shown.join(", "));
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_kind_promotion() {
        let add = BinaryOp::Add;
        assert_eq!(
            OperandKind::for_binary(add, &ValueKind::BYTE, &ValueKind::SHORT),
            Some(OperandKind::Int)
        );
        assert_eq!(
            OperandKind::for_binary(add, &ValueKind::INT, &ValueKind::LONG),
            Some(OperandKind::Long)
        );
        assert_eq!(
            OperandKind::for_binary(add, &ValueKind::LONG, &ValueKind::FLOAT),
            Some(OperandKind::Float)
        );
        assert_eq!(
            OperandKind::for_binary(BinaryOp::Shl, &ValueKind::INT, &ValueKind::LONG),
            Some(OperandKind::Int)
        );
        assert_eq!(
            OperandKind::for_binary(add, &ValueKind::String, &ValueKind::INT),
            Some(OperandKind::String)
        );
        assert_eq!(
            OperandKind::for_binary(BinaryOp::And, &ValueKind::BOOLEAN, &ValueKind::BOOLEAN),
            Some(OperandKind::Boolean)
        );
        assert_eq!(
            OperandKind::for_binary(add, &ValueKind::BOOLEAN, &ValueKind::BOOLEAN),
            None
        );
        assert_eq!(
            OperandKind::for_binary(
                BinaryOp::Lt,
                &ValueKind::Declared("Foo".into()),
                &ValueKind::INT
            ),
            None
        );
    }

    #[test]
    fn test_unary_kind() {
        assert_eq!(
            OperandKind::for_unary(UnaryOp::Minus, &ValueKind::CHAR),
            Some(OperandKind::Int)
        );
        assert_eq!(
            OperandKind::for_unary(UnaryOp::Not, &ValueKind::BOOLEAN),
            Some(OperandKind::Boolean)
        );
        assert_eq!(OperandKind::for_unary(UnaryOp::Not, &ValueKind::INT), None);
    }

    #[test]
    fn test_try_eval_cartesian() {
        let table = OperatorTable::with_defaults();
        let op = OpId::Operator {
            op: Operator::Binary(BinaryOp::Mul),
            kind: OperandKind::Int,
        };
        let args = vec![
            vec![ConcreteValue::Int(2), ConcreteValue::Int(3)],
            vec![ConcreteValue::Int(10)],
        ];
        let out = table.try_eval(&op, None, &args, 100).unwrap();
        assert_eq!(out, vec![ConcreteValue::Int(20), ConcreteValue::Int(30)]);
    }

    #[test]
    fn test_try_eval_rejects_methods() {
        let table = OperatorTable::with_defaults();
        let op = OpId::Method(crate::ir::MethodId::instance("String", "length"));
        assert!(matches!(
            table.try_eval(&op, None, &[], 100),
            Err(EvalError::MethodNotFound(_))
        ));
    }

    #[test]
    fn test_missing_operator() {
        let table = OperatorTable::new();
        assert!(table
            .evaluate(
                Operator::Unary(UnaryOp::Not),
                OperandKind::Boolean,
                &[ConcreteValue::Boolean(true)]
            )
            .is_err());
    }
}
