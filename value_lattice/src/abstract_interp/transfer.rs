//! Per-node transfer function.
//!
//! [`ValueTransfer::eval`] computes the [`Fact`] of an expression from the
//! facts of its operands and records it in a [`NodeFacts`] table. Operators
//! and method calls are first evaluated concretely over the cartesian product
//! of the operands' value sets; when that is impossible (an operand is
//! `Unknown`, or there are too many combinations) integral results fall back
//! to range arithmetic.

use super::conditional::split_env_by_condition;
use super::env::FactEnv;
use crate::config::AnalysisConfig;
use crate::const_prop::ConcreteValue;
use crate::diagnostics::{
    emit_possible_division_by_zero, emit_range_overflow, emit_shift_out_of_range,
};
use crate::evaluator::{Evaluator, NativeEvaluator, OpId};
use crate::ir::{BinaryOp, Expr, ExprKind, IncDec, MethodId, NodeId, UnaryOp};
use crate::kind::{PrimitiveKind, ValueKind};
use crate::lattice::{Fact, Range, ValueSet};
use crate::tfuncs::{OperandKind, Operator, OperatorTable};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Facts computed for expression nodes, keyed by node id.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NodeFacts {
    facts: BTreeMap<NodeId, Fact>,
}

impl NodeFacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the fact of a node, replacing an earlier visit.
    pub fn record(&mut self, id: NodeId, fact: Fact) {
        self.facts.insert(id, fact);
    }

    pub fn get(&self, id: NodeId) -> Option<&Fact> {
        self.facts.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Fact)> {
        self.facts.iter().map(|(id, fact)| (*id, fact))
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Serialize the table as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.facts)
    }
}

/// The transfer function of the value analysis.
#[derive(Debug)]
pub struct ValueTransfer {
    config: AnalysisConfig,
    operators: OperatorTable,
    evaluator: Box<dyn Evaluator>,
}

impl ValueTransfer {
    /// Standard operators and the built-in library methods.
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            operators: OperatorTable::with_defaults(),
            evaluator: Box::new(NativeEvaluator::with_defaults()),
        }
    }

    /// Replace the evaluator used for method calls.
    pub fn with_evaluator(mut self, evaluator: Box<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Computes the fact of `expr` in `env` and records it, and those of its
    /// sub-expressions, in `facts`.
    ///
    /// Every node of an expression in an unreachable environment is `Bottom`.
    pub fn eval(&self, expr: &Expr, env: &FactEnv, facts: &mut NodeFacts) -> Fact {
        if env.is_unreachable() {
            expr.walk(&mut |node| facts.record(node.id, Fact::bottom()));
            return Fact::bottom();
        }
        let fact = self.eval_node(expr, env, facts);
        facts.record(expr.id, fact.clone());
        fact
    }

    fn eval_node(&self, expr: &Expr, env: &FactEnv, facts: &mut NodeFacts) -> Fact {
        match &expr.kind {
            ExprKind::Literal(value) => Fact::from_value(ValueSet::from_literal(value)),
            ExprKind::Var(name) => self.read_var(name, &expr.ty, env),
            ExprKind::Binary { op, lhs, rhs } if op.is_logical() => {
                self.eval_logical(*op, lhs, rhs, env, facts)
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let left = self.eval(lhs, env, facts);
                let right = self.eval(rhs, env, facts);
                self.binary(*op, (lhs, &left), (rhs, &right), &expr.ty)
            }
            ExprKind::Unary { op, operand } => {
                let inner = self.eval(operand, env, facts);
                self.unary(*op, operand, &inner, &expr.ty)
            }
            ExprKind::Increment { var, op } => {
                let old = self.read_var(var, &expr.ty, env);
                if op.is_postfix() {
                    old
                } else {
                    self.stepped(&expr.ty, &old, *op)
                }
            }
            ExprKind::Cast(inner) => {
                let fact = self.eval(inner, env, facts);
                self.cast(inner, &fact, &expr.ty)
            }
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                self.eval(cond, env, facts);
                let split = split_env_by_condition(self, env, cond);
                let then_fact = self.eval(then, &split.then_env, facts);
                let else_fact = self.eval(otherwise, &split.else_env, facts);
                let then_fact = self.coerce(then, then_fact, &expr.ty);
                let else_fact = self.coerce(otherwise, else_fact, &expr.ty);
                then_fact.join(&else_fact, &self.config)
            }
            ExprKind::Call {
                method,
                receiver,
                args,
            } => {
                let receiver = receiver
                    .as_deref()
                    .map(|r| (r, self.eval(r, env, facts)));
                let args: Vec<(&Expr, Fact)> = args
                    .iter()
                    .map(|arg| (arg, self.eval(arg, env, facts)))
                    .collect();
                self.call(method, receiver, &args, &expr.ty)
            }
            ExprKind::NewArray(length) => {
                let fact = self.eval(length, env, facts);
                self.new_array(&fact)
            }
            ExprKind::ArrayLength(array) => {
                let fact = self.eval(array, env, facts);
                self.length_of(&fact.value)
            }
        }
    }

    fn read_var(&self, name: &str, ty: &ValueKind, env: &FactEnv) -> Fact {
        env.get(name).cloned().unwrap_or_else(|| Fact::top(ty))
    }

    // ── operators ──

    /// `&&` and `||`. The right operand is evaluated only where the left one
    /// does not already decide the result.
    fn eval_logical(
        &self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        env: &FactEnv,
        facts: &mut NodeFacts,
    ) -> Fact {
        let left = self.eval(lhs, env, facts);
        let split = split_env_by_condition(self, env, lhs);
        let right_env = if op == BinaryOp::And {
            &split.then_env
        } else {
            &split.else_env
        };
        let right = self.eval(rhs, right_env, facts);
        Fact::from_value(short_circuit(op, &left.value, &right.value, &self.config))
    }

    /// A binary operator other than `&&` and `||` on already evaluated operands.
    pub fn binary(
        &self,
        op: BinaryOp,
        (lhs, left): (&Expr, &Fact),
        (rhs, right): (&Expr, &Fact),
        result_ty: &ValueKind,
    ) -> Fact {
        if left.is_bottom() || right.is_bottom() {
            return Fact::bottom();
        }
        if matches!(op, BinaryOp::Eq | BinaryOp::Ne)
            && lhs.ty.is_reference()
            && rhs.ty.is_reference()
        {
            return Fact::from_value(ValueSet::all_booleans());
        }
        let Some(kind) = OperandKind::for_binary(op, &lhs.ty, &rhs.ty) else {
            return Fact::top(result_ty);
        };
        let integral = matches!(kind, OperandKind::Int | OperandKind::Long);
        if integral
            && matches!(op, BinaryOp::Div | BinaryOp::Rem)
            && right.range_for(&rhs.ty).contains(0)
        {
            emit_possible_division_by_zero(op.symbol());
        }

        let mut left_values = left.value.candidates(&lhs.ty);
        let mut right_values = right.value.candidates(&rhs.ty);
        if kind == OperandKind::String && self.config.assume_nullable_strings {
            add_null_form(lhs, &mut left_values);
            add_null_form(rhs, &mut right_values);
        }
        let value = self.concrete(
            Operator::Binary(op),
            kind,
            vec![left_values, right_values],
            result_ty,
        );

        let left_range = left.range_for(&lhs.ty);
        let right_range = right.range_for(&rhs.ty);
        if op.is_comparison() {
            return match value {
                Some(value) => Fact::from_value(value),
                None if lhs.ty.is_integral() && rhs.ty.is_integral() => Fact::from_value(
                    decide_by_range(op, left_range, right_range, &self.config),
                ),
                None => Fact::from_value(ValueSet::all_booleans()),
            };
        }
        if kind == OperandKind::String {
            return match value {
                Some(value) => Fact::from_value(value),
                None => Fact::from_value(self.concat_lengths((lhs, left), (rhs, right))),
            };
        }
        if integral {
            let range = self.binary_range(op, kind, left_range, right_range);
            return match value {
                Some(value @ ValueSet::IntVal(_)) => Fact::from_value(value),
                _ => Fact::from_range(range, &self.config),
            };
        }
        value.map_or_else(|| Fact::top(result_ty), Fact::from_value)
    }

    fn binary_range(&self, op: BinaryOp, kind: OperandKind, left: Range, right: Range) -> Range {
        let mode = self.config.overflow_mode();
        let width = if kind == OperandKind::Int {
            PrimitiveKind::Int
        } else {
            PrimitiveKind::Long
        };
        let max_shift = if width == PrimitiveKind::Int { 31 } else { 63 };
        if op.is_shift() && !right.is_within(0, max_shift) {
            emit_shift_out_of_range(op.symbol());
        }
        let raw = match op {
            BinaryOp::Add => left.plus_with(right, mode),
            BinaryOp::Sub => left.minus_with(right, mode),
            BinaryOp::Mul => left.times_with(right, mode),
            BinaryOp::Div => left.divide(right),
            BinaryOp::Rem => left.remainder(right),
            BinaryOp::Shl => left.shift_left_with(right, width, mode),
            BinaryOp::Shr => left.signed_shift_right(right),
            BinaryOp::UShr => left.unsigned_shift_right(right),
            BinaryOp::BitAnd => left.bitwise_and(right),
            BinaryOp::BitOr => left.bitwise_or(right),
            BinaryOp::BitXor => left.bitwise_xor(right),
            _ => Range::EVERYTHING,
        };
        if raw.is_everything()
            && matches!(op, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Shl)
            && !left.is_everything()
            && !right.is_everything()
        {
            emit_range_overflow(op.symbol());
        }
        match kind {
            OperandKind::Int => raw.narrow(PrimitiveKind::Int, mode),
            _ => raw,
        }
    }

    /// A unary operator on an already evaluated operand.
    pub fn unary(&self, op: UnaryOp, operand: &Expr, inner: &Fact, result_ty: &ValueKind) -> Fact {
        if inner.is_bottom() {
            return Fact::bottom();
        }
        let Some(kind) = OperandKind::for_unary(op, &operand.ty) else {
            return Fact::top(result_ty);
        };
        let value = self.concrete(
            Operator::Unary(op),
            kind,
            vec![inner.value.candidates(&operand.ty)],
            result_ty,
        );
        if matches!(kind, OperandKind::Int | OperandKind::Long) {
            let range = inner.range_for(&operand.ty);
            let raw = match op {
                UnaryOp::Minus => range.unary_minus(),
                UnaryOp::BitNot => range.bitwise_complement(),
                _ => range.unary_plus(),
            };
            let range = match kind {
                OperandKind::Int => raw.narrow(PrimitiveKind::Int, self.config.overflow_mode()),
                _ => raw,
            };
            return match value {
                Some(value @ ValueSet::IntVal(_)) => Fact::from_value(value),
                _ => Fact::from_range(range, &self.config),
            };
        }
        value.map_or_else(|| Fact::top(result_ty), Fact::from_value)
    }

    /// The value of a variable of kind `ty` after `++` or `--`.
    ///
    /// The step is computed in the promoted kind and cast back, so a `byte`
    /// at 127 steps to -128.
    pub fn stepped(&self, ty: &ValueKind, old: &Fact, op: IncDec) -> Fact {
        if old.is_bottom() {
            return Fact::bottom();
        }
        let Some(primitive) = ty.primitive().filter(|p| p.is_numeric()) else {
            return Fact::top(ty);
        };
        let promoted = ValueKind::Primitive(primitive.unary_promote());
        let step = if op.is_increment() {
            BinaryOp::Add
        } else {
            BinaryOp::Sub
        };
        let Some(kind) = OperandKind::for_binary(step, &promoted, &ValueKind::INT) else {
            return Fact::top(ty);
        };
        let value = self
            .concrete(
                Operator::Binary(step),
                kind,
                vec![old.value.candidates(ty), Some(vec![ConcreteValue::Int(1)])],
                &promoted,
            )
            .map(|value| value.cast_to(ty, &self.config));
        if primitive.is_integral() {
            let mode = self.config.overflow_mode();
            let range = old.range_for(ty);
            let one = Range::constant(1);
            let raw = if op.is_increment() {
                range.plus_with(one, mode)
            } else {
                range.minus_with(one, mode)
            };
            return match value {
                Some(value @ ValueSet::IntVal(_)) => Fact::from_value(value),
                _ => Fact::from_range(raw.narrow(primitive, mode), &self.config),
            };
        }
        value.map_or_else(|| Fact::top(ty), Fact::from_value)
    }

    /// An explicit or implicit conversion of `inner` to `target`.
    pub fn cast(&self, inner: &Expr, fact: &Fact, target: &ValueKind) -> Fact {
        if fact.is_bottom() {
            return Fact::bottom();
        }
        let value = fact.value.cast_to(target, &self.config);
        match target.primitive().filter(|p| p.is_integral()) {
            Some(width) if inner.ty.is_integral() => match value {
                ValueSet::IntVal(_) => Fact::from_value(value),
                _ => {
                    let range = fact
                        .range_for(&inner.ty)
                        .narrow(width, self.config.overflow_mode());
                    Fact::from_range(range, &self.config)
                }
            },
            Some(_) => match value {
                ValueSet::IntVal(_) => Fact::from_value(value),
                _ => Fact::top(target),
            },
            None => Fact::from_value(value),
        }
    }

    fn coerce(&self, expr: &Expr, fact: Fact, target: &ValueKind) -> Fact {
        if &expr.ty == target {
            fact
        } else {
            self.cast(expr, &fact, target)
        }
    }

    // ── calls and arrays ──

    fn call(
        &self,
        method: &MethodId,
        receiver: Option<(&Expr, Fact)>,
        args: &[(&Expr, Fact)],
        result_ty: &ValueKind,
    ) -> Fact {
        let receiver_bottom = receiver.as_ref().is_some_and(|(_, fact)| fact.is_bottom());
        if receiver_bottom || args.iter().any(|(_, fact)| fact.is_bottom()) {
            return Fact::bottom();
        }
        if !result_ty.is_covered() {
            return Fact::top(result_ty);
        }
        if let Some((_, fact)) = &receiver {
            let lengths_only = fact.value.is_length() || fact.value.is_unknown();
            if method.is_string_length() && args.is_empty() && lengths_only {
                return self.length_of(&fact.value);
            }
        }
        let receiver_values = match &receiver {
            Some((expr, fact)) => match fact.value.candidates(&expr.ty) {
                Some(values) => Some(values),
                None => return Fact::top(result_ty),
            },
            None => None,
        };
        let Some(arg_values) = args
            .iter()
            .map(|(expr, fact)| fact.value.candidates(&expr.ty))
            .collect::<Option<Vec<_>>>()
        else {
            return Fact::top(result_ty);
        };
        let result = self.evaluator.try_eval(
            &OpId::Method(method.clone()),
            receiver_values.as_deref(),
            &arg_values,
            self.config.max_argument_combinations,
        );
        match result {
            Ok(values) if !values.is_empty() => {
                let value = ValueSet::from_concrete(&values, result_ty, &self.config);
                if value.is_unknown() {
                    Fact::top(result_ty)
                } else {
                    Fact::from_value(value)
                }
            }
            _ => Fact::top(result_ty),
        }
    }

    fn new_array(&self, length: &Fact) -> Fact {
        match &length.value {
            ValueSet::Bottom => Fact::bottom(),
            ValueSet::IntVal(values) => {
                // Negative lengths throw, so they produce no array.
                let lengths: Vec<usize> = values
                    .iter()
                    .filter_map(|&v| usize::try_from(v).ok())
                    .collect();
                Fact::from_value(ValueSet::array_lengths(lengths, &self.config))
            }
            _ => {
                let range = length.range_for(&ValueKind::INT);
                Fact::from_value(ValueSet::array_length_range(range, &self.config))
            }
        }
    }

    /// The `int` fact of the length of an array or string.
    fn length_of(&self, value: &ValueSet) -> Fact {
        match value.lengths() {
            Some(lengths) => Fact::from_value(ValueSet::int_values(
                lengths.into_iter().map(|n| n as i64),
                &self.config,
            )),
            None => {
                let range = value.length_range().unwrap_or(Range::LENGTH_EVERYTHING);
                Fact::from_range(range, &self.config)
            }
        }
    }

    /// Lengths of a string concatenation whose values cannot be enumerated.
    fn concat_lengths(
        &self,
        (lhs, left): (&Expr, &Fact),
        (rhs, right): (&Expr, &Fact),
    ) -> ValueSet {
        match (self.rendered_lengths(lhs, left), self.rendered_lengths(rhs, right)) {
            (RenderedLengths::Exact(a), RenderedLengths::Exact(b)) => {
                let sums = a
                    .iter()
                    .flat_map(|x| b.iter().map(move |y| x + y))
                    .filter(|&n| n <= i32::MAX as usize);
                ValueSet::array_lengths(sums, &self.config)
            }
            (a, b) => ValueSet::array_length_range(a.range().plus(b.range()), &self.config),
        }
    }

    /// Lengths of the string form of an operand of `+` on strings.
    fn rendered_lengths(&self, operand: &Expr, fact: &Fact) -> RenderedLengths {
        if operand.ty.is_string() {
            let nullable = self.config.assume_nullable_strings
                && !matches!(operand.kind, ExprKind::Literal(_));
            return match fact.value.lengths() {
                Some(mut lengths) => {
                    if nullable {
                        lengths.insert(NULL_LENGTH);
                    }
                    RenderedLengths::Exact(lengths)
                }
                None => {
                    let range = fact.value.length_range().unwrap_or(Range::LENGTH_EVERYTHING);
                    if nullable {
                        RenderedLengths::Within(range.union(Range::constant(NULL_LENGTH as i64)))
                    } else {
                        RenderedLengths::Within(range)
                    }
                }
            };
        }
        match operand.ty.primitive() {
            Some(PrimitiveKind::Char) => RenderedLengths::Exact(BTreeSet::from([1])),
            Some(PrimitiveKind::Boolean) => RenderedLengths::Exact(BTreeSet::from([4, 5])),
            Some(p) if p.is_integral() => match fact.value.as_ints() {
                Some(values) => {
                    RenderedLengths::Exact(values.iter().map(|v| v.to_string().len()).collect())
                }
                None => RenderedLengths::Within(decimal_lengths(fact.range_for(&operand.ty))),
            },
            _ => RenderedLengths::Within(Range::LENGTH_EVERYTHING),
        }
    }

    /// Cartesian evaluation of an operator. `None` when some operand is not
    /// enumerable, the evaluation failed, or every combination threw.
    fn concrete(
        &self,
        op: Operator,
        kind: OperandKind,
        operands: Vec<Option<Vec<ConcreteValue>>>,
        result_ty: &ValueKind,
    ) -> Option<ValueSet> {
        let operands: Vec<Vec<ConcreteValue>> = operands.into_iter().collect::<Option<_>>()?;
        let values = self
            .operators
            .try_eval(
                &OpId::Operator { op, kind },
                None,
                &operands,
                self.config.max_argument_combinations,
            )
            .ok()?;
        if values.is_empty() {
            return None;
        }
        Some(ValueSet::from_concrete(&values, result_ty, &self.config))
    }
}

/// Length of `"null"`.
const NULL_LENGTH: usize = 4;

/// Lengths of the string form of a concatenation operand.
enum RenderedLengths {
    Exact(BTreeSet<usize>),
    Within(Range),
}

impl RenderedLengths {
    fn range(&self) -> Range {
        match self {
            RenderedLengths::Exact(lengths) => {
                Range::from_values(lengths.iter().map(|&n| n as i64))
            }
            RenderedLengths::Within(range) => *range,
        }
    }
}

/// Lengths of the decimal forms of the integers in `range`.
///
/// The longest form is at one of the bounds; the shortest is `"0"` when the
/// range holds zero and otherwise at the bound nearest zero.
fn decimal_lengths(range: Range) -> Range {
    let at_from = range.from().to_string().len() as i64;
    let at_to = range.to().to_string().len() as i64;
    let shortest = if range.contains(0) {
        1
    } else {
        at_from.min(at_to)
    };
    Range::from_values([shortest, at_from.max(at_to)])
}

/// Adds the `"null"` rendering of a non-literal string operand.
fn add_null_form(operand: &Expr, values: &mut Option<Vec<ConcreteValue>>) {
    if !operand.ty.is_string() || matches!(operand.kind, ExprKind::Literal(_)) {
        return;
    }
    if let Some(values) = values {
        let null = ConcreteValue::Str("null".to_string());
        if !values.contains(&null) {
            values.push(null);
        }
    }
}

/// Result of `left && right` or `left || right` from the operands' facts.
///
/// The absorbing value (`false` for `&&`, `true` for `||`) is produced as soon
/// as the left operand may take it, whatever the right operand is.
fn short_circuit(
    op: BinaryOp,
    left: &ValueSet,
    right: &ValueSet,
    config: &AnalysisConfig,
) -> ValueSet {
    if left.is_bottom() {
        return ValueSet::Bottom;
    }
    let absorbing = op == BinaryOp::Or;
    let mut results = Vec::with_capacity(2);
    if left.may_be(absorbing) {
        results.push(absorbing);
    }
    if left.may_be(!absorbing) {
        match right {
            ValueSet::BoolVal(values) => results.extend(values.iter().copied()),
            ValueSet::Bottom => {}
            _ => results.extend([true, false]),
        }
    }
    ValueSet::bool_values(results, config)
}

/// Outcome of an integral comparison from the operand ranges alone.
fn decide_by_range(op: BinaryOp, left: Range, right: Range, config: &AnalysisConfig) -> ValueSet {
    let equal_constants = left.is_constant() && left == right;
    let overlap = !left.intersect(right).is_nothing();
    let (can_be_true, can_be_false) = match op {
        BinaryOp::Lt => (
            !left.refine_less_than(right).is_nothing(),
            !left.refine_greater_than_eq(right).is_nothing(),
        ),
        BinaryOp::Le => (
            !left.refine_less_than_eq(right).is_nothing(),
            !left.refine_greater_than(right).is_nothing(),
        ),
        BinaryOp::Gt => (
            !left.refine_greater_than(right).is_nothing(),
            !left.refine_less_than_eq(right).is_nothing(),
        ),
        BinaryOp::Ge => (
            !left.refine_greater_than_eq(right).is_nothing(),
            !left.refine_less_than(right).is_nothing(),
        ),
        BinaryOp::Eq => (overlap, !equal_constants),
        BinaryOp::Ne => (!equal_constants, overlap),
        _ => (true, true),
    };
    let outcomes = [(can_be_true, true), (can_be_false, false)];
    ValueSet::bool_values(
        outcomes.into_iter().filter(|(possible, _)| *possible).map(|(_, b)| b),
        config,
    )
}
