//! Branch refinement of conditions.
//!
//! A condition splits the environment into the facts that hold when it is
//! true and those that hold when it is false:
//!
//! ```text
//! // x ∈ [0..10], y ∈ [20..30]
//! if (x < y) {        // then: x ∈ [0..10]
//! } else {            // else: unreachable
//! }
//! ```
//!
//! Integral comparisons against a variable refine that variable's range (and
//! its value set, for `==` and `!=`), on both sides of the comparison. `!`,
//! `&&` and `||` compose the splits of their operands, and a boolean variable
//! is refined to `true` or `false`. A comparison on `a.length` or
//! `s.length()` refines the lengths of `a` or `s`. A branch whose condition
//! can never hold is marked unreachable. Reference equality is never refined.

use super::env::FactEnv;
use super::transfer::{NodeFacts, ValueTransfer};
use crate::config::AnalysisConfig;
use crate::ir::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::lattice::{Fact, Range, ValueSet};
use std::collections::BTreeSet;

/// Result of splitting an environment by a condition.
#[derive(Debug)]
pub struct SplitEnv {
    /// Environment for the then-branch (condition is true)
    pub then_env: FactEnv,
    /// Environment for the else-branch (condition is false)
    pub else_env: FactEnv,
}

impl SplitEnv {
    fn unrefined(env: &FactEnv) -> Self {
        Self {
            then_env: env.clone(),
            else_env: env.clone(),
        }
    }
}

/// Splits `env` by `condition`.
pub fn split_env_by_condition(
    transfer: &ValueTransfer,
    env: &FactEnv,
    condition: &Expr,
) -> SplitEnv {
    if env.is_unreachable() {
        return SplitEnv::unrefined(env);
    }
    let config = transfer.config();
    let mut split = match &condition.kind {
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand,
        } => {
            let inner = split_env_by_condition(transfer, env, operand);
            SplitEnv {
                then_env: inner.else_env,
                else_env: inner.then_env,
            }
        }

        // Both operands hold in the then-branch; either may fail in the else-branch.
        ExprKind::Binary {
            op: BinaryOp::And,
            lhs,
            rhs,
        } => {
            let left = split_env_by_condition(transfer, env, lhs);
            let right = split_env_by_condition(transfer, &left.then_env, rhs);
            let mut else_env = left.else_env;
            else_env.merge(&right.else_env, config);
            SplitEnv {
                then_env: right.then_env,
                else_env,
            }
        }

        ExprKind::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
        } => {
            let left = split_env_by_condition(transfer, env, lhs);
            let right = split_env_by_condition(transfer, &left.else_env, rhs);
            let mut then_env = left.then_env;
            then_env.merge(&right.then_env, config);
            SplitEnv {
                then_env,
                else_env: right.else_env,
            }
        }

        ExprKind::Binary { op, lhs, rhs } if op.is_comparison() => {
            split_comparison(transfer, env, *op, lhs, rhs)
        }

        ExprKind::Var(name) if condition.ty.is_boolean() => SplitEnv {
            then_env: refine_boolean(env, name, true, config),
            else_env: refine_boolean(env, name, false, config),
        },

        _ => SplitEnv::unrefined(env),
    };

    let decided = transfer.eval(condition, env, &mut NodeFacts::new());
    if !decided.value.may_be(true) {
        split.then_env.mark_unreachable();
    }
    if !decided.value.may_be(false) {
        split.else_env.mark_unreachable();
    }
    split
}

fn split_comparison(
    transfer: &ValueTransfer,
    env: &FactEnv,
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
) -> SplitEnv {
    let config = transfer.config();
    let mut scratch = NodeFacts::new();
    let left = transfer.eval(lhs, env, &mut scratch);
    let right = transfer.eval(rhs, env, &mut scratch);

    let mut split = SplitEnv::unrefined(env);
    refine_operand(&mut split.then_env, lhs, op, rhs, &right, config);
    refine_operand(&mut split.then_env, rhs, op.flipped(), lhs, &left, config);
    if let Some(negated) = op.negated() {
        refine_operand(&mut split.else_env, lhs, negated, rhs, &right, config);
        refine_operand(&mut split.else_env, rhs, negated.flipped(), lhs, &left, config);
    }
    split
}

/// Refines `target` (when it is a variable) so that `target op other` holds.
fn refine_operand(
    env: &mut FactEnv,
    target: &Expr,
    op: BinaryOp,
    other: &Expr,
    other_fact: &Fact,
    config: &AnalysisConfig,
) {
    if let Some((receiver, name)) = length_receiver(target) {
        refine_length(env, receiver, name, op, other, other_fact, config);
        return;
    }
    let Some(name) = target.as_var() else {
        return;
    };
    if env.is_unreachable() || (target.ty.is_reference() && other.ty.is_reference()) {
        return;
    }
    let current = env
        .get(name)
        .cloned()
        .unwrap_or_else(|| Fact::top(&target.ty));

    let refined = if target.ty.is_integral() && other.ty.is_integral() {
        let own = current.range_for(&target.ty);
        let Some(range) = refine_by(own, op, other_fact.range_for(&other.ty)) else {
            return;
        };
        let fact = current.refine_range(range, config);
        match op {
            BinaryOp::Eq if !fact.is_bottom() => fact
                .refine_value(&other_fact.value)
                .refine_range(range, config),
            BinaryOp::Ne => exclude_constant(fact, &other_fact.value, config),
            _ => fact,
        }
    } else if target.ty.is_boolean() && other.ty.is_boolean() {
        match (op, single_bool(&other_fact.value)) {
            (BinaryOp::Eq, _) => current.refine_value(&other_fact.value),
            (BinaryOp::Ne, Some(b)) => {
                current.refine_value(&ValueSet::BoolVal(BTreeSet::from([!b])))
            }
            _ => return,
        }
    } else {
        return;
    };

    if refined.is_bottom() {
        env.mark_unreachable();
    } else {
        env.set(name, refined);
    }
}

/// The values of `own` for which `own op bound` can hold.
fn refine_by(own: Range, op: BinaryOp, bound: Range) -> Option<Range> {
    let range = match op {
        BinaryOp::Lt => own.refine_less_than(bound),
        BinaryOp::Le => own.refine_less_than_eq(bound),
        BinaryOp::Gt => own.refine_greater_than(bound),
        BinaryOp::Ge => own.refine_greater_than_eq(bound),
        BinaryOp::Eq => own.refine_equal_to(bound),
        BinaryOp::Ne => own.refine_not_equal_to(bound),
        _ => return None,
    };
    Some(range)
}

/// The array or string variable whose length `expr` reads.
fn length_receiver(expr: &Expr) -> Option<(&Expr, &str)> {
    let receiver: &Expr = match &expr.kind {
        ExprKind::ArrayLength(array) => array,
        ExprKind::Call {
            method,
            receiver: Some(receiver),
            args,
        } if method.is_string_length() && args.is_empty() => receiver,
        _ => return None,
    };
    receiver.as_var().map(|name| (receiver, name))
}

/// Refines the variable `name` read by a length access so that
/// `length op other` holds.
fn refine_length(
    env: &mut FactEnv,
    receiver: &Expr,
    name: &str,
    op: BinaryOp,
    other: &Expr,
    other_fact: &Fact,
    config: &AnalysisConfig,
) {
    if env.is_unreachable() || !other.ty.is_integral() {
        return;
    }
    let current = env
        .get(name)
        .cloned()
        .unwrap_or_else(|| Fact::top(&receiver.ty));
    let own = current
        .value
        .length_range()
        .unwrap_or(Range::LENGTH_EVERYTHING);
    let Some(lengths) = refine_by(own, op, other_fact.range_for(&other.ty)) else {
        return;
    };
    let refined = current.refine_value(&ValueSet::array_length_range(lengths, config));
    if refined.is_bottom() {
        env.mark_unreachable();
    } else {
        env.set(name, refined);
    }
}

/// Drops the single value of `excluded` from an enumerated fact.
fn exclude_constant(fact: Fact, excluded: &ValueSet, config: &AnalysisConfig) -> Fact {
    let constant = excluded
        .as_ints()
        .filter(|values| values.len() == 1)
        .and_then(|values| values.iter().next().copied());
    match (&fact.value, constant) {
        (ValueSet::IntVal(values), Some(c)) => Fact::from_value(ValueSet::int_values(
            values.iter().copied().filter(|&v| v != c),
            config,
        )),
        _ => fact,
    }
}

fn single_bool(value: &ValueSet) -> Option<bool> {
    value
        .as_bools()
        .filter(|values| values.len() == 1)
        .and_then(|values| values.iter().next().copied())
}

fn refine_boolean(env: &FactEnv, name: &str, value: bool, config: &AnalysisConfig) -> FactEnv {
    let mut refined_env = env.clone();
    let current = env
        .get(name)
        .cloned()
        .unwrap_or_else(|| Fact::from_value(ValueSet::all_booleans()));
    let refined = current.refine_value(&ValueSet::bool_values([value], config));
    if refined.is_bottom() {
        refined_env.mark_unreachable();
    } else {
        refined_env.set(name, refined);
    }
    refined_env
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ExprBuilder;
    use crate::ir::MethodId;
    use crate::kind::ValueKind;

    fn cfg() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    fn ints(values: &[i64]) -> Fact {
        Fact::from_value(ValueSet::int_values(values.iter().copied(), &cfg()))
    }

    fn range(from: i64, to: i64) -> Fact {
        Fact::from_range(Range::new(from, to).unwrap(), &cfg())
    }

    fn split(env: &FactEnv, condition: &Expr) -> SplitEnv {
        split_env_by_condition(&ValueTransfer::new(cfg()), env, condition)
    }

    fn range_of(env: &FactEnv, name: &str) -> Option<Range> {
        env.get(name).and_then(|fact| fact.range)
    }

    // ── comparisons ──

    #[test]
    fn test_less_than_refines_both_branches() {
        let mut b = ExprBuilder::new();
        let mut env = FactEnv::new();
        env.set("x", range(0, 100));
        let x = b.var("x", ValueKind::INT);
        let limit = b.int(50);
        let cond = b.binary(BinaryOp::Lt, x, limit);

        let result = split(&env, &cond);
        assert_eq!(range_of(&result.then_env, "x"), Some(Range::new(0, 49).unwrap()));
        assert_eq!(range_of(&result.else_env, "x"), Some(Range::new(50, 100).unwrap()));
    }

    #[test]
    fn test_variable_on_right_is_refined() {
        let mut b = ExprBuilder::new();
        let mut env = FactEnv::new();
        env.set("x", range(0, 100));
        let limit = b.int(90);
        let x = b.var("x", ValueKind::INT);
        let cond = b.binary(BinaryOp::Lt, limit, x);

        let result = split(&env, &cond);
        assert_eq!(
            result.then_env.get("x"),
            Some(&ints(&[91, 92, 93, 94, 95, 96, 97, 98, 99, 100]))
        );
    }

    #[test]
    fn test_always_true_comparison_kills_else() {
        let mut b = ExprBuilder::new();
        let mut env = FactEnv::new();
        env.set("x", range(0, 10));
        env.set("y", range(20, 30));
        let x = b.var("x", ValueKind::INT);
        let y = b.var("y", ValueKind::INT);
        let cond = b.binary(BinaryOp::Lt, x, y);

        let result = split(&env, &cond);
        assert_eq!(range_of(&result.then_env, "x"), Some(Range::new(0, 10).unwrap()));
        assert!(result.else_env.is_unreachable());
    }

    #[test]
    fn test_equality_intersects_values() {
        let mut b = ExprBuilder::new();
        let mut env = FactEnv::new();
        env.set("x", ints(&[1, 2, 3]));
        env.set("y", ints(&[2, 5]));
        let x = b.var("x", ValueKind::INT);
        let y = b.var("y", ValueKind::INT);
        let cond = b.binary(BinaryOp::Eq, x, y);

        let result = split(&env, &cond);
        assert_eq!(result.then_env.get("x"), Some(&ints(&[2])));
        assert_eq!(result.then_env.get("y"), Some(&ints(&[2])));
    }

    #[test]
    fn test_not_equal_constant_removed_in_then() {
        let mut b = ExprBuilder::new();
        let mut env = FactEnv::new();
        env.set("x", ints(&[0, 4, 7]));
        let x = b.var("x", ValueKind::INT);
        let zero = b.int(0);
        let cond = b.binary(BinaryOp::Ne, x, zero);

        let result = split(&env, &cond);
        assert_eq!(result.then_env.get("x"), Some(&ints(&[4, 7])));
        assert_eq!(result.else_env.get("x"), Some(&ints(&[0])));
    }

    #[test]
    fn test_reference_equality_not_refined() {
        let mut b = ExprBuilder::new();
        let mut env = FactEnv::new();
        let s = Fact::from_value(ValueSet::string_values(["a", "b"], &cfg()));
        env.set("s", s.clone());
        let var = b.var("s", ValueKind::String);
        let lit = b.string("a");
        let cond = b.binary(BinaryOp::Eq, var, lit);

        let result = split(&env, &cond);
        assert_eq!(result.then_env.get("s"), Some(&s));
        assert_eq!(result.else_env.get("s"), Some(&s));
    }

    // ── length accesses ──

    fn length_call(b: &mut ExprBuilder, name: &str) -> Expr {
        let receiver = b.var(name, ValueKind::String);
        b.call(
            MethodId::instance("String", "length"),
            Some(receiver),
            vec![],
            ValueKind::INT,
        )
    }

    #[test]
    fn test_array_length_comparison_refines_array() {
        let mut b = ExprBuilder::new();
        let mut env = FactEnv::new();
        let lengths = Range::new(0, 100).unwrap();
        env.set("a", Fact::from_value(ValueSet::ArrayLenRange(lengths)));
        let a = b.var("a", ValueKind::Array);
        let length = b.array_length(a);
        let limit = b.int(50);
        let cond = b.binary(BinaryOp::Lt, length, limit);

        let result = split(&env, &cond);
        let short = ValueSet::ArrayLenRange(Range::new(0, 49).unwrap());
        let long = ValueSet::ArrayLenRange(Range::new(50, 100).unwrap());
        assert_eq!(result.then_env.get("a").map(|f| f.value.clone()), Some(short));
        assert_eq!(result.else_env.get("a").map(|f| f.value.clone()), Some(long));
    }

    #[test]
    fn test_string_length_check_filters_strings() {
        let mut b = ExprBuilder::new();
        let mut env = FactEnv::new();
        env.set("s", Fact::from_value(ValueSet::string_values(["", "ab", "abcd"], &cfg())));
        let length = length_call(&mut b, "s");
        let zero = b.int(0);
        let cond = b.binary(BinaryOp::Eq, length, zero);

        let result = split(&env, &cond);
        assert_eq!(
            result.then_env.get("s").map(|f| f.value.clone()),
            Some(ValueSet::string_values([""], &cfg()))
        );
        assert_eq!(
            result.else_env.get("s").map(|f| f.value.clone()),
            Some(ValueSet::string_values(["ab", "abcd"], &cfg()))
        );
    }

    #[test]
    fn test_length_check_on_unknown_string() {
        let mut b = ExprBuilder::new();
        let length = length_call(&mut b, "s");
        let three = b.int(3);
        let cond = b.binary(BinaryOp::Gt, length, three);

        let result = split(&FactEnv::new(), &cond);
        let long = ValueSet::ArrayLenRange(Range::new(4, i32::MAX as i64).unwrap());
        let short = ValueSet::ArrayLen(BTreeSet::from([0, 1, 2, 3]));
        assert_eq!(result.then_env.get("s").map(|f| f.value.clone()), Some(long));
        assert_eq!(result.else_env.get("s").map(|f| f.value.clone()), Some(short));
    }

    #[test]
    fn test_impossible_length_kills_branch() {
        let mut b = ExprBuilder::new();
        let a = b.var("a", ValueKind::Array);
        let length = b.array_length(a);
        let zero = b.int(0);
        let cond = b.binary(BinaryOp::Lt, length, zero);

        let result = split(&FactEnv::new(), &cond);
        assert!(result.then_env.is_unreachable());
        assert!(!result.else_env.is_unreachable());
    }

    // ── boolean structure ──

    #[test]
    fn test_not_swaps_branches() {
        let mut b = ExprBuilder::new();
        let mut env = FactEnv::new();
        env.set("x", range(0, 100));
        let x = b.var("x", ValueKind::INT);
        let limit = b.int(50);
        let lt = b.binary(BinaryOp::Lt, x, limit);
        let cond = b.unary(UnaryOp::Not, lt);

        let result = split(&env, &cond);
        assert_eq!(range_of(&result.then_env, "x"), Some(Range::new(50, 100).unwrap()));
        assert_eq!(range_of(&result.else_env, "x"), Some(Range::new(0, 49).unwrap()));
    }

    #[test]
    fn test_and_refines_sequentially() {
        let mut b = ExprBuilder::new();
        let mut env = FactEnv::new();
        env.set("x", range(-100, 100));
        let x1 = b.var("x", ValueKind::INT);
        let zero = b.int(0);
        let lower = b.binary(BinaryOp::Ge, x1, zero);
        let x2 = b.var("x", ValueKind::INT);
        let ten = b.int(10);
        let upper = b.binary(BinaryOp::Lt, x2, ten);
        let cond = b.binary(BinaryOp::And, lower, upper);

        let result = split(&env, &cond);
        assert_eq!(result.then_env.get("x"), Some(&ints(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9])));
        assert_eq!(range_of(&result.else_env, "x"), Some(Range::new(-100, 100).unwrap()));
    }

    #[test]
    fn test_boolean_variable() {
        let mut b = ExprBuilder::new();
        let flag = b.var("flag", ValueKind::BOOLEAN);
        let result = split(&FactEnv::new(), &flag);
        assert_eq!(
            result.then_env.get("flag").map(|f| f.value.clone()),
            Some(ValueSet::bool_values([true], &cfg()))
        );
        assert_eq!(
            result.else_env.get("flag").map(|f| f.value.clone()),
            Some(ValueSet::bool_values([false], &cfg()))
        );
    }

    #[test]
    fn test_literal_condition() {
        let mut b = ExprBuilder::new();
        let never = b.boolean(false);
        let result = split(&FactEnv::new(), &never);
        assert!(result.then_env.is_unreachable());
        assert!(!result.else_env.is_unreachable());
    }
}
