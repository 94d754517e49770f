//! Forward analysis engine.
//!
//! Walks a [`Block`] statement by statement, threading a [`FactEnv`] through
//! it and recording the fact of every evaluated expression node. Branches are
//! analyzed in the environments produced by [`split_env_by_condition`] and
//! merged afterwards. Loops iterate to a fixed point: after
//! `widening_threshold` iterations the loop-head environment is widened, and
//! after `max_iterations` the variables still changing are dropped to
//! `Unknown`.

use super::conditional::split_env_by_condition;
use super::env::FactEnv;
use super::transfer::{NodeFacts, ValueTransfer};
use crate::config::AnalysisConfig;
use crate::diagnostics::emit_fixed_point_divergence;
use crate::evaluator::Evaluator;
use crate::ir::{Block, Expr, ExprKind, IncDec, Stmt};
use crate::kind::ValueKind;
use crate::lattice::Fact;
use std::collections::BTreeMap;

/// Outcome of analyzing one block.
#[derive(Debug)]
pub struct AnalysisResult {
    /// Variable facts at the end of the block.
    pub env: FactEnv,
    /// Fact of every evaluated expression node.
    pub facts: NodeFacts,
    /// False if some loop hit the iteration limit.
    pub converged: bool,
}

/// Forward value analysis over the statement IR.
#[derive(Debug)]
pub struct ForwardAnalysis {
    transfer: ValueTransfer,
}

struct State {
    facts: NodeFacts,
    converged: bool,
    /// Declared kinds of the locals seen so far.
    kinds: BTreeMap<String, ValueKind>,
}

/// An increment found in an expression, and whether it only runs on some paths.
struct Step<'a> {
    var: &'a str,
    op: IncDec,
    ty: &'a ValueKind,
    conditional: bool,
}

impl ForwardAnalysis {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            transfer: ValueTransfer::new(config),
        }
    }

    pub fn with_transfer(transfer: ValueTransfer) -> Self {
        Self { transfer }
    }

    /// Analysis whose method calls go through `evaluator`.
    pub fn with_evaluator(config: AnalysisConfig, evaluator: Box<dyn Evaluator>) -> Self {
        Self::with_transfer(ValueTransfer::new(config).with_evaluator(evaluator))
    }

    pub fn transfer(&self) -> &ValueTransfer {
        &self.transfer
    }

    /// Analyze `block` from an empty environment.
    pub fn analyze(&self, block: &Block) -> AnalysisResult {
        self.analyze_in(block, FactEnv::new())
    }

    /// Analyze `block` starting from `env`.
    pub fn analyze_in(&self, block: &Block, mut env: FactEnv) -> AnalysisResult {
        let mut state = State {
            facts: NodeFacts::new(),
            converged: true,
            kinds: BTreeMap::new(),
        };
        self.analyze_block(block, &mut env, &mut state);
        AnalysisResult {
            env,
            facts: state.facts,
            converged: state.converged,
        }
    }

    fn config(&self) -> &AnalysisConfig {
        self.transfer.config()
    }

    fn analyze_block(&self, block: &Block, env: &mut FactEnv, state: &mut State) {
        for stmt in &block.stmts {
            self.analyze_stmt(stmt, env, state);
        }
    }

    fn analyze_stmt(&self, stmt: &Stmt, env: &mut FactEnv, state: &mut State) {
        match stmt {
            Stmt::Let { var, ty, init } => {
                let fact = match init {
                    Some(value) => {
                        let fact = self.eval(value, env, state);
                        self.stored(value, fact, ty)
                    }
                    None => Fact::top(ty),
                };
                state.kinds.insert(var.clone(), ty.clone());
                env.set(var, fact);
            }

            Stmt::Declare { var, ty, fact } => {
                state.kinds.insert(var.clone(), ty.clone());
                env.set(var, fact.clone());
            }

            Stmt::Assign { var, value } => {
                let fact = self.eval(value, env, state);
                let fact = match state.kinds.get(var) {
                    Some(ty) => self.stored(value, fact, ty),
                    None => fact,
                };
                env.set(var, fact);
            }

            Stmt::Expr(expr) => {
                self.eval(expr, env, state);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.transfer.eval(condition, env, &mut state.facts);
                let split = split_env_by_condition(&self.transfer, env, condition);

                let mut then_env = split.then_env;
                self.apply_increments(condition, &mut then_env);
                self.analyze_block(then_branch, &mut then_env, state);

                let mut else_env = split.else_env;
                self.apply_increments(condition, &mut else_env);
                if let Some(else_branch) = else_branch {
                    self.analyze_block(else_branch, &mut else_env, state);
                }

                *env = then_env;
                env.merge(&else_env, self.config());
            }

            Stmt::While { condition, body } => self.analyze_loop(condition, body, env, state),

            Stmt::Block(block) => self.analyze_block(block, env, state),
        }
    }

    /// The fact of `value` once stored in a variable of kind `ty`.
    fn stored(&self, value: &Expr, fact: Fact, ty: &ValueKind) -> Fact {
        if &value.ty == ty {
            fact
        } else {
            self.transfer.cast(value, &fact, ty)
        }
    }

    /// Evaluates `expr` and applies the increments it contains to `env`.
    fn eval(&self, expr: &Expr, env: &mut FactEnv, state: &mut State) -> Fact {
        let fact = self.transfer.eval(expr, env, &mut state.facts);
        self.apply_increments(expr, env);
        fact
    }

    fn analyze_loop(&self, condition: &Expr, body: &Block, env: &mut FactEnv, state: &mut State) {
        let config = self.config();
        let entry = env.clone();
        let mut body_env = env.clone();
        let mut iterations = 0;
        let mut diverged = false;

        loop {
            iterations += 1;
            self.loop_pass(condition, body, env, &mut body_env, state);

            let previous = env.clone();
            if !env.merge_changed(&body_env, config) {
                break;
            }
            if iterations >= config.widening_threshold() {
                env.widen_from(&previous, config);
            }
            if iterations >= config.max_iterations {
                emit_fixed_point_divergence(iterations, "while loop");
                for name in env.changed_names(&previous) {
                    env.set(&name, Fact::unknown());
                }
                diverged = true;
                state.converged = false;
                // Re-record the body's node facts against the widened head.
                self.loop_pass(condition, body, env, &mut body_env, state);
                env.merge(&body_env, config);
                break;
            }
        }

        // One descending step recovers bounds lost to widening.
        if !diverged {
            let mut narrowed = entry;
            narrowed.merge(&body_env, config);
            if narrowed.is_subsumed_by(env) {
                *env = narrowed;
            }
        }

        let split = split_env_by_condition(&self.transfer, env, condition);
        let mut exit_env = split.else_env;
        self.apply_increments(condition, &mut exit_env);
        *env = exit_env;
    }

    /// One pass over the loop body from the loop-head environment `head`.
    fn loop_pass(
        &self,
        condition: &Expr,
        body: &Block,
        head: &FactEnv,
        body_env: &mut FactEnv,
        state: &mut State,
    ) {
        self.transfer.eval(condition, head, &mut state.facts);
        let split = split_env_by_condition(&self.transfer, head, condition);
        body_env.clone_from(&split.then_env);
        self.apply_increments(condition, body_env);
        self.analyze_block(body, body_env, state);
    }

    /// Applies the side effects of `++` and `--` in `expr` to `env`.
    ///
    /// An increment that only runs on some paths (a branch of `?:`, the right
    /// operand of `&&` or `||`) joins the stepped value with the old one.
    fn apply_increments(&self, expr: &Expr, env: &mut FactEnv) {
        let mut steps = Vec::new();
        collect_steps(expr, false, &mut steps);
        for step in steps {
            let old = env
                .get(step.var)
                .cloned()
                .unwrap_or_else(|| Fact::top(step.ty));
            let stepped = self.transfer.stepped(step.ty, &old, step.op);
            let new = if step.conditional {
                old.join(&stepped, self.config())
            } else {
                stepped
            };
            env.set(step.var, new);
        }
    }
}

fn collect_steps<'a>(expr: &'a Expr, conditional: bool, out: &mut Vec<Step<'a>>) {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Var(_) => {}
        ExprKind::Increment { var, op } => out.push(Step {
            var,
            op: *op,
            ty: &expr.ty,
            conditional,
        }),
        ExprKind::Binary { op, lhs, rhs } => {
            collect_steps(lhs, conditional, out);
            collect_steps(rhs, conditional || op.is_logical(), out);
        }
        ExprKind::Unary { operand, .. } => collect_steps(operand, conditional, out),
        ExprKind::Cast(inner) | ExprKind::NewArray(inner) | ExprKind::ArrayLength(inner) => {
            collect_steps(inner, conditional, out)
        }
        ExprKind::Conditional {
            cond,
            then,
            otherwise,
        } => {
            collect_steps(cond, conditional, out);
            collect_steps(then, true, out);
            collect_steps(otherwise, true, out);
        }
        ExprKind::Call { receiver, args, .. } => {
            if let Some(receiver) = receiver {
                collect_steps(receiver, conditional, out);
            }
            for arg in args {
                collect_steps(arg, conditional, out);
            }
        }
    }
}
