//! End-to-end value analysis over small programs.

use pretty_assertions::assert_eq;
use value_lattice::diagnostics::{DiagnosticReason, DiagnosticsCollector};
use value_lattice::ir::{BinaryOp, Block, Expr, ExprBuilder, IncDec, MethodId, Stmt};
use value_lattice::{AnalysisConfig, Fact, ForwardAnalysis, Range, ValueKind, ValueSet};

fn cfg() -> AnalysisConfig {
    AnalysisConfig::default()
}

fn ints(values: &[i64]) -> Fact {
    Fact::from_value(ValueSet::int_values(values.iter().copied(), &cfg()))
}

fn let_var(var: &str, ty: ValueKind, init: Expr) -> Stmt {
    Stmt::Let {
        var: var.to_string(),
        ty,
        init: Some(init),
    }
}

fn declare(var: &str, ty: ValueKind, fact: Fact) -> Stmt {
    Stmt::Declare {
        var: var.to_string(),
        ty,
        fact,
    }
}

fn assign(var: &str, value: Expr) -> Stmt {
    Stmt::Assign {
        var: var.to_string(),
        value,
    }
}

fn analyze(block: &Block) -> value_lattice::AnalysisResult {
    ForwardAnalysis::new(cfg()).analyze(block)
}

// ============================================================================
// Branch Merging
// ============================================================================

#[test]
fn test_join_after_optional_assignment() {
    // int a = 1; if (cond) a = 2; int b = a + 2;
    let mut b = ExprBuilder::new();
    let one = b.int(1);
    let cond = b.var("cond", ValueKind::BOOLEAN);
    let two = b.int(2);
    let a = b.var("a", ValueKind::INT);
    let also_two = b.int(2);
    let sum = b.binary(BinaryOp::Add, a, also_two);
    let sum_id = sum.id;

    let block = Block::new(vec![
        let_var("a", ValueKind::INT, one),
        Stmt::If {
            condition: cond,
            then_branch: Block::new(vec![assign("a", two)]),
            else_branch: None,
        },
        let_var("b", ValueKind::INT, sum),
    ]);
    let result = analyze(&block);

    assert_eq!(result.env.get("b"), Some(&ints(&[3, 4])));
    assert_eq!(result.facts.get(sum_id), Some(&ints(&[3, 4])));
}

#[test]
fn test_string_values_flow_through_branches() {
    let mut b = ExprBuilder::new();
    let flag = b.var("flag", ValueKind::BOOLEAN);
    let (hello, bye) = (b.string("hello"), b.string("bye"));
    let s = b.var("s", ValueKind::String);
    let length = b.call(
        MethodId::instance("String", "length"),
        Some(s),
        vec![],
        ValueKind::INT,
    );

    let block = Block::new(vec![
        let_var("s", ValueKind::String, hello),
        Stmt::If {
            condition: flag,
            then_branch: Block::new(vec![assign("s", bye)]),
            else_branch: None,
        },
        let_var("n", ValueKind::INT, length),
    ]);
    let result = analyze(&block);

    assert_eq!(result.env.get("n"), Some(&ints(&[3, 5])));
}

// ============================================================================
// Range Refinement
// ============================================================================

#[test]
fn test_less_than_refinement_in_true_branch() {
    // x ∈ [0..10], y ∈ [20..30]; if (x < y) { seen = x; }
    let mut b = ExprBuilder::new();
    let x = b.var("x", ValueKind::INT);
    let y = b.var("y", ValueKind::INT);
    let condition = b.binary(BinaryOp::Lt, x, y);
    let read = b.var("x", ValueKind::INT);
    let read_id = read.id;

    let block = Block::new(vec![
        declare("x", ValueKind::INT, Fact::from_range(Range::new(0, 10).unwrap(), &cfg())),
        declare("y", ValueKind::INT, Fact::from_range(Range::new(20, 30).unwrap(), &cfg())),
        Stmt::If {
            condition,
            then_branch: Block::new(vec![let_var("seen", ValueKind::INT, read)]),
            else_branch: None,
        },
    ]);
    let result = analyze(&block);

    let refined = result.facts.get(read_id).cloned().unwrap();
    assert_eq!(refined.range, Some(Range::new(0, 10).unwrap()));
    assert_eq!(
        result.env.get("x").and_then(|f| f.range),
        Some(Range::new(0, 10).unwrap())
    );
}

#[test]
fn test_guarded_division_has_no_zero_divisor() {
    // if (d != 0) q = 100 / d;
    let mut b = ExprBuilder::new();
    let d = b.var("d", ValueKind::INT);
    let zero = b.int(0);
    let condition = b.binary(BinaryOp::Ne, d, zero);
    let hundred = b.int(100);
    let divisor = b.var("d", ValueKind::INT);
    let quotient = b.binary(BinaryOp::Div, hundred, divisor);

    let block = Block::new(vec![
        declare("d", ValueKind::INT, ints(&[0, 5, 10])),
        Stmt::If {
            condition,
            then_branch: Block::new(vec![let_var("q", ValueKind::INT, quotient)]),
            else_branch: None,
        },
    ]);

    DiagnosticsCollector::enable();
    DiagnosticsCollector::clear();
    let result = analyze(&block);
    let diagnostics = DiagnosticsCollector::take();
    DiagnosticsCollector::disable();

    assert_eq!(result.env.get("q"), Some(&ints(&[10, 20])));
    assert!(!diagnostics
        .iter()
        .any(|d| d.reason == DiagnosticReason::PossibleDivisionByZero));
}

#[test]
fn test_unguarded_division_reports_zero_divisor() {
    let mut b = ExprBuilder::new();
    let hundred = b.int(100);
    let divisor = b.var("d", ValueKind::INT);
    let quotient = b.binary(BinaryOp::Div, hundred, divisor);
    let block = Block::new(vec![
        declare("d", ValueKind::INT, ints(&[0, 5])),
        let_var("q", ValueKind::INT, quotient),
    ]);

    DiagnosticsCollector::enable();
    DiagnosticsCollector::clear();
    let result = analyze(&block);
    let diagnostics = DiagnosticsCollector::take();
    DiagnosticsCollector::disable();

    assert_eq!(result.env.get("q"), Some(&ints(&[20])));
    assert!(diagnostics
        .iter()
        .any(|d| d.reason == DiagnosticReason::PossibleDivisionByZero));
}

// ============================================================================
// Loops
// ============================================================================

#[test]
fn test_counting_loop_exit_value() {
    // int i = 0; int sum = 0; while (i < 4) { sum = sum + i; i++; }
    let mut b = ExprBuilder::new();
    let (zero_i, zero_sum) = (b.int(0), b.int(0));
    let i = b.var("i", ValueKind::INT);
    let four = b.int(4);
    let condition = b.binary(BinaryOp::Lt, i, four);
    let sum = b.var("sum", ValueKind::INT);
    let addend = b.var("i", ValueKind::INT);
    let next = b.binary(BinaryOp::Add, sum, addend);
    let step = b.increment("i", ValueKind::INT, IncDec::PostInc);

    let block = Block::new(vec![
        let_var("i", ValueKind::INT, zero_i),
        let_var("sum", ValueKind::INT, zero_sum),
        Stmt::While {
            condition,
            body: Block::new(vec![assign("sum", next), Stmt::Expr(step)]),
        },
    ]);
    let result = analyze(&block);

    assert!(result.converged);
    assert_eq!(result.env.get("i"), Some(&ints(&[4])));
    let sum = result.env.get("sum").cloned().unwrap();
    assert!(sum.range.is_some_and(|r| r.contains(6)));
}

#[test]
fn test_node_facts_serialize() {
    let mut b = ExprBuilder::new();
    let one = b.int(1);
    let block = Block::new(vec![let_var("x", ValueKind::INT, one)]);
    let result = analyze(&block);
    let json = result.facts.to_json().unwrap();
    assert!(json.contains("IntVal"));
}
