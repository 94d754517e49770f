//! Analysis diagnostics for value and range inference.
//!
//! The value engine never fails on precision loss. When a fact has to be
//! degraded to `Unknown` or `EVERYTHING`, or when an evaluated operation throws,
//! a diagnostic is emitted here so that the host can surface it as a warning.
//!
//! # Overview
//!
//! Diagnostics are produced for:
//! - Value sets that exceed the configured cap and collapse to `Unknown`
//! - Division or remainder by a divisor whose range contains zero
//! - Explicit ranges whose bounds are inconsistent (`from > to`)
//! - Operator or method evaluations that threw for some argument combination
//! - Cartesian argument products that exceed the evaluation limit
//! - Loop fixed points and inference passes that did not converge
//!
//! # Usage
//!
//! Diagnostics are disabled by default to avoid noisy output. Enable them via:
//! - `DiagnosticsCollector::enable()` - enable diagnostics collection
//! - `DiagnosticsCollector::disable()` - disable diagnostics collection
//! - `DiagnosticsCollector::take()` - retrieve and clear collected diagnostics
//!
//! The collector is thread-local, so concurrent analyses on separate threads
//! never observe each other's diagnostics.

use std::cell::RefCell;

/// Reason a fact lost precision or an evaluation was abandoned.
#[derive(Clone, Debug, PartialEq)]
pub enum DiagnosticReason {
    /// A value set grew past the cap and collapsed to `Unknown`.
    TooManyValues { count: usize, max: usize },

    /// Integer division or remainder by a divisor that may be zero.
    PossibleDivisionByZero,

    /// An explicit range annotation had `from > to`.
    MalformedRange { from: i64, to: i64 },

    /// Range arithmetic overflowed and the result was widened.
    /// Contains the operator symbol.
    RangeOverflow(String),

    /// Shift amount outside the window that can be bounded safely.
    /// Contains the operator symbol.
    ShiftOutOfRange(String),

    /// Operator evaluation threw for some operand combination.
    OperatorEvaluationFailed { op: String, operands: String },

    /// Method evaluation threw for some argument combination.
    MethodEvaluationFailed { method: String, message: String },

    /// The evaluator could not resolve the called method.
    MethodNotFound(String),

    /// Cartesian product of argument values exceeded the evaluation limit.
    TooManyArgumentCombinations { count: usize, max: usize },

    /// Fixed-point iteration did not converge.
    /// Contains the number of iterations before giving up.
    FixedPointDivergence(usize),

    /// A type-inference target was left unresolved.
    UnresolvedTarget(String),

    /// Generic fallback for other reasons.
    Other(String),
}

impl std::fmt::Display for DiagnosticReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticReason::TooManyValues { count, max } => {
                write!(f, "too many possible values: {} (max {})", count, max)
            }
            DiagnosticReason::PossibleDivisionByZero => {
                write!(f, "divisor may be zero")
            }
            DiagnosticReason::MalformedRange { from, to } => {
                write!(f, "malformed range: from {} is greater than to {}", from, to)
            }
            DiagnosticReason::RangeOverflow(op) => {
                write!(f, "range arithmetic for '{}' may overflow", op)
            }
            DiagnosticReason::ShiftOutOfRange(op) => {
                write!(f, "shift amount for '{}' cannot be bounded", op)
            }
            DiagnosticReason::OperatorEvaluationFailed { op, operands } => {
                write!(f, "evaluation of '{}' failed for operands ({})", op, operands)
            }
            DiagnosticReason::MethodEvaluationFailed { method, message } => {
                write!(f, "evaluation of method '{}' failed: {}", method, message)
            }
            DiagnosticReason::MethodNotFound(method) => {
                write!(f, "method '{}' cannot be evaluated", method)
            }
            DiagnosticReason::TooManyArgumentCombinations { count, max } => {
                write!(
                    f,
                    "too many argument combinations: {} (max {})",
                    count, max
                )
            }
            DiagnosticReason::FixedPointDivergence(iters) => {
                write!(
                    f,
                    "fixed-point analysis didn't converge after {} iterations",
                    iters
                )
            }
            DiagnosticReason::UnresolvedTarget(name) => {
                write!(f, "type argument '{}' could not be inferred", name)
            }
            DiagnosticReason::Other(desc) => write!(f, "{}", desc),
        }
    }
}

/// A single value-analysis diagnostic (warning).
#[derive(Clone, Debug)]
pub struct ValueDiagnostic {
    /// Why precision was lost.
    pub reason: DiagnosticReason,
    /// Optional source location (line, column) if available.
    pub location: Option<(usize, usize)>,
    /// Optional expression or variable name associated with this diagnostic.
    pub context: Option<String>,
}

impl ValueDiagnostic {
    /// Create a new diagnostic.
    pub fn new(reason: DiagnosticReason) -> Self {
        Self {
            reason,
            location: None,
            context: None,
        }
    }

    /// Add a source location to the diagnostic.
    pub fn with_location(mut self, line: usize, column: usize) -> Self {
        self.location = Some((line, column));
        self
    }

    /// Add context (variable/expression name) to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl std::fmt::Display for ValueDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "value analysis warning: {}", self.reason)?;
        if let Some((line, col)) = self.location {
            write!(f, " at line {}, column {}", line, col)?;
        }
        if let Some(ctx) = &self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}

// Thread-local storage for diagnostics collector state
thread_local! {
    static DIAGNOSTICS_ENABLED: RefCell<bool> = const { RefCell::new(false) };
    static DIAGNOSTICS: RefCell<Vec<ValueDiagnostic>> = const { RefCell::new(Vec::new()) };
}

/// Collector for value-analysis diagnostics.
///
/// Uses thread-local storage to collect diagnostics during analysis.
/// Disabled by default to avoid overhead and noisy output.
#[derive(Debug)]
pub struct DiagnosticsCollector;

impl DiagnosticsCollector {
    /// Enable diagnostics collection.
    pub fn enable() {
        DIAGNOSTICS_ENABLED.with(|enabled| {
            *enabled.borrow_mut() = true;
        });
    }

    /// Disable diagnostics collection.
    pub fn disable() {
        DIAGNOSTICS_ENABLED.with(|enabled| {
            *enabled.borrow_mut() = false;
        });
    }

    /// Check if diagnostics collection is enabled.
    pub fn is_enabled() -> bool {
        DIAGNOSTICS_ENABLED.with(|enabled| *enabled.borrow())
    }

    /// Add a diagnostic to the collection (if enabled).
    pub fn emit(diagnostic: ValueDiagnostic) {
        if Self::is_enabled() {
            DIAGNOSTICS.with(|diags| {
                diags.borrow_mut().push(diagnostic);
            });
        }
    }

    /// Take all collected diagnostics, clearing the collection.
    pub fn take() -> Vec<ValueDiagnostic> {
        DIAGNOSTICS.with(|diags| std::mem::take(&mut *diags.borrow_mut()))
    }

    /// Clear all collected diagnostics without returning them.
    pub fn clear() {
        DIAGNOSTICS.with(|diags| {
            diags.borrow_mut().clear();
        });
    }

    /// Get the number of collected diagnostics.
    pub fn count() -> usize {
        DIAGNOSTICS.with(|diags| diags.borrow().len())
    }
}

/// Helper function to emit a value-set collapse diagnostic.
pub fn emit_too_many_values(count: usize, max: usize) {
    DiagnosticsCollector::emit(ValueDiagnostic::new(DiagnosticReason::TooManyValues {
        count,
        max,
    }));
}

/// Helper function to emit a possible division by zero diagnostic.
pub fn emit_possible_division_by_zero(op: &str) {
    DiagnosticsCollector::emit(
        ValueDiagnostic::new(DiagnosticReason::PossibleDivisionByZero)
            .with_context(format!("operator {}", op)),
    );
}

/// Helper function to emit a malformed range diagnostic.
pub fn emit_malformed_range(from: i64, to: i64) {
    DiagnosticsCollector::emit(ValueDiagnostic::new(DiagnosticReason::MalformedRange {
        from,
        to,
    }));
}

/// Helper function to emit a range overflow diagnostic.
pub fn emit_range_overflow(op: &str) {
    DiagnosticsCollector::emit(ValueDiagnostic::new(DiagnosticReason::RangeOverflow(
        op.to_string(),
    )));
}

/// Helper function to emit an unbounded shift diagnostic.
pub fn emit_shift_out_of_range(op: &str) {
    DiagnosticsCollector::emit(ValueDiagnostic::new(DiagnosticReason::ShiftOutOfRange(
        op.to_string(),
    )));
}

/// Helper function to emit an operator evaluation failure.
pub fn emit_operator_failed(op: &str, operands: &str) {
    DiagnosticsCollector::emit(ValueDiagnostic::new(
        DiagnosticReason::OperatorEvaluationFailed {
            op: op.to_string(),
            operands: operands.to_string(),
        },
    ));
}

/// Helper function to emit a method evaluation failure.
pub fn emit_method_failed(method: &str, message: &str) {
    DiagnosticsCollector::emit(ValueDiagnostic::new(
        DiagnosticReason::MethodEvaluationFailed {
            method: method.to_string(),
            message: message.to_string(),
        },
    ));
}

/// Helper function to emit an unresolvable method diagnostic.
pub fn emit_method_not_found(method: &str) {
    DiagnosticsCollector::emit(ValueDiagnostic::new(DiagnosticReason::MethodNotFound(
        method.to_string(),
    )));
}

/// Helper function to emit a too-many-combinations diagnostic.
pub fn emit_too_many_combinations(count: usize, max: usize) {
    DiagnosticsCollector::emit(ValueDiagnostic::new(
        DiagnosticReason::TooManyArgumentCombinations { count, max },
    ));
}

/// Helper function to emit a fixed-point divergence diagnostic.
pub fn emit_fixed_point_divergence(iterations: usize, context: &str) {
    DiagnosticsCollector::emit(
        ValueDiagnostic::new(DiagnosticReason::FixedPointDivergence(iterations))
            .with_context(context),
    );
}

/// Helper function to emit an unresolved inference target diagnostic.
pub fn emit_unresolved_target(name: &str) {
    DiagnosticsCollector::emit(ValueDiagnostic::new(DiagnosticReason::UnresolvedTarget(
        name.to_string(),
    )));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_disabled_by_default() {
        DiagnosticsCollector::disable();
        DiagnosticsCollector::clear();

        assert!(!DiagnosticsCollector::is_enabled());

        // Emit should be a no-op when disabled
        emit_too_many_values(11, 10);
        assert_eq!(DiagnosticsCollector::count(), 0);
    }

    #[test]
    fn test_diagnostic_collection() {
        DiagnosticsCollector::enable();
        DiagnosticsCollector::clear();

        emit_possible_division_by_zero("/");
        emit_method_not_found("String.trim");

        assert_eq!(DiagnosticsCollector::count(), 2);

        let diags = DiagnosticsCollector::take();
        assert_eq!(diags.len(), 2);
        assert_eq!(DiagnosticsCollector::count(), 0);

        assert!(matches!(
            &diags[0].reason,
            DiagnosticReason::PossibleDivisionByZero
        ));
        assert!(matches!(
            &diags[1].reason,
            DiagnosticReason::MethodNotFound(name) if name == "String.trim"
        ));

        DiagnosticsCollector::disable();
    }

    #[test]
    fn test_diagnostic_reason_display() {
        assert_eq!(
            DiagnosticReason::TooManyValues { count: 11, max: 10 }.to_string(),
            "too many possible values: 11 (max 10)"
        );
        assert_eq!(
            DiagnosticReason::MalformedRange { from: 5, to: 1 }.to_string(),
            "malformed range: from 5 is greater than to 1"
        );
        assert_eq!(
            DiagnosticReason::FixedPointDivergence(100).to_string(),
            "fixed-point analysis didn't converge after 100 iterations"
        );
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = ValueDiagnostic::new(DiagnosticReason::PossibleDivisionByZero)
            .with_location(10, 5)
            .with_context("x / y");

        let display = diag.to_string();
        assert!(display.contains("divisor may be zero"));
        assert!(display.contains("line 10"));
        assert!(display.contains("x / y"));
    }
}
