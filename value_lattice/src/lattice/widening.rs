//! Widening constants for value and range facts.
//!
//! These constants bound how precise a fact may become before it is
//! deliberately widened, which keeps every fixed-point computation finite.

/// Largest value set kept exactly before collapsing to `Unknown`.
pub const DEFAULT_MAX_VALUES: usize = 10;

/// Largest cartesian product of argument values evaluated for one node.
pub const DEFAULT_MAX_ARGUMENT_COMBINATIONS: usize = 1000;

/// Maximum iterations for a loop fixed point in the forward analysis.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Upper bounds a growing range jumps to when widened, narrowest first.
pub const WIDENING_UPPER_BOUNDS: [i64; 4] = [
    i8::MAX as i64,
    i16::MAX as i64,
    i32::MAX as i64,
    i64::MAX,
];

/// Lower bounds a shrinking range jumps to when widened, narrowest first.
pub const WIDENING_LOWER_BOUNDS: [i64; 4] = [
    i8::MIN as i64,
    i16::MIN as i64,
    i32::MIN as i64,
    i64::MIN,
];
