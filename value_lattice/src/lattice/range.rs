//! Bounded 64-bit signed integer intervals.
//!
//! A [`Range`] is an immutable inclusive interval `[from, to]`. Every operation
//! returns a new range; none can produce an inconsistent one.
//!
//! # Arithmetic
//!
//! Arithmetic is two-tier. When both operands are small enough that the bound
//! computation cannot overflow `i64`, the bounds are computed directly. On the
//! complement the bounds are computed with arbitrary-precision integers and
//! converted back with [`Range::big_range_to_long_range`], which widens to
//! [`Range::EVERYTHING`] whenever a bound leaves the `i64` domain.
//!
//! ```text
//! [1..3] + [10..20]           = [11..23]
//! [MAX-1..MAX-1] + [2..2]     = EVERYTHING
//! [1..10] / [-5..5]           = EVERYTHING   (divisor may be zero)
//! ```
//!
//! # Sentinels
//!
//! `EVERYTHING` is `[i64::MIN, i64::MAX]`. `NOTHING` is the unique empty range;
//! it is stored as `[i64::MAX, i64::MIN]` and recognized by equality.

use crate::diagnostics::emit_malformed_range;
use crate::error::ValueError;
use crate::kind::PrimitiveKind;
use crate::lattice::widening::{WIDENING_LOWER_BOUNDS, WIDENING_UPPER_BOUNDS};
use num_bigint::{BigInt, Sign};
use num_traits::{One, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::cmp::{max, min};
use std::fmt;

const INT_MIN: i64 = i32::MIN as i64;
const INT_MAX: i64 = i32::MAX as i64;
const HALF_LONG_MIN: i64 = i64::MIN >> 1;
const HALF_LONG_MAX: i64 = i64::MAX >> 1;

/// How range arithmetic treats bounds that leave the `i64` domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverflowMode {
    /// Widen to the full range of the type whenever overflow may occur.
    #[default]
    Wrap,
    /// Clip the bounds to the type's range, assuming overflow never happens.
    Ignore,
}

/// Inclusive interval of 64-bit signed integers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(i64, i64)", into = "(i64, i64)")]
pub struct Range {
    from: i64,
    to: i64,
}

impl Range {
    /// The full 64-bit range.
    pub const EVERYTHING: Range = Range {
        from: i64::MIN,
        to: i64::MAX,
    };
    pub const LONG_EVERYTHING: Range = Range::EVERYTHING;
    pub const INT_EVERYTHING: Range = Range {
        from: INT_MIN,
        to: INT_MAX,
    };
    pub const SHORT_EVERYTHING: Range = Range {
        from: i16::MIN as i64,
        to: i16::MAX as i64,
    };
    pub const CHAR_EVERYTHING: Range = Range {
        from: 0,
        to: u16::MAX as i64,
    };
    pub const BYTE_EVERYTHING: Range = Range {
        from: i8::MIN as i64,
        to: i8::MAX as i64,
    };
    /// Every valid array or string length.
    pub const LENGTH_EVERYTHING: Range = Range {
        from: 0,
        to: INT_MAX,
    };
    /// The empty range.
    pub const NOTHING: Range = Range {
        from: i64::MAX,
        to: i64::MIN,
    };

    /// Build a range, rejecting inconsistent bounds.
    pub fn new(from: i64, to: i64) -> Result<Range, ValueError> {
        if from > to {
            emit_malformed_range(from, to);
            return Err(ValueError::InvalidRange { from, to });
        }
        Ok(Range { from, to })
    }

    /// The single-value range `[value, value]`.
    pub fn constant(value: i64) -> Range {
        Range {
            from: value,
            to: value,
        }
    }

    /// Smallest range containing every value; `NOTHING` for no values.
    pub fn from_values<I: IntoIterator<Item = i64>>(values: I) -> Range {
        values.into_iter().fold(Range::NOTHING, |acc, v| {
            if acc.is_nothing() {
                Range::constant(v)
            } else {
                Range::create(min(acc.from, v), max(acc.to, v))
            }
        })
    }

    /// Full range of an integral kind. Non-integral kinds get `EVERYTHING`.
    pub fn for_kind(kind: PrimitiveKind) -> Range {
        match kind {
            PrimitiveKind::Byte => Range::BYTE_EVERYTHING,
            PrimitiveKind::Short => Range::SHORT_EVERYTHING,
            PrimitiveKind::Char => Range::CHAR_EVERYTHING,
            PrimitiveKind::Int => Range::INT_EVERYTHING,
            _ => Range::EVERYTHING,
        }
    }

    fn create(from: i64, to: i64) -> Range {
        debug_assert!(from <= to, "inconsistent range [{}, {}]", from, to);
        Range { from, to }
    }

    fn create_or_nothing(from: i64, to: i64) -> Range {
        if from <= to {
            Range { from, to }
        } else {
            Range::NOTHING
        }
    }

    /// Lower bound.
    pub fn from(self) -> i64 {
        self.from
    }

    /// Upper bound.
    pub fn to(self) -> i64 {
        self.to
    }

    // ── predicates ──

    pub fn is_nothing(self) -> bool {
        self == Range::NOTHING
    }

    pub fn is_everything(self) -> bool {
        self == Range::EVERYTHING
    }

    /// True iff the range holds exactly one value.
    pub fn is_constant(self) -> bool {
        self.from == self.to
    }

    /// True iff every value of the range lies within `[lo, hi]`.
    pub fn is_within(self, lo: i64, hi: i64) -> bool {
        lo <= self.from && self.to <= hi
    }

    /// True iff the range fits in 32-bit signed integers.
    pub fn is_within_integer(self) -> bool {
        self.is_within(INT_MIN, INT_MAX)
    }

    fn is_within_half_long(self) -> bool {
        self.is_within(HALF_LONG_MIN, HALF_LONG_MAX)
    }

    pub fn contains(self, value: i64) -> bool {
        self.from <= value && value <= self.to
    }

    /// True iff `other` is a subrange of this range. `NOTHING` is contained in every range.
    pub fn contains_range(self, other: Range) -> bool {
        other.is_within(self.from, self.to)
    }

    /// Number of values in the range.
    pub fn cardinality(self) -> BigInt {
        if self.is_nothing() {
            return BigInt::from(0);
        }
        BigInt::from(self.to) - BigInt::from(self.from) + BigInt::one()
    }

    /// True iff the range holds more than `n` values.
    pub fn is_wider_than(self, n: u64) -> bool {
        if self.is_nothing() {
            return false;
        }
        match self
            .to
            .checked_sub(self.from)
            .and_then(|width| width.checked_add(1))
        {
            Some(count) => count as u64 > n,
            None => self.cardinality() > BigInt::from(n),
        }
    }

    // ── lattice ──

    /// Smallest range containing both ranges. `NOTHING` is the identity.
    pub fn union(self, right: Range) -> Range {
        if self.is_nothing() {
            return right;
        }
        if right.is_nothing() {
            return self;
        }
        Range::create(min(self.from, right.from), max(self.to, right.to))
    }

    /// Overlap of both ranges, or `NOTHING` when they are disjoint.
    pub fn intersect(self, right: Range) -> Range {
        if self.is_nothing() || right.is_nothing() {
            return Range::NOTHING;
        }
        Range::create_or_nothing(max(self.from, right.from), min(self.to, right.to))
    }

    /// Loop widening of `self` against the range of the previous iteration.
    ///
    /// A bound that moved jumps to the next of the byte, short, int and long
    /// limits, so a loop can widen a range at most four times per direction.
    pub fn widened_upper_bound(self, previous: Range) -> Range {
        if previous.is_nothing() || self.is_nothing() {
            return self.union(previous);
        }
        if self == previous {
            return self;
        }
        if self.from >= previous.from && self.to >= previous.to {
            let upper = WIDENING_UPPER_BOUNDS
                .iter()
                .copied()
                .find(|&bound| self.to < bound)
                .unwrap_or(i64::MAX);
            return Range::create(self.from, upper);
        }
        if self.from <= previous.from && self.to <= previous.to {
            let lower = WIDENING_LOWER_BOUNDS
                .iter()
                .copied()
                .find(|&bound| self.from > bound)
                .unwrap_or(i64::MIN);
            return Range::create(lower, self.to);
        }
        if self.is_within(i8::MIN as i64, i8::MAX as i64) {
            Range::BYTE_EVERYTHING
        } else if self.is_within(i16::MIN as i64, i16::MAX as i64) {
            Range::SHORT_EVERYTHING
        } else if self.is_within_integer() {
            Range::INT_EVERYTHING
        } else {
            Range::EVERYTHING
        }
    }

    // ── big-integer conversion ──

    /// Convert arbitrary-precision bounds back to a range, widening on overflow.
    pub fn big_range_to_long_range(from: &BigInt, to: &BigInt) -> Range {
        Range::big_range_to_long_range_with(from, to, OverflowMode::Wrap)
    }

    /// Convert arbitrary-precision bounds back to a range under `mode`.
    ///
    /// In `Wrap` mode any bound outside `i64` widens the result to
    /// `EVERYTHING`. In `Ignore` mode the bounds are clipped to `i64`.
    pub fn big_range_to_long_range_with(from: &BigInt, to: &BigInt, mode: OverflowMode) -> Range {
        debug_assert!(from <= to);
        match mode {
            OverflowMode::Ignore => Range::create(clip_to_long(from), clip_to_long(to)),
            OverflowMode::Wrap => match (from.to_i64(), to.to_i64()) {
                (Some(lo), Some(hi)) => Range::create(lo, hi),
                _ => Range::EVERYTHING,
            },
        }
    }

    // ── arithmetic ──

    pub fn unary_plus(self) -> Range {
        self
    }

    /// Negation. Widens when `i64::MIN` is negated as part of a wider range.
    pub fn unary_minus(self) -> Range {
        if self.is_nothing() {
            return Range::NOTHING;
        }
        if self.from == i64::MIN && self.from != self.to {
            return Range::EVERYTHING;
        }
        Range::create(self.to.wrapping_neg(), self.from.wrapping_neg())
    }

    pub fn bitwise_complement(self) -> Range {
        if self.is_nothing() {
            return Range::NOTHING;
        }
        Range::create(!self.to, !self.from)
    }

    pub fn plus(self, right: Range) -> Range {
        self.plus_with(right, OverflowMode::Wrap)
    }

    pub fn plus_with(self, right: Range, mode: OverflowMode) -> Range {
        if self.is_nothing() || right.is_nothing() {
            return Range::NOTHING;
        }
        if self.is_within_half_long() && right.is_within_half_long() {
            return Range::create(self.from + right.from, self.to + right.to);
        }
        let from = BigInt::from(self.from) + BigInt::from(right.from);
        let to = BigInt::from(self.to) + BigInt::from(right.to);
        Range::big_range_to_long_range_with(&from, &to, mode)
    }

    pub fn minus(self, right: Range) -> Range {
        self.minus_with(right, OverflowMode::Wrap)
    }

    pub fn minus_with(self, right: Range, mode: OverflowMode) -> Range {
        if self.is_nothing() || right.is_nothing() {
            return Range::NOTHING;
        }
        if self.is_within_half_long() && right.is_within_half_long() {
            return Range::create(self.from - right.to, self.to - right.from);
        }
        let from = BigInt::from(self.from) - BigInt::from(right.to);
        let to = BigInt::from(self.to) - BigInt::from(right.from);
        Range::big_range_to_long_range_with(&from, &to, mode)
    }

    pub fn times(self, right: Range) -> Range {
        self.times_with(right, OverflowMode::Wrap)
    }

    pub fn times_with(self, right: Range, mode: OverflowMode) -> Range {
        if self.is_nothing() || right.is_nothing() {
            return Range::NOTHING;
        }
        if self.is_within_integer() && right.is_within_integer() {
            let products = [
                self.from * right.from,
                self.from * right.to,
                self.to * right.from,
                self.to * right.to,
            ];
            return Range::create(min_of(&products), max_of(&products));
        }
        let products = [
            BigInt::from(self.from) * BigInt::from(right.from),
            BigInt::from(self.from) * BigInt::from(right.to),
            BigInt::from(self.to) * BigInt::from(right.from),
            BigInt::from(self.to) * BigInt::from(right.to),
        ];
        let (mut lo, mut hi) = (&products[0], &products[0]);
        for p in &products[1..] {
            if p < lo {
                lo = p;
            }
            if p > hi {
                hi = p;
            }
        }
        Range::big_range_to_long_range_with(lo, hi, mode)
    }

    /// Integer division.
    ///
    /// Returns `EVERYTHING` when the divisor may be zero; the caller reports
    /// the possible division by zero. Otherwise the bounds follow a case split
    /// on the signs of both operands.
    pub fn divide(self, right: Range) -> Range {
        if self.is_nothing() || right.is_nothing() {
            return Range::NOTHING;
        }
        if right.contains(0) {
            return Range::EVERYTHING;
        }
        // MIN / -1 overflows back to MIN.
        if self.from == i64::MIN && right.contains(-1) {
            if self.from != self.to {
                return Range::EVERYTHING;
            }
            if right.from != right.to {
                return Range::create(i64::MIN, i64::MIN / -2);
            }
            return Range::create(i64::MIN, i64::MIN);
        }

        let (from, to) = (self.from, self.to);
        let (result_from, result_to) = if from > 0 {
            if right.from >= 0 {
                // 1. positive / positive
                (from / max(right.to, 1), to / max(right.from, 1))
            } else if right.to <= 0 {
                // 2. positive / negative
                (to / min(right.to, -1), from / min(right.from, -1))
            } else {
                // 3. positive / straddling
                (-to, to)
            }
        } else if to < 0 {
            if right.from >= 0 {
                // 4. negative / positive
                (from / max(right.from, 1), to / max(right.to, 1))
            } else if right.to <= 0 {
                // 5. negative / negative
                (to / min(right.from, -1), from / min(right.to, -1))
            } else {
                // 6. negative / straddling
                (from, from.wrapping_neg())
            }
        } else if right.from >= 0 {
            // 7. straddling / positive
            (from / max(right.from, 1), to / max(right.from, 1))
        } else if right.to <= 0 {
            // 8. straddling / negative
            (to / min(right.to, -1), from / min(right.to, -1))
        } else {
            // 9. straddling / straddling
            (min(from, to.wrapping_neg()), max(from.wrapping_neg(), to))
        };
        Range::create(result_from, result_to)
    }

    /// Integer remainder.
    ///
    /// Returns `EVERYTHING` when the divisor may be zero. Otherwise the result
    /// spans nine candidate extremes; this over-approximates and is not
    /// necessarily the tightest bound.
    pub fn remainder(self, right: Range) -> Range {
        if self.is_nothing() || right.is_nothing() {
            return Range::NOTHING;
        }
        if right.contains(0) {
            return Range::EVERYTHING;
        }
        let (from, to) = (self.from as i128, self.to as i128);
        let abs_from = (right.from as i128).abs();
        let abs_to = (right.to as i128).abs();
        let candidates = [
            0,
            min(from, abs_from - 1),
            min(from, abs_to - 1),
            min(to, abs_from - 1),
            min(to, abs_to - 1),
            max(from, 1 - abs_from),
            max(from, 1 - abs_to),
            max(to, 1 - abs_from),
            max(to, 1 - abs_to),
        ];
        let lo = candidates.iter().copied().min().unwrap_or(0);
        let hi = candidates.iter().copied().max().unwrap_or(0);
        // Every candidate lies between a bound of `self` and +-(|divisor| - 1).
        Range::create(lo as i64, hi as i64)
    }

    /// Left shift on a value of the narrowest kind holding `self`.
    pub fn shift_left(self, right: Range) -> Range {
        let kind = if self.is_within_integer() {
            PrimitiveKind::Int
        } else {
            PrimitiveKind::Long
        };
        self.shift_left_with(right, kind, OverflowMode::Wrap)
    }

    /// Left shift of a `kind` value for shift amounts in `[0, 31]`, or
    /// `[0, 63]` when `kind` is `long`. Any other shift amount gives
    /// `EVERYTHING`.
    pub fn shift_left_with(self, right: Range, kind: PrimitiveKind, mode: OverflowMode) -> Range {
        if self.is_nothing() || right.is_nothing() {
            return Range::NOTHING;
        }
        let max_shift = if kind == PrimitiveKind::Long { 63 } else { 31 };
        if !right.is_within(0, max_shift) {
            return Range::EVERYTHING;
        }
        let from_shift = if self.from >= 0 { right.from } else { right.to };
        let to_shift = if self.to >= 0 { right.to } else { right.from };
        if self.is_within_integer() && right.to <= 31 {
            return Range::create(self.from << from_shift, self.to << to_shift);
        }
        let from = BigInt::from(self.from) << (from_shift as usize);
        let to = BigInt::from(self.to) << (to_shift as usize);
        Range::big_range_to_long_range_with(&from, &to, mode)
    }

    /// Arithmetic right shift for 32-bit ranges and shift amounts in `[0, 31]`.
    pub fn signed_shift_right(self, right: Range) -> Range {
        if self.is_nothing() || right.is_nothing() {
            return Range::NOTHING;
        }
        if self.is_within_integer() && right.is_within(0, 31) {
            let from_shift = if self.from >= 0 { right.to } else { right.from };
            let to_shift = if self.to >= 0 { right.from } else { right.to };
            return Range::create(self.from >> from_shift, self.to >> to_shift);
        }
        Range::EVERYTHING
    }

    /// Logical right shift; only non-negative ranges are modelled.
    pub fn unsigned_shift_right(self, right: Range) -> Range {
        if self.is_nothing() || right.is_nothing() {
            return Range::NOTHING;
        }
        if self.from >= 0 {
            return self.signed_shift_right(right);
        }
        Range::EVERYTHING
    }

    /// Bitwise and. Refines only when one side is a constant mask.
    pub fn bitwise_and(self, right: Range) -> Range {
        if self.is_nothing() || right.is_nothing() {
            return Range::NOTHING;
        }
        if self.is_constant() && right.is_constant() {
            return Range::constant(self.from & right.from);
        }
        if right.is_constant() {
            return self.and_mask(right.from);
        }
        if self.is_constant() {
            return right.and_mask(self.from);
        }
        Range::EVERYTHING
    }

    fn and_mask(self, mask: i64) -> Range {
        if mask >= 0 {
            // The result keeps no bit outside the mask and is non-negative.
            if self.from >= 0 {
                return Range::create(0, min(mask, self.to));
            }
            return Range::create(0, mask);
        }
        if self.from >= 0 {
            // The sign bit of the mask cannot survive.
            return Range::create(0, min(mask & i64::MAX, self.to));
        }
        if self.to < 0 {
            // Both sign bits are set, so the result is negative and no larger
            // than either operand.
            return Range::create(i64::MIN, min(self.to, mask));
        }
        Range::create(i64::MIN, self.to)
    }

    /// Bitwise or. Refines constants and non-negative ranges.
    pub fn bitwise_or(self, right: Range) -> Range {
        if self.is_nothing() || right.is_nothing() {
            return Range::NOTHING;
        }
        if self.is_constant() && right.is_constant() {
            return Range::constant(self.from | right.from);
        }
        if self.from >= 0 && right.from >= 0 {
            let ceiling = all_ones_up_to(max(self.to, right.to));
            return Range::create(max(self.from, right.from), ceiling);
        }
        Range::EVERYTHING
    }

    /// Bitwise exclusive or. Refines constants and non-negative ranges.
    pub fn bitwise_xor(self, right: Range) -> Range {
        if self.is_nothing() || right.is_nothing() {
            return Range::NOTHING;
        }
        if self.is_constant() && right.is_constant() {
            return Range::constant(self.from ^ right.from);
        }
        if self.from >= 0 && right.from >= 0 {
            return Range::create(0, all_ones_up_to(max(self.to, right.to)));
        }
        Range::EVERYTHING
    }

    // ── refinement ──

    /// Values of `self` that can be less than some value of `right`.
    pub fn refine_less_than(self, right: Range) -> Range {
        if right.is_nothing() || right.to == i64::MIN {
            return Range::NOTHING;
        }
        Range::create_or_nothing(self.from, min(self.to, right.to - 1))
    }

    /// Values of `self` that can be less than or equal to some value of `right`.
    pub fn refine_less_than_eq(self, right: Range) -> Range {
        if right.is_nothing() {
            return Range::NOTHING;
        }
        Range::create_or_nothing(self.from, min(self.to, right.to))
    }

    /// Values of `self` that can be greater than some value of `right`.
    pub fn refine_greater_than(self, right: Range) -> Range {
        if right.is_nothing() || right.from == i64::MAX {
            return Range::NOTHING;
        }
        Range::create_or_nothing(max(self.from, right.from + 1), self.to)
    }

    /// Values of `self` that can be greater than or equal to some value of `right`.
    pub fn refine_greater_than_eq(self, right: Range) -> Range {
        if right.is_nothing() {
            return Range::NOTHING;
        }
        Range::create_or_nothing(max(self.from, right.from), self.to)
    }

    pub fn refine_equal_to(self, right: Range) -> Range {
        self.intersect(right)
    }

    /// Drops a constant `right` from either end of `self`.
    pub fn refine_not_equal_to(self, right: Range) -> Range {
        if self.is_nothing() || right.is_nothing() {
            return Range::NOTHING;
        }
        if !right.is_constant() {
            return self;
        }
        let excluded = right.from;
        if self.to == excluded {
            return match self.to.checked_sub(1) {
                Some(to) => Range::create_or_nothing(self.from, to),
                None => Range::NOTHING,
            };
        }
        if self.from == excluded {
            return match self.from.checked_add(1) {
                Some(from) => Range::create_or_nothing(from, self.to),
                None => Range::NOTHING,
            };
        }
        self
    }

    // ── narrowing ──

    pub fn int_range(self) -> Range {
        self.narrow(PrimitiveKind::Int, OverflowMode::Wrap)
    }

    pub fn short_range(self) -> Range {
        self.narrow(PrimitiveKind::Short, OverflowMode::Wrap)
    }

    pub fn char_range(self) -> Range {
        self.narrow(PrimitiveKind::Char, OverflowMode::Wrap)
    }

    pub fn byte_range(self) -> Range {
        self.narrow(PrimitiveKind::Byte, OverflowMode::Wrap)
    }

    /// Narrow to the width of `kind`, as a cast to that kind would.
    ///
    /// A range already within the width is returned unchanged. A range with
    /// more values than the width can hold becomes the width's full range.
    /// Otherwise both bounds are truncated, and if truncation inverts them the
    /// result is again the width's full range. In `Ignore` mode the bounds are
    /// clipped instead.
    pub fn narrow(self, kind: PrimitiveKind, mode: OverflowMode) -> Range {
        if self.is_nothing() {
            return Range::NOTHING;
        }
        let bounds = Range::for_kind(kind);
        if bounds.contains_range(self) {
            return self;
        }
        if mode == OverflowMode::Ignore {
            let clip = |v: i64| v.clamp(bounds.from, bounds.to);
            return Range::create(clip(self.from), clip(self.to));
        }
        let width = (bounds.to - bounds.from) as u64 + 1;
        if self.is_wider_than(width) {
            return bounds;
        }
        let (from, to) = (kind.wrap(self.from), kind.wrap(self.to));
        if from <= to {
            Range::create(from, to)
        } else {
            bounds
        }
    }
}

fn clip_to_long(value: &BigInt) -> i64 {
    match value.to_i64() {
        Some(v) => v,
        None if value.sign() == Sign::Minus => i64::MIN,
        None => i64::MAX,
    }
}

fn min_of(values: &[i64]) -> i64 {
    values.iter().copied().min().unwrap_or(i64::MIN)
}

fn max_of(values: &[i64]) -> i64 {
    values.iter().copied().max().unwrap_or(i64::MAX)
}

/// Smallest `2^k - 1` that is at least `value` (for non-negative `value`).
fn all_ones_up_to(value: i64) -> i64 {
    if value <= 0 {
        return 0;
    }
    let bits = 64 - value.leading_zeros();
    if bits >= 63 {
        i64::MAX
    } else {
        (1i64 << bits) - 1
    }
}

impl Default for Range {
    fn default() -> Self {
        Range::EVERYTHING
    }
}

impl TryFrom<(i64, i64)> for Range {
    type Error = ValueError;

    fn try_from((from, to): (i64, i64)) -> Result<Self, Self::Error> {
        if (from, to) == (i64::MAX, i64::MIN) {
            return Ok(Range::NOTHING);
        }
        Range::new(from, to)
    }
}

impl From<Range> for (i64, i64) {
    fn from(range: Range) -> Self {
        (range.from, range.to)
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nothing() {
            write!(f, "[]")
        } else {
            write!(f, "[{}..{}]", self.from, self.to)
        }
    }
}
