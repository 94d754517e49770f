//! Range arithmetic and lattice laws through the public API.

use num_bigint::BigInt;
use pretty_assertions::assert_eq;
use value_lattice::{AnalysisConfig, OverflowMode, PrimitiveKind, Range, ValueSet};

fn r(from: i64, to: i64) -> Range {
    Range::new(from, to).unwrap()
}

/// Small values plus the neighbourhoods of the `long` bounds.
fn sample_points() -> Vec<i64> {
    let mut points: Vec<i64> = (-9..=9).collect();
    points.extend([i64::MIN, i64::MIN + 1, i64::MIN + 2]);
    points.extend([i64::MAX - 2, i64::MAX - 1, i64::MAX]);
    points
}

/// Every range `[a, b]` with both bounds in `points`.
fn ranges_over(points: &[i64]) -> Vec<Range> {
    let mut ranges = Vec::new();
    for &a in points {
        for &b in points {
            if a <= b {
                ranges.push(r(a, b));
            }
        }
    }
    ranges
}

// ============================================================================
// Division and Overflow
// ============================================================================

#[test]
fn test_divide_by_range_containing_zero() {
    assert_eq!(r(1, 10).divide(r(-5, 5)), Range::EVERYTHING);
}

#[test]
fn test_divide_by_positive_range() {
    assert_eq!(r(10, 20).divide(r(2, 5)), r(2, 10));
}

#[test]
fn test_plus_overflow_widens() {
    let near_max = Range::constant(i64::MAX - 1);
    assert_eq!(near_max.plus(Range::constant(2)), Range::EVERYTHING);
}

#[test]
fn test_plus_overflow_clipped_when_ignored() {
    let near_max = Range::constant(i64::MAX - 1);
    let clipped = near_max.plus_with(Range::constant(2), OverflowMode::Ignore);
    assert_eq!(clipped, Range::constant(i64::MAX));
}

#[test]
fn test_int_narrowing_wraps_constant() {
    let past_int = Range::constant(i32::MAX as i64 + 1);
    assert_eq!(
        past_int.narrow(PrimitiveKind::Int, OverflowMode::Wrap),
        Range::constant(i32::MIN as i64)
    );
}

// ============================================================================
// Lattice Laws
// ============================================================================

#[test]
fn test_union_is_commutative_and_covers_both() {
    let (a, b) = (r(-3, 4), r(10, 12));
    let u = a.union(b);
    assert_eq!(u, b.union(a));
    assert!(u.contains_range(a));
    assert!(u.contains_range(b));
    assert_eq!(a.union(Range::NOTHING), a);
}

#[test]
fn test_intersect_of_disjoint_is_nothing() {
    assert!(r(0, 5).intersect(r(6, 9)).is_nothing());
    assert_eq!(r(0, 5).intersect(r(3, 9)), r(3, 5));
}

#[test]
fn test_value_set_cap_collapse() {
    let config = AnalysisConfig::default();
    let ten = ValueSet::int_values(1..=10, &config);
    let eleven = ValueSet::int_values(1..=11, &config);
    assert!(matches!(ten, ValueSet::IntVal(_)));
    assert_eq!(eleven, ValueSet::Unknown);
}

#[test]
fn test_value_set_join_is_union() {
    let config = AnalysisConfig::default();
    let a = ValueSet::int_values([1, 2], &config);
    let b = ValueSet::int_values([2, 3], &config);
    assert_eq!(a.join(&b, &config), ValueSet::int_values([1, 2, 3], &config));
    assert!(a.is_subtype_of(&a.join(&b, &config)));
    assert_eq!(ValueSet::Bottom.join(&a, &config), a);
}

// ============================================================================
// Range Sweeps
// ============================================================================

#[test]
fn test_union_is_associative_with_nothing_as_identity() {
    let ranges = ranges_over(&sample_points());
    for &a in &ranges {
        assert_eq!(a.union(Range::NOTHING), a);
        assert_eq!(Range::NOTHING.union(a), a);
        for &b in &ranges {
            let ab = a.union(b);
            assert_eq!(ab, b.union(a));
            for &c in &ranges {
                assert_eq!(ab.union(c), a.union(b.union(c)));
            }
        }
    }
}

#[test]
fn test_containment_is_monotonic_under_union() {
    let ranges = ranges_over(&sample_points());
    for &a in &ranges {
        for &b in ranges.iter().filter(|b| b.contains_range(a)) {
            for &c in &ranges {
                assert!(b.union(c).contains_range(a), "{} in {} u {}", a, b, c);
                assert!(b.union(c).contains_range(a.union(c)), "{} {} {}", a, b, c);
            }
        }
    }
}

#[test]
fn test_divide_by_nonzero_divisor_is_well_formed() {
    let ranges = ranges_over(&sample_points());
    let divisors: Vec<Range> = ranges.iter().copied().filter(|d| !d.contains(0)).collect();
    for &a in &ranges {
        for &d in &divisors {
            let quotient = a.divide(d);
            assert!(!quotient.is_nothing(), "{} / {}", a, d);
            assert!(quotient.from() <= quotient.to(), "{} / {}", a, d);
        }
    }
}

#[test]
fn test_divide_contains_every_small_quotient() {
    let small: Vec<i64> = (-9..=9).collect();
    let ranges = ranges_over(&small);
    let divisors: Vec<Range> = ranges.iter().copied().filter(|d| !d.contains(0)).collect();
    for &a in &ranges {
        for &d in &divisors {
            let quotient = a.divide(d);
            for x in a.from()..=a.to() {
                for y in d.from()..=d.to() {
                    assert!(quotient.contains(x / y), "{} / {} misses {}", a, d, x / y);
                }
            }
        }
    }
}

#[test]
fn test_big_range_round_trip_near_long_bounds() {
    let points = sample_points();
    for &a in &points {
        for &b in points.iter().filter(|&&b| a <= b) {
            let (from, to) = (BigInt::from(a), BigInt::from(b));
            assert_eq!(Range::big_range_to_long_range(&from, &to), r(a, b));
            assert_eq!(
                Range::big_range_to_long_range_with(&from, &to, OverflowMode::Ignore),
                r(a, b)
            );
        }
    }
}

#[test]
fn test_big_range_beyond_long_bounds() {
    for &a in &sample_points() {
        for k in 1..=3_i64 {
            let above = BigInt::from(i64::MAX) + k;
            let below = BigInt::from(i64::MIN) - k;
            let bound = BigInt::from(a);
            assert_eq!(
                Range::big_range_to_long_range(&bound, &above),
                Range::EVERYTHING
            );
            assert_eq!(
                Range::big_range_to_long_range(&below, &bound),
                Range::EVERYTHING
            );
            assert_eq!(
                Range::big_range_to_long_range_with(&bound, &above, OverflowMode::Ignore),
                r(a, i64::MAX)
            );
            assert_eq!(
                Range::big_range_to_long_range_with(&below, &bound, OverflowMode::Ignore),
                r(i64::MIN, a)
            );
        }
    }
}
