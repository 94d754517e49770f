//! Bounded sets of concrete values.
//!
//! A [`ValueSet`] says "the expression evaluates to one of these values". Each
//! populated kind holds a non-empty set of at most `max_values` elements; any
//! construction or join that would exceed the cap collapses to `Unknown`.
//!
//! # Lattice
//!
//! ```text
//!                Unknown
//!      /     /      |      \       \
//!     |      |      |       |   ArrayLenRange
//!     |      |      |       |       |
//!  IntVal DoubleVal StringVal BoolVal ArrayLen    (ordered by set inclusion)
//!      \     \      |      /       /
//!                Bottom
//! ```
//!
//! `IntVal` is additionally below `DoubleVal` when every integer has an exact
//! double in the double set, and the join of an `IntVal` with a `DoubleVal`
//! promotes the integers.
//!
//! Lengths degrade instead of collapsing: too many strings become the set of
//! their lengths, and too many lengths become an `ArrayLenRange`. A string
//! fact may therefore hold `ArrayLen` or `ArrayLenRange`, meaning the lengths
//! of the strings it may be.

use crate::config::AnalysisConfig;
use crate::const_prop::{canonical_double_string, ConcreteValue};
use crate::diagnostics::emit_too_many_values;
use crate::error::ValueError;
use crate::kind::{PrimitiveKind, ValueKind};
use crate::lattice::range::Range;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Totally ordered `f64` key for value sets.
///
/// Ordering and equality follow `f64::total_cmp`, so `NaN` equals itself and
/// `-0.0` differs from `0.0`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct F64Key(pub f64);

impl PartialEq for F64Key {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for F64Key {}

impl PartialOrd for F64Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for F64Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for F64Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Abstract value: one of a bounded set of concrete values.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueSet {
    /// No execution reaches here with this expression defined.
    Bottom,
    /// Integral values, stored widened to `i64`.
    IntVal(BTreeSet<i64>),
    /// Floating-point values, stored widened to `f64`.
    DoubleVal(BTreeSet<F64Key>),
    StringVal(BTreeSet<String>),
    BoolVal(BTreeSet<bool>),
    /// Possible lengths of an array or string.
    ArrayLen(BTreeSet<usize>),
    /// Lengths within a range, always inside `[0, i32::MAX]`.
    ArrayLenRange(Range),
    /// Anything representable by the static type.
    Unknown,
}

fn capped<T: Ord>(
    values: BTreeSet<T>,
    wrap: fn(BTreeSet<T>) -> ValueSet,
    config: &AnalysisConfig,
) -> ValueSet {
    if values.is_empty() {
        ValueSet::Bottom
    } else if values.len() > config.max_values {
        emit_too_many_values(values.len(), config.max_values);
        ValueSet::Unknown
    } else {
        wrap(values)
    }
}

impl ValueSet {
    // ── construction ──

    pub fn int_values<I: IntoIterator<Item = i64>>(values: I, config: &AnalysisConfig) -> ValueSet {
        capped(values.into_iter().collect(), ValueSet::IntVal, config)
    }

    pub fn double_values<I: IntoIterator<Item = f64>>(
        values: I,
        config: &AnalysisConfig,
    ) -> ValueSet {
        capped(
            values.into_iter().map(F64Key).collect(),
            ValueSet::DoubleVal,
            config,
        )
    }

    /// Strings beyond the cap are replaced by their lengths.
    pub fn string_values<I, S>(values: I, config: &AnalysisConfig) -> ValueSet
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        strings_or_lengths(values.into_iter().map(Into::into).collect(), config)
    }

    pub fn bool_values<I: IntoIterator<Item = bool>>(
        values: I,
        config: &AnalysisConfig,
    ) -> ValueSet {
        capped(values.into_iter().collect(), ValueSet::BoolVal, config)
    }

    /// Lengths beyond the cap become the smallest range holding them.
    pub fn array_lengths<I: IntoIterator<Item = usize>>(
        values: I,
        config: &AnalysisConfig,
    ) -> ValueSet {
        let lengths: BTreeSet<usize> = values.into_iter().collect();
        if lengths.len() > config.max_values {
            let range = Range::from_values(lengths.iter().map(|&n| length_to_i64(n)));
            return ValueSet::array_length_range(range, config);
        }
        non_empty(lengths, ValueSet::ArrayLen)
    }

    /// Lengths inside `range`, clipped to valid lengths.
    ///
    /// A range no wider than the cap is enumerated into `ArrayLen`; a range
    /// covering every length is `Unknown`.
    pub fn array_length_range(range: Range, config: &AnalysisConfig) -> ValueSet {
        let range = range.intersect(Range::LENGTH_EVERYTHING);
        if range.is_nothing() {
            ValueSet::Bottom
        } else if range == Range::LENGTH_EVERYTHING {
            ValueSet::Unknown
        } else if !range.is_wider_than(config.max_values as u64) {
            ValueSet::ArrayLen((range.from()..=range.to()).map(|n| n as usize).collect())
        } else {
            ValueSet::ArrayLenRange(range)
        }
    }

    /// `{true, false}`: the boolean with no information.
    pub fn all_booleans() -> ValueSet {
        ValueSet::BoolVal([false, true].into_iter().collect())
    }

    /// One-element set holding a literal.
    pub fn from_literal(value: &ConcreteValue) -> ValueSet {
        match value {
            ConcreteValue::Boolean(b) => ValueSet::BoolVal(BTreeSet::from([*b])),
            ConcreteValue::Float(f) => ValueSet::DoubleVal(BTreeSet::from([F64Key(*f as f64)])),
            ConcreteValue::Double(d) => ValueSet::DoubleVal(BTreeSet::from([F64Key(*d)])),
            ConcreteValue::Str(s) => ValueSet::StringVal(BTreeSet::from([s.clone()])),
            other => match other.as_i64() {
                Some(v) => ValueSet::IntVal(BTreeSet::from([v])),
                None => ValueSet::Unknown,
            },
        }
    }

    /// Build a value set from an explicit annotation of `kind`.
    ///
    /// Unlike the evaluation paths, this rejects empty lists and values of the
    /// wrong kind, since those indicate a malformed annotation.
    pub fn from_annotation(
        kind: &ValueKind,
        values: &[ConcreteValue],
        config: &AnalysisConfig,
    ) -> Result<ValueSet, ValueError> {
        if values.is_empty() {
            return Err(ValueError::EmptyValueList);
        }
        for value in values {
            let matches = match kind.primitive() {
                Some(p) if p.is_integral() => value.as_i64().is_some(),
                Some(p) if p.is_floating() => value.as_f64().is_some(),
                Some(_) => matches!(value, ConcreteValue::Boolean(_)),
                None => kind.is_string() && matches!(value, ConcreteValue::Str(_)),
            };
            if !matches {
                return Err(ValueError::KindMismatch {
                    expected: kind.to_string(),
                    found: value.kind().to_string(),
                });
            }
        }
        Ok(ValueSet::from_concrete(values, kind, config))
    }

    /// Set of evaluation results of static kind `kind`.
    ///
    /// Integral results become `IntVal`, floating results `DoubleVal`. No
    /// results is `Bottom`; results of mixed kinds are `Unknown`.
    pub fn from_concrete(
        values: &[ConcreteValue],
        kind: &ValueKind,
        config: &AnalysisConfig,
    ) -> ValueSet {
        if values.is_empty() {
            return ValueSet::Bottom;
        }
        if kind.is_integral() {
            let ints: Option<BTreeSet<i64>> = values.iter().map(ConcreteValue::as_i64).collect();
            return ints.map_or(ValueSet::Unknown, |s| capped(s, ValueSet::IntVal, config));
        }
        if kind.is_floating() {
            let doubles: Option<BTreeSet<F64Key>> = values
                .iter()
                .map(|v| v.as_f64().map(F64Key))
                .collect();
            return doubles.map_or(ValueSet::Unknown, |s| capped(s, ValueSet::DoubleVal, config));
        }
        if kind.is_boolean() {
            let bools: Option<BTreeSet<bool>> = values
                .iter()
                .map(|v| match v {
                    ConcreteValue::Boolean(b) => Some(*b),
                    _ => None,
                })
                .collect();
            return bools.map_or(ValueSet::Unknown, |s| capped(s, ValueSet::BoolVal, config));
        }
        if kind.is_string() {
            let strings: Option<BTreeSet<String>> = values
                .iter()
                .map(|v| match v {
                    ConcreteValue::Str(s) => Some(s.clone()),
                    _ => None,
                })
                .collect();
            return strings.map_or(ValueSet::Unknown, |s| strings_or_lengths(s, config));
        }
        ValueSet::Unknown
    }

    /// Enumerate a range into an `IntVal` when it is no wider than the cap.
    pub fn from_range(range: Range, config: &AnalysisConfig) -> ValueSet {
        if range.is_nothing() {
            return ValueSet::Bottom;
        }
        if range.is_wider_than(config.max_values as u64) {
            return ValueSet::Unknown;
        }
        ValueSet::IntVal((range.from()..=range.to()).collect())
    }

    // ── queries ──

    pub fn is_bottom(&self) -> bool {
        matches!(self, ValueSet::Bottom)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ValueSet::Unknown)
    }

    /// True for `IntVal` and `DoubleVal`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueSet::IntVal(_) | ValueSet::DoubleVal(_))
    }

    /// True for `ArrayLen` and `ArrayLenRange`.
    pub fn is_length(&self) -> bool {
        matches!(self, ValueSet::ArrayLen(_) | ValueSet::ArrayLenRange(_))
    }

    /// True for facts that describe lengths: strings and array lengths.
    fn is_length_like(&self) -> bool {
        self.is_length() || matches!(self, ValueSet::StringVal(_))
    }

    /// Number of values, `None` for `Unknown` and `ArrayLenRange`.
    pub fn cardinality(&self) -> Option<usize> {
        match self {
            ValueSet::Bottom => Some(0),
            ValueSet::IntVal(s) => Some(s.len()),
            ValueSet::DoubleVal(s) => Some(s.len()),
            ValueSet::StringVal(s) => Some(s.len()),
            ValueSet::BoolVal(s) => Some(s.len()),
            ValueSet::ArrayLen(s) => Some(s.len()),
            ValueSet::ArrayLenRange(_) | ValueSet::Unknown => None,
        }
    }

    pub fn as_ints(&self) -> Option<&BTreeSet<i64>> {
        match self {
            ValueSet::IntVal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_doubles(&self) -> Option<Vec<f64>> {
        match self {
            ValueSet::DoubleVal(s) => Some(s.iter().map(|k| k.0).collect()),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&BTreeSet<String>> {
        match self {
            ValueSet::StringVal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bools(&self) -> Option<&BTreeSet<bool>> {
        match self {
            ValueSet::BoolVal(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this boolean fact admits `value`. Non-boolean facts admit anything.
    pub fn may_be(&self, value: bool) -> bool {
        match self {
            ValueSet::BoolVal(s) => s.contains(&value),
            ValueSet::Bottom => false,
            _ => true,
        }
    }

    /// Smallest range containing an `IntVal`; `NOTHING` for `Bottom`.
    pub fn to_range(&self) -> Option<Range> {
        match self {
            ValueSet::IntVal(s) => Some(Range::from_values(s.iter().copied())),
            ValueSet::Bottom => Some(Range::NOTHING),
            _ => None,
        }
    }

    /// Lengths of the strings of a string fact.
    pub fn string_lengths(&self, config: &AnalysisConfig) -> ValueSet {
        match self {
            ValueSet::StringVal(s) => {
                ValueSet::array_lengths(s.iter().map(|v| v.encode_utf16().count()), config)
            }
            ValueSet::Bottom | ValueSet::ArrayLen(_) | ValueSet::ArrayLenRange(_) => self.clone(),
            _ => ValueSet::Unknown,
        }
    }

    /// Exact lengths of an array or string fact, when enumerable.
    pub fn lengths(&self) -> Option<BTreeSet<usize>> {
        match self {
            ValueSet::Bottom => Some(BTreeSet::new()),
            ValueSet::ArrayLen(s) => Some(s.clone()),
            ValueSet::StringVal(s) => Some(s.iter().map(|v| v.encode_utf16().count()).collect()),
            _ => None,
        }
    }

    /// Smallest range holding the lengths of an array or string fact.
    pub fn length_range(&self) -> Option<Range> {
        match self {
            ValueSet::ArrayLenRange(range) => Some(*range),
            other => other
                .lengths()
                .map(|lengths| Range::from_values(lengths.into_iter().map(length_to_i64))),
        }
    }

    /// Whether an array or string fact admits `length`.
    fn admits_length(&self, length: usize) -> bool {
        match self {
            ValueSet::ArrayLen(s) => s.contains(&length),
            ValueSet::ArrayLenRange(range) => range.contains(length_to_i64(length)),
            ValueSet::Bottom => false,
            _ => true,
        }
    }

    /// Concrete values for evaluation, typed by the expression's static kind.
    ///
    /// `None` when the values are unknown or cannot be represented as
    /// concrete values of `kind`.
    pub fn candidates(&self, kind: &ValueKind) -> Option<Vec<ConcreteValue>> {
        match (self, kind.primitive()) {
            (ValueSet::Bottom, _) => Some(Vec::new()),
            (ValueSet::IntVal(s), Some(p)) if p.is_integral() => s
                .iter()
                .map(|&v| ConcreteValue::from_integral(v, p))
                .collect(),
            (ValueSet::IntVal(s), Some(p)) if p.is_floating() => s
                .iter()
                .map(|&v| ConcreteValue::from_floating(v as f64, p))
                .collect(),
            (ValueSet::DoubleVal(s), Some(p)) if p.is_floating() => s
                .iter()
                .map(|v| ConcreteValue::from_floating(v.0, p))
                .collect(),
            (ValueSet::BoolVal(s), Some(PrimitiveKind::Boolean)) => {
                Some(s.iter().map(|&b| ConcreteValue::Boolean(b)).collect())
            }
            (ValueSet::StringVal(s), None) if kind.is_string() => {
                Some(s.iter().map(|v| ConcreteValue::Str(v.clone())).collect())
            }
            _ => None,
        }
    }

    // ── lattice ──

    /// Least upper bound.
    pub fn join(&self, other: &ValueSet, config: &AnalysisConfig) -> ValueSet {
        match (self, other) {
            (ValueSet::Bottom, x) | (x, ValueSet::Bottom) => x.clone(),
            (ValueSet::Unknown, _) | (_, ValueSet::Unknown) => ValueSet::Unknown,
            (ValueSet::IntVal(a), ValueSet::IntVal(b)) => {
                capped(a.union(b).copied().collect(), ValueSet::IntVal, config)
            }
            (ValueSet::DoubleVal(a), ValueSet::DoubleVal(b)) => {
                capped(a.union(b).copied().collect(), ValueSet::DoubleVal, config)
            }
            (ValueSet::IntVal(ints), ValueSet::DoubleVal(doubles))
            | (ValueSet::DoubleVal(doubles), ValueSet::IntVal(ints)) => {
                let mut merged = doubles.clone();
                merged.extend(ints.iter().map(|&v| F64Key(v as f64)));
                capped(merged, ValueSet::DoubleVal, config)
            }
            (ValueSet::StringVal(a), ValueSet::StringVal(b)) => {
                strings_or_lengths(a.union(b).cloned().collect(), config)
            }
            (ValueSet::BoolVal(a), ValueSet::BoolVal(b)) => {
                capped(a.union(b).copied().collect(), ValueSet::BoolVal, config)
            }
            (a, b) if a.is_length_like() && b.is_length_like() => {
                match (a.lengths(), b.lengths()) {
                    (Some(x), Some(y)) => ValueSet::array_lengths(x.union(&y).copied(), config),
                    _ => match (a.length_range(), b.length_range()) {
                        (Some(x), Some(y)) => ValueSet::array_length_range(x.union(y), config),
                        _ => ValueSet::Unknown,
                    },
                }
            }
            _ => ValueSet::Unknown,
        }
    }

    /// Greatest lower bound: the smaller operand when they are ordered,
    /// otherwise `Bottom`.
    pub fn meet(&self, other: &ValueSet) -> ValueSet {
        if self.is_subtype_of(other) {
            self.clone()
        } else if other.is_subtype_of(self) {
            other.clone()
        } else {
            ValueSet::Bottom
        }
    }

    /// Values common to both facts, used for branch refinement.
    ///
    /// Same-kind sets intersect; an empty intersection is `Bottom`. Other
    /// pairs fall back to [`ValueSet::meet`].
    pub fn intersect(&self, other: &ValueSet) -> ValueSet {
        match (self, other) {
            (ValueSet::IntVal(a), ValueSet::IntVal(b)) => {
                non_empty(a.intersection(b).copied().collect(), ValueSet::IntVal)
            }
            (ValueSet::DoubleVal(a), ValueSet::DoubleVal(b)) => {
                non_empty(a.intersection(b).copied().collect(), ValueSet::DoubleVal)
            }
            (ValueSet::StringVal(a), ValueSet::StringVal(b)) => {
                non_empty(a.intersection(b).cloned().collect(), ValueSet::StringVal)
            }
            (ValueSet::BoolVal(a), ValueSet::BoolVal(b)) => {
                non_empty(a.intersection(b).copied().collect(), ValueSet::BoolVal)
            }
            (ValueSet::ArrayLen(a), ValueSet::ArrayLen(b)) => {
                non_empty(a.intersection(b).copied().collect(), ValueSet::ArrayLen)
            }
            (ValueSet::ArrayLenRange(a), ValueSet::ArrayLenRange(b)) => {
                let range = a.intersect(*b);
                if range.is_nothing() {
                    ValueSet::Bottom
                } else {
                    ValueSet::ArrayLenRange(range)
                }
            }
            (ValueSet::ArrayLen(a), lengths @ ValueSet::ArrayLenRange(_))
            | (lengths @ ValueSet::ArrayLenRange(_), ValueSet::ArrayLen(a)) => non_empty(
                a.iter().copied().filter(|&n| lengths.admits_length(n)).collect(),
                ValueSet::ArrayLen,
            ),
            (ValueSet::StringVal(s), lengths) | (lengths, ValueSet::StringVal(s))
                if lengths.is_length() =>
            {
                non_empty(
                    s.iter()
                        .filter(|v| lengths.admits_length(v.encode_utf16().count()))
                        .cloned()
                        .collect(),
                    ValueSet::StringVal,
                )
            }
            _ => self.meet(other),
        }
    }

    /// True iff every value of `self` is a value of `sup`.
    pub fn is_subtype_of(&self, sup: &ValueSet) -> bool {
        match (self, sup) {
            (ValueSet::Bottom, _) | (_, ValueSet::Unknown) => true,
            (ValueSet::Unknown, _) | (_, ValueSet::Bottom) => false,
            (ValueSet::IntVal(a), ValueSet::IntVal(b)) => a.is_subset(b),
            (ValueSet::DoubleVal(a), ValueSet::DoubleVal(b)) => a.is_subset(b),
            (ValueSet::StringVal(a), ValueSet::StringVal(b)) => a.is_subset(b),
            (ValueSet::BoolVal(a), ValueSet::BoolVal(b)) => a.is_subset(b),
            (ValueSet::ArrayLen(a), ValueSet::ArrayLen(b)) => a.is_subset(b),
            (ValueSet::ArrayLen(a), range @ ValueSet::ArrayLenRange(_)) => {
                a.iter().all(|&n| range.admits_length(n))
            }
            (ValueSet::ArrayLenRange(a), ValueSet::ArrayLenRange(b)) => b.contains_range(*a),
            (ValueSet::ArrayLenRange(a), ValueSet::ArrayLen(b)) => {
                !a.is_wider_than(b.len() as u64)
                    && (a.from()..=a.to()).all(|n| b.contains(&(n as usize)))
            }
            (ValueSet::StringVal(s), lengths) if lengths.is_length() => {
                s.iter().all(|v| lengths.admits_length(v.encode_utf16().count()))
            }
            (ValueSet::IntVal(ints), ValueSet::DoubleVal(doubles)) => ints
                .iter()
                .all(|&v| exact_double(v).is_some_and(|d| doubles.contains(&F64Key(d)))),
            _ => false,
        }
    }

    // ── casts ──

    /// Convert every value as a cast to `kind` would.
    pub fn cast_to(&self, kind: &ValueKind, config: &AnalysisConfig) -> ValueSet {
        match self {
            ValueSet::IntVal(values) => convert_int_val(values, kind, config),
            ValueSet::DoubleVal(values) => convert_double_val(values, kind, config),
            ValueSet::StringVal(values) => convert_string_val(values, kind),
            ValueSet::BoolVal(values) => convert_bool_val(values, kind, config),
            ValueSet::Bottom => convert_bottom_val(kind),
            ValueSet::ArrayLen(_) | ValueSet::ArrayLenRange(_)
                if matches!(kind, ValueKind::Array | ValueKind::String) =>
            {
                self.clone()
            }
            _ => ValueSet::Unknown,
        }
    }
}

/// `StringVal` under the cap, the set of string lengths beyond it.
fn strings_or_lengths(values: BTreeSet<String>, config: &AnalysisConfig) -> ValueSet {
    if values.len() > config.max_values {
        return ValueSet::array_lengths(values.iter().map(|v| v.encode_utf16().count()), config);
    }
    non_empty(values, ValueSet::StringVal)
}

fn length_to_i64(length: usize) -> i64 {
    i64::try_from(length).unwrap_or(i64::MAX)
}

fn non_empty<T: Ord>(values: BTreeSet<T>, wrap: fn(BTreeSet<T>) -> ValueSet) -> ValueSet {
    if values.is_empty() {
        ValueSet::Bottom
    } else {
        wrap(values)
    }
}

/// The double equal to `value`, if one exists.
fn exact_double(value: i64) -> Option<f64> {
    let d = value as f64;
    (d as i128 == value as i128).then_some(d)
}

/// Integral values under a cast. Narrowing truncates to the target width.
pub fn convert_int_val(
    values: &BTreeSet<i64>,
    kind: &ValueKind,
    config: &AnalysisConfig,
) -> ValueSet {
    match kind {
        ValueKind::String => ValueSet::string_values(values.iter().map(|v| v.to_string()), config),
        _ => match kind.primitive() {
            Some(p) if p.is_integral() => {
                ValueSet::int_values(values.iter().map(|&v| p.wrap(v)), config)
            }
            Some(PrimitiveKind::Float) => {
                ValueSet::double_values(values.iter().map(|&v| v as f32 as f64), config)
            }
            Some(PrimitiveKind::Double) => {
                ValueSet::double_values(values.iter().map(|&v| v as f64), config)
            }
            _ => ValueSet::Unknown,
        },
    }
}

/// Floating values under a cast. Conversion to integral kinds saturates at
/// the `int`/`long` bounds (NaN becomes 0) and then truncates to narrower widths.
pub fn convert_double_val(
    values: &BTreeSet<F64Key>,
    kind: &ValueKind,
    config: &AnalysisConfig,
) -> ValueSet {
    match kind {
        ValueKind::String => ValueSet::string_values(
            values.iter().map(|v| canonical_double_string(v.0)),
            config,
        ),
        _ => match kind.primitive() {
            Some(PrimitiveKind::Long) => {
                ValueSet::int_values(values.iter().map(|v| v.0 as i64), config)
            }
            Some(p) if p.is_integral() => {
                ValueSet::int_values(values.iter().map(|v| p.wrap(v.0 as i32 as i64)), config)
            }
            Some(PrimitiveKind::Float) => {
                ValueSet::double_values(values.iter().map(|v| v.0 as f32 as f64), config)
            }
            Some(PrimitiveKind::Double) => ValueSet::DoubleVal(values.clone()),
            _ => ValueSet::Unknown,
        },
    }
}

/// String values under a cast: only a cast to a string kind keeps them.
pub fn convert_string_val(values: &BTreeSet<String>, kind: &ValueKind) -> ValueSet {
    if kind.is_string() {
        ValueSet::StringVal(values.clone())
    } else {
        ValueSet::Unknown
    }
}

/// Boolean values under a cast: kept for booleans, stringified for strings.
pub fn convert_bool_val(
    values: &BTreeSet<bool>,
    kind: &ValueKind,
    config: &AnalysisConfig,
) -> ValueSet {
    if kind.is_boolean() {
        ValueSet::BoolVal(values.clone())
    } else if kind.is_string() {
        ValueSet::string_values(values.iter().map(|b| b.to_string()), config)
    } else {
        ValueSet::Unknown
    }
}

/// `Bottom` stays `Bottom` under every cast.
pub fn convert_bottom_val(_kind: &ValueKind) -> ValueSet {
    ValueSet::Bottom
}

impl fmt::Display for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T: fmt::Display>(
            f: &mut fmt::Formatter<'_>,
            name: &str,
            items: impl Iterator<Item = T>,
        ) -> fmt::Result {
            let parts: Vec<String> = items.map(|v| v.to_string()).collect();
            write!(f, "{}({})", name, parts.join(", "))
        }
        match self {
            ValueSet::Bottom => write!(f, "Bottom"),
            ValueSet::Unknown => write!(f, "Unknown"),
            ValueSet::IntVal(s) => list(f, "IntVal", s.iter()),
            ValueSet::DoubleVal(s) => list(f, "DoubleVal", s.iter().map(|v| v.0)),
            ValueSet::StringVal(s) => list(f, "StringVal", s.iter().map(|v| format!("{:?}", v))),
            ValueSet::BoolVal(s) => list(f, "BoolVal", s.iter()),
            ValueSet::ArrayLen(s) => list(f, "ArrayLen", s.iter()),
            ValueSet::ArrayLenRange(range) => write!(f, "ArrayLenRange{}", range),
        }
    }
}
