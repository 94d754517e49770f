//! Facts attached to expression nodes.
//!
//! A node carries at most one value-set fact and at most one range fact. Both
//! travel together in a [`Fact`] so that they stay consistent: whenever the
//! value set is an `IntVal`, the range contains every one of its values.

use crate::config::AnalysisConfig;
use crate::kind::ValueKind;
use crate::lattice::range::Range;
use crate::lattice::value_set::ValueSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The abstract value of one expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub value: ValueSet,
    pub range: Option<Range>,
}

impl Fact {
    /// No information, and no range either.
    pub fn unknown() -> Fact {
        Fact {
            value: ValueSet::Unknown,
            range: None,
        }
    }

    /// Unreachable.
    pub fn bottom() -> Fact {
        Fact {
            value: ValueSet::Bottom,
            range: Some(Range::NOTHING),
        }
    }

    /// No information beyond the static kind: integral kinds keep their width.
    pub fn top(kind: &ValueKind) -> Fact {
        Fact {
            value: ValueSet::Unknown,
            range: integral_bounds(kind),
        }
    }

    /// A value-set fact, with the range derived from integral values.
    pub fn from_value(value: ValueSet) -> Fact {
        let range = value.to_range();
        Fact { value, range }
    }

    /// A range fact. Ranges no wider than the cap are also enumerated.
    pub fn from_range(range: Range, config: &AnalysisConfig) -> Fact {
        Fact {
            value: ValueSet::from_range(range, config),
            range: Some(range),
        }
    }

    pub fn is_bottom(&self) -> bool {
        self.value.is_bottom() || self.range.is_some_and(Range::is_nothing)
    }

    /// The range to use for arithmetic on an expression of `kind`.
    pub fn range_for(&self, kind: &ValueKind) -> Range {
        if self.value.is_bottom() {
            return Range::NOTHING;
        }
        self.range
            .or_else(|| integral_bounds(kind))
            .unwrap_or(Range::EVERYTHING)
    }

    /// Least upper bound of both components.
    pub fn join(&self, other: &Fact, config: &AnalysisConfig) -> Fact {
        let value = self.value.join(&other.value, config);
        let range = match (self.range, other.range) {
            (Some(a), Some(b)) => Some(a.union(b)),
            _ => None,
        };
        Fact { value, range }
    }

    /// Widen `self` (the newer fact) against the previous loop iteration.
    pub fn widen(&self, previous: &Fact, config: &AnalysisConfig) -> Fact {
        let joined = previous.join(self, config);
        let range = match (joined.range, previous.range) {
            (Some(now), Some(before)) => Some(now.widened_upper_bound(before)),
            (now, _) => now,
        };
        // Growing lengths jump the same bounds as integer ranges.
        let value = match (&joined.value, previous.value.length_range()) {
            (ValueSet::ArrayLenRange(now), Some(before)) => {
                ValueSet::array_length_range(now.widened_upper_bound(before), config)
            }
            (value, _) => value.clone(),
        };
        Fact { value, range }
    }

    /// Restrict to the values inside `range`.
    pub fn refine_range(&self, range: Range, config: &AnalysisConfig) -> Fact {
        let range = match self.range {
            Some(own) => own.intersect(range),
            None => range,
        };
        if range.is_nothing() {
            return Fact::bottom();
        }
        let value = match &self.value {
            ValueSet::IntVal(values) => {
                ValueSet::int_values(values.iter().copied().filter(|v| range.contains(*v)), config)
            }
            ValueSet::Unknown => ValueSet::from_range(range, config),
            other => other.clone(),
        };
        if value.is_bottom() {
            return Fact::bottom();
        }
        let range = match value.to_range() {
            Some(exact) => exact,
            None => range,
        };
        Fact {
            value,
            range: Some(range),
        }
    }

    /// Restrict the value set to values shared with `other`.
    pub fn refine_value(&self, other: &ValueSet) -> Fact {
        if other.is_unknown() {
            return self.clone();
        }
        let value = self.value.intersect(other);
        if value.is_bottom() {
            return Fact::bottom();
        }
        let range = match (value.to_range(), self.range) {
            (Some(exact), _) => Some(exact),
            (None, own) => own,
        };
        Fact { value, range }
    }

    /// True iff both components of `self` are below those of `sup`.
    pub fn is_subtype_of(&self, sup: &Fact) -> bool {
        let range_ok = match (self.range, sup.range) {
            (_, None) => true,
            (Some(a), Some(b)) => b.contains_range(a),
            (None, Some(b)) => b.is_everything() || self.value.is_bottom(),
        };
        self.value.is_subtype_of(&sup.value) && range_ok
    }
}

fn integral_bounds(kind: &ValueKind) -> Option<Range> {
    kind.primitive()
        .filter(|p| p.is_integral())
        .map(Range::for_kind)
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range {
            Some(range) if !matches!(self.value, ValueSet::IntVal(_)) => {
                write!(f, "{} IntRange{}", self.value, range)
            }
            _ => write!(f, "{}", self.value),
        }
    }
}
