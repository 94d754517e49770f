//! Variable environment for the forward analysis.
//!
//! A [`FactEnv`] maps local variables to the [`Fact`] known about them at one
//! program point. Environments are split at conditions, merged where control
//! flow converges, and widened at loop heads.

use crate::config::AnalysisConfig;
use crate::lattice::Fact;
use std::collections::BTreeMap;

/// Facts about local variables at one program point.
///
/// An unreachable environment (a branch whose condition can never hold) is
/// the identity for [`merge`](FactEnv::merge), so dead branches do not dilute
/// the facts of live ones.
///
/// # Example
/// ```
/// use value_lattice::abstract_interp::FactEnv;
/// use value_lattice::config::AnalysisConfig;
/// use value_lattice::lattice::{Fact, ValueSet};
///
/// let config = AnalysisConfig::default();
/// let mut env = FactEnv::new();
/// env.set("x", Fact::from_value(ValueSet::int_values([1], &config)));
///
/// let changed = env.update("x", Fact::from_value(ValueSet::int_values([2], &config)), &config);
/// assert!(changed);
/// assert_eq!(env.get("x").unwrap().to_string(), "IntVal(1, 2)");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FactEnv {
    bindings: BTreeMap<String, Fact>,
    unreachable: bool,
}

impl FactEnv {
    /// Creates a new, empty, reachable environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment no execution reaches.
    pub fn unreachable() -> Self {
        Self {
            bindings: BTreeMap::new(),
            unreachable: true,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        self.unreachable
    }

    /// Marks this program point as dead and drops its bindings.
    pub fn mark_unreachable(&mut self) {
        self.bindings.clear();
        self.unreachable = true;
    }

    pub fn get(&self, name: &str) -> Option<&Fact> {
        self.bindings.get(name)
    }

    /// Replaces the fact of a variable.
    pub fn set(&mut self, name: &str, fact: Fact) {
        if self.unreachable {
            return;
        }
        self.bindings.insert(name.to_string(), fact);
    }

    /// Joins `fact` into the binding of `name`.
    ///
    /// Returns `true` if the binding changed.
    pub fn update(&mut self, name: &str, fact: Fact, config: &AnalysisConfig) -> bool {
        if self.unreachable {
            return false;
        }
        match self.bindings.get(name) {
            Some(existing) => {
                let joined = existing.join(&fact, config);
                if &joined != existing {
                    self.bindings.insert(name.to_string(), joined);
                    true
                } else {
                    false
                }
            }
            None => {
                self.bindings.insert(name.to_string(), fact);
                true
            }
        }
    }

    /// Merges another environment into this one using join.
    ///
    /// Variables bound in only one of the environments keep that binding.
    pub fn merge(&mut self, other: &FactEnv, config: &AnalysisConfig) {
        self.merge_changed(other, config);
    }

    /// Merges `other` into `self` and returns `true` if `self` changed.
    pub fn merge_changed(&mut self, other: &FactEnv, config: &AnalysisConfig) -> bool {
        if other.unreachable {
            return false;
        }
        if self.unreachable {
            *self = other.clone();
            return true;
        }
        let mut changed = false;
        for (name, fact) in &other.bindings {
            changed |= self.update(name, fact.clone(), config);
        }
        changed
    }

    /// Widens every binding of `self` against the same binding in `previous`.
    pub fn widen_from(&mut self, previous: &FactEnv, config: &AnalysisConfig) {
        if self.unreachable || previous.unreachable {
            return;
        }
        for (name, fact) in self.bindings.iter_mut() {
            if let Some(before) = previous.bindings.get(name) {
                *fact = fact.widen(before, config);
            }
        }
    }

    /// Names whose binding differs between `self` and `other`.
    pub fn changed_names(&self, other: &FactEnv) -> Vec<String> {
        self.bindings
            .iter()
            .filter(|(name, fact)| other.bindings.get(*name) != Some(*fact))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// True iff every binding of `self` is below the same binding in `other`.
    pub fn is_subsumed_by(&self, other: &FactEnv) -> bool {
        if self.unreachable {
            return true;
        }
        if other.unreachable {
            return false;
        }
        self.bindings.iter().all(|(name, fact)| {
            other
                .bindings
                .get(name)
                .is_some_and(|sup| fact.is_subtype_of(sup))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fact)> {
        self.bindings.iter().map(|(name, fact)| (name.as_str(), fact))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{Range, ValueSet};

    fn cfg() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    fn ints(values: &[i64]) -> Fact {
        Fact::from_value(ValueSet::int_values(values.iter().copied(), &cfg()))
    }

    // ── update ──

    #[test]
    fn test_update_reports_change() {
        let mut env = FactEnv::new();
        assert!(env.update("x", ints(&[1]), &cfg()));
        assert!(!env.update("x", ints(&[1]), &cfg()));
        assert!(env.update("x", ints(&[2]), &cfg()));
        assert_eq!(env.get("x"), Some(&ints(&[1, 2])));
    }

    // ── merge ──

    #[test]
    fn test_merge_joins_shared_and_keeps_unique() {
        let mut a = FactEnv::new();
        a.set("x", ints(&[1]));
        a.set("only_a", ints(&[7]));
        let mut b = FactEnv::new();
        b.set("x", ints(&[3]));
        b.set("only_b", ints(&[9]));

        a.merge(&b, &cfg());
        assert_eq!(a.get("x"), Some(&ints(&[1, 3])));
        assert_eq!(a.get("only_a"), Some(&ints(&[7])));
        assert_eq!(a.get("only_b"), Some(&ints(&[9])));
    }

    #[test]
    fn test_unreachable_is_merge_identity() {
        let mut live = FactEnv::new();
        live.set("x", ints(&[4]));

        let mut merged = live.clone();
        assert!(!merged.merge_changed(&FactEnv::unreachable(), &cfg()));
        assert_eq!(merged, live);

        let mut dead = FactEnv::unreachable();
        assert!(dead.merge_changed(&live, &cfg()));
        assert_eq!(dead, live);
    }

    #[test]
    fn test_set_ignored_when_unreachable() {
        let mut env = FactEnv::new();
        env.set("x", ints(&[1]));
        env.mark_unreachable();
        env.set("y", ints(&[2]));
        assert!(env.is_empty());
        assert!(env.is_unreachable());
    }

    // ── widening ──

    #[test]
    fn test_widen_pushes_growing_bound() {
        let before = Fact::from_range(Range::new(0, 100).unwrap(), &cfg());
        let after = Fact::from_range(Range::new(0, 101).unwrap(), &cfg());
        let mut previous = FactEnv::new();
        previous.set("i", before);
        let mut env = FactEnv::new();
        env.set("i", after);

        env.widen_from(&previous, &cfg());
        let widened = env.get("i").and_then(|f| f.range).unwrap();
        assert_eq!(widened.from(), 0);
        assert!(widened.to() > 101);
    }

    #[test]
    fn test_changed_names() {
        let mut a = FactEnv::new();
        a.set("x", ints(&[1]));
        a.set("y", ints(&[2]));
        let mut b = a.clone();
        b.set("y", ints(&[3]));
        assert_eq!(a.changed_names(&b), vec!["y".to_string()]);
        assert!(a.is_subsumed_by(&a.clone()));
    }
}
