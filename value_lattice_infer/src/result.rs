//! Solutions produced by the solver passes.

use crate::types::{AnnotatedType, Qualifier, TargetId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// What a target was resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InferredValue {
    /// A concrete type.
    Type(AnnotatedType),
    /// Another target, plus the qualifiers this target carries in the
    /// hierarchies where the two are not equal.
    Target {
        target: TargetId,
        primaries: Vec<Qualifier>,
    },
}

impl InferredValue {
    pub fn as_type(&self) -> Option<&AnnotatedType> {
        match self {
            InferredValue::Type(ty) => Some(ty),
            InferredValue::Target { .. } => None,
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self, InferredValue::Type(_))
    }
}

impl fmt::Display for InferredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferredValue::Type(ty) => write!(f, "InferredType({})", ty),
            InferredValue::Target { target, .. } => write!(f, "InferredTarget({})", target),
        }
    }
}

fn apply_primaries(mut ty: AnnotatedType, primaries: &[Qualifier]) -> AnnotatedType {
    for qualifier in primaries {
        ty.replace_qualifier(qualifier.clone());
    }
    ty
}

/// Map from targets to what they were resolved to.
///
/// # Example
/// ```
/// use value_lattice_infer::result::{InferenceResult, InferredValue};
/// use value_lattice_infer::types::{AnnotatedType, TargetId};
///
/// let (t, u) = (TargetId::new("T"), TargetId::new("U"));
/// let mut result = InferenceResult::new();
/// result.insert(t.clone(), InferredValue::Target { target: u.clone(), primaries: vec![] });
/// result.insert(u.clone(), InferredValue::Type(AnnotatedType::class("String")));
/// assert!(!result.is_complete(&[t.clone(), u.clone()]));
///
/// result.resolve_chained_targets();
/// assert!(result.is_complete(&[t, u]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    values: BTreeMap<TargetId, InferredValue>,
}

impl InferenceResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: &TargetId) -> Option<&InferredValue> {
        self.values.get(target)
    }

    pub fn insert(&mut self, target: TargetId, value: InferredValue) {
        self.values.insert(target, value);
    }

    pub fn contains(&self, target: &TargetId) -> bool {
        self.values.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TargetId, &InferredValue)> {
        self.values.iter()
    }

    /// True if `target` resolved to a concrete type.
    pub fn is_resolved_type(&self, target: &TargetId) -> bool {
        self.values.get(target).is_some_and(InferredValue::is_type)
    }

    /// Number of targets resolved to a concrete type.
    pub fn resolved_count(&self) -> usize {
        self.values.values().filter(|v| v.is_type()).count()
    }

    /// Targets with no resolution; with `types_only`, also the targets that
    /// only resolved to another target.
    pub fn remaining_targets(&self, targets: &[TargetId], types_only: bool) -> Vec<TargetId> {
        targets
            .iter()
            .filter(|t| match self.values.get(*t) {
                None => true,
                Some(InferredValue::Target { .. }) => types_only,
                Some(InferredValue::Type(_)) => false,
            })
            .cloned()
            .collect()
    }

    /// True iff every target resolved to a concrete type.
    pub fn is_complete(&self, targets: &[TargetId]) -> bool {
        targets.iter().all(|t| self.is_resolved_type(t))
    }

    /// Collapses `T -> U -> ... -> type` chains into `T -> type`.
    ///
    /// Qualifiers recorded on a link take precedence over those further down
    /// the chain. Cycles and chains ending at an unresolved target stay as
    /// they are.
    pub fn resolve_chained_targets(&mut self) {
        loop {
            let chained: Vec<TargetId> = self
                .values
                .iter()
                .filter(|(_, v)| !v.is_type())
                .map(|(t, _)| t.clone())
                .collect();
            let mut changed = false;
            for target in chained {
                if let Some(resolved) = self.follow_chain(&target) {
                    self.values.insert(target, InferredValue::Type(resolved));
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn follow_chain(&self, start: &TargetId) -> Option<AnnotatedType> {
        let mut primaries: Vec<Qualifier> = Vec::new();
        let mut seen = BTreeSet::new();
        let mut current = start;
        loop {
            match self.values.get(current)? {
                InferredValue::Type(ty) => return Some(apply_primaries(ty.clone(), &primaries)),
                InferredValue::Target { target, primaries: extra } => {
                    if !seen.insert(current) {
                        return None;
                    }
                    for q in extra {
                        if !primaries.iter().any(|p| p.hierarchy == q.hierarchy) {
                            primaries.push(q.clone());
                        }
                    }
                    current = target;
                }
            }
        }
    }

    /// Merges `subordinate` into `self`, keeping `self`'s values on conflict
    /// except that a concrete type replaces a target-to-target resolution.
    pub fn merge_subordinate(&mut self, subordinate: InferenceResult) {
        let previous: Vec<TargetId> = self.values.keys().cloned().collect();
        for target in &previous {
            let mut seen = BTreeSet::new();
            self.merge_target(target, &subordinate, &mut seen);
        }
        for (target, value) in subordinate.values {
            self.values.entry(target).or_insert(value);
        }
        self.resolve_chained_targets();
    }

    fn merge_target(
        &mut self,
        target: &TargetId,
        subordinate: &InferenceResult,
        seen: &mut BTreeSet<TargetId>,
    ) -> Option<InferredValue> {
        if !seen.insert(target.clone()) {
            return None;
        }
        match self.values.get(target).cloned() {
            Some(value @ InferredValue::Type(_)) => Some(value),
            Some(InferredValue::Target { target: next, primaries }) => {
                match self.merge_target(&next, subordinate, seen) {
                    Some(InferredValue::Type(ty)) => {
                        let value = InferredValue::Type(apply_primaries(ty, &primaries));
                        self.values.insert(target.clone(), value.clone());
                        Some(value)
                    }
                    Some(other) => Some(other),
                    None => self.take_subordinate_type(target, subordinate),
                }
            }
            None => self.take_subordinate_type(target, subordinate),
        }
    }

    fn take_subordinate_type(
        &mut self,
        target: &TargetId,
        subordinate: &InferenceResult,
    ) -> Option<InferredValue> {
        match subordinate.get(target) {
            Some(value @ InferredValue::Type(_)) => {
                self.values.insert(target.clone(), value.clone());
                Some(value.clone())
            }
            _ => None,
        }
    }

    /// The concrete solutions, dropping unresolved chains.
    pub fn to_type_map(&self) -> BTreeMap<TargetId, AnnotatedType> {
        self.values
            .iter()
            .filter_map(|(t, v)| v.as_type().map(|ty| (t.clone(), ty.clone())))
            .collect()
    }

    /// Substitutes concrete solutions into solutions that mention other
    /// targets, e.g. `U = List<T>` with `T = String` becomes `List<String>`.
    ///
    /// Bounded by the number of targets, so mutually recursive solutions
    /// stop unfolding.
    pub fn substitute_solutions(&mut self) {
        for _ in 0..self.values.len() {
            let solved = self.to_type_map();
            let mut changed = false;
            for (owner, value) in self.values.iter_mut() {
                let InferredValue::Type(ty) = value else {
                    continue;
                };
                for (target, solution) in &solved {
                    if target != owner && ty.mentions(target) {
                        *ty = ty.substitute(target, solution);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// Substitutes every concrete solution into `ty`.
    pub fn apply(&self, ty: &AnnotatedType) -> AnnotatedType {
        let mut out = ty.clone();
        for (target, solution) in self.to_type_map() {
            if out.mentions(&target) {
                out = out.substitute(&target, &solution);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hierarchy;
    use pretty_assertions::assert_eq;

    fn t(name: &str) -> TargetId {
        TargetId::new(name)
    }

    fn link(to: &str) -> InferredValue {
        InferredValue::Target {
            target: t(to),
            primaries: Vec::new(),
        }
    }

    fn ty(name: &str) -> InferredValue {
        InferredValue::Type(AnnotatedType::class(name))
    }

    // ── chains ──

    #[test]
    fn test_resolve_long_chain() {
        let mut r = InferenceResult::new();
        r.insert(t("T"), link("U"));
        r.insert(t("U"), link("V"));
        r.insert(t("V"), ty("String"));
        r.resolve_chained_targets();
        assert_eq!(r.get(&t("T")), Some(&ty("String")));
        assert_eq!(r.get(&t("U")), Some(&ty("String")));
        assert!(r.is_complete(&[t("T"), t("U"), t("V")]));
    }

    #[test]
    fn test_cycle_stays_unresolved() {
        let mut r = InferenceResult::new();
        r.insert(t("T"), link("U"));
        r.insert(t("U"), link("T"));
        r.resolve_chained_targets();
        assert_eq!(r.get(&t("T")), Some(&link("U")));
        assert_eq!(r.remaining_targets(&[t("T"), t("U")], true).len(), 2);
        assert!(r.remaining_targets(&[t("T"), t("U")], false).is_empty());
    }

    #[test]
    fn test_chain_primaries_override() {
        let h = Hierarchy::new("Nullable");
        let non_null = Qualifier::new(&h, "NonNull");
        let mut r = InferenceResult::new();
        r.insert(
            t("T"),
            InferredValue::Target {
                target: t("U"),
                primaries: vec![non_null.clone()],
            },
        );
        let nullable_string =
            AnnotatedType::class("String").with_qualifier(Qualifier::new(&h, "Nullable"));
        r.insert(t("U"), InferredValue::Type(nullable_string));
        r.resolve_chained_targets();

        let resolved = r.get(&t("T")).and_then(InferredValue::as_type).unwrap();
        assert_eq!(resolved.qualifier(&h), Some(&non_null));
    }

    // ── merging ──

    #[test]
    fn test_merge_subordinate_keeps_primary_results() {
        let mut primary = InferenceResult::new();
        primary.insert(t("T"), ty("String"));
        let mut sub = InferenceResult::new();
        sub.insert(t("T"), ty("Integer"));
        sub.insert(t("U"), ty("Long"));

        primary.merge_subordinate(sub);
        assert_eq!(primary.get(&t("T")), Some(&ty("String")));
        assert_eq!(primary.get(&t("U")), Some(&ty("Long")));
    }

    #[test]
    fn test_merge_subordinate_type_replaces_link() {
        let mut primary = InferenceResult::new();
        primary.insert(t("T"), link("U"));
        let mut sub = InferenceResult::new();
        sub.insert(t("T"), ty("Integer"));

        primary.merge_subordinate(sub);
        assert_eq!(primary.get(&t("T")), Some(&ty("Integer")));
    }

    #[test]
    fn test_merge_subordinate_resolves_through_link() {
        let mut primary = InferenceResult::new();
        primary.insert(t("T"), link("U"));
        let mut sub = InferenceResult::new();
        sub.insert(t("U"), ty("Integer"));

        primary.merge_subordinate(sub);
        assert_eq!(primary.get(&t("T")), Some(&ty("Integer")));
        assert_eq!(primary.get(&t("U")), Some(&ty("Integer")));
    }

    // ── output ──

    #[test]
    fn test_type_map_and_apply() {
        let mut r = InferenceResult::new();
        r.insert(t("T"), ty("String"));
        r.insert(t("U"), link("V"));
        let map = r.to_type_map();
        assert_eq!(map.len(), 1);

        let list_of_t = AnnotatedType::class_with_args("List", vec![AnnotatedType::var(t("T"))]);
        assert_eq!(r.apply(&list_of_t).to_string(), "List<String>");
        assert_eq!(ty("String").to_string(), "InferredType(String)");
    }

    #[test]
    fn test_substitute_solutions_into_generic() {
        let mut r = InferenceResult::new();
        r.insert(t("T"), ty("String"));
        let list_of_t = AnnotatedType::class_with_args("List", vec![AnnotatedType::var(t("T"))]);
        r.insert(t("U"), InferredValue::Type(list_of_t));
        r.substitute_solutions();
        assert_eq!(r.get(&t("U")).unwrap().to_string(), "InferredType(List<String>)");
    }
}
