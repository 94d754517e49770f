//! Solving targets from their lower bounds.
//!
//! Each remaining target is resolved to the least upper bound of the types
//! it must be a supertype of. A target whose lower bound is another target
//! uses that target's bound, so targets are visited subtypes first.

use crate::constraint_map::{Bounds, ConstraintMap, HierarchySet, TargetConstraints};
use crate::error::InferenceError;
use crate::result::{InferenceResult, InferredValue};
use crate::type_system::TypeSystem;
use crate::types::{AnnotatedType, Hierarchy, Qualifier, TargetId};
use std::collections::BTreeMap;

/// Orders `remaining` so that every target comes after the targets listed in
/// its `bounds` record. Cycles keep their input order.
pub(crate) fn solve_order(
    remaining: &[TargetId],
    map: &ConstraintMap,
    bounds: fn(&TargetConstraints) -> &Bounds,
) -> Result<Vec<TargetId>, InferenceError> {
    let mut depends_on: BTreeMap<TargetId, Vec<TargetId>> = BTreeMap::new();
    for target in remaining {
        let deps = bounds(map.constraints(target)?)
            .targets
            .keys()
            .filter(|d| remaining.contains(d))
            .cloned()
            .collect();
        depends_on.insert(target.clone(), deps);
    }

    let mut pending: Vec<TargetId> = remaining.to_vec();
    let mut order = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let ready = pending
            .iter()
            .position(|t| {
                depends_on
                    .get(t)
                    .into_iter()
                    .flatten()
                    .all(|d| !pending.contains(d))
            })
            .unwrap_or(0);
        order.push(pending.remove(ready));
    }
    Ok(order)
}

/// Gives `ty` the `fill` qualifier in every hierarchy its constraint does
/// not hold in.
pub(crate) fn ground_missing_hierarchies(
    ty: &AnnotatedType,
    present: &HierarchySet,
    fill: &BTreeMap<Hierarchy, Qualifier>,
) -> AnnotatedType {
    let mut out = ty.clone();
    for (hierarchy, qualifier) in fill {
        if !present.contains(hierarchy) {
            out.replace_qualifier(qualifier.clone());
        }
    }
    out
}

/// Adds the bound already computed for each related target to `types`.
pub(crate) fn propagate_previous(
    related: &BTreeMap<TargetId, HierarchySet>,
    solved: &BTreeMap<TargetId, AnnotatedType>,
    types: &mut BTreeMap<AnnotatedType, HierarchySet>,
) {
    for (other, hierarchies) in related {
        if let Some(bound) = solved.get(other) {
            types
                .entry(bound.clone())
                .or_default()
                .extend(hierarchies.iter().cloned());
        }
    }
}

/// Folds `next` into `acc` with `combine`, boxing a primitive when the other
/// side is a reference type.
pub(crate) fn combine_boxed(
    types: &dyn TypeSystem,
    mut acc: AnnotatedType,
    mut next: AnnotatedType,
    combine: impl Fn(&AnnotatedType, &AnnotatedType) -> AnnotatedType,
) -> AnnotatedType {
    if acc.base.is_primitive() && !next.base.is_primitive() {
        acc.base = types.boxed(&acc.base);
    } else if next.base.is_primitive() && !acc.base.is_primitive() {
        next.base = types.boxed(&next.base);
    }
    combine(&acc, &next)
}

/// Merges a computed bound with a target's partial equality type: the
/// equality type wins in the hierarchies it covers, the bound's qualifiers
/// fill the rest.
pub(crate) fn merge_bound_with_equalities(
    record: &TargetConstraints,
    bound: &AnnotatedType,
    tops: &[Hierarchy],
) -> AnnotatedType {
    if let Some((equality_type, covered)) = record.equalities.types.iter().next() {
        let mut merged = equality_type.clone();
        let mut failed = false;
        for top in tops {
            if covered.contains(top) {
                continue;
            }
            match bound.qualifier(top) {
                Some(qualifier) => merged.replace_qualifier(qualifier.clone()),
                None => {
                    if !(bound.base.is_var() && equality_type.has_same_base(bound)) {
                        failed = true;
                    }
                }
            }
        }
        if !failed {
            return merged;
        }
    }
    bound.clone()
}

/// Like [`merge_bound_with_equalities`], for a target whose only bounds are
/// qualifiers. Without an equality type there is nothing to resolve to.
pub(crate) fn merge_qualifiers_with_equalities(
    record: &TargetConstraints,
    qualifiers: &BTreeMap<Hierarchy, Qualifier>,
    tops: &[Hierarchy],
) -> Option<AnnotatedType> {
    let (equality_type, covered) = record.equalities.types.iter().next()?;
    let mut merged = equality_type.clone();
    for top in tops {
        if covered.contains(top) {
            continue;
        }
        merged.replace_qualifier(qualifiers.get(top)?.clone());
    }
    Some(merged)
}

#[derive(Debug, Default)]
struct Lubs {
    types: BTreeMap<TargetId, AnnotatedType>,
    primaries: BTreeMap<TargetId, BTreeMap<Hierarchy, Qualifier>>,
}

/// The supertypes pass.
#[derive(Debug)]
pub struct SupertypesSolver<'a> {
    types: &'a dyn TypeSystem,
}

impl<'a> SupertypesSolver<'a> {
    pub fn new(types: &'a dyn TypeSystem) -> Self {
        Self { types }
    }

    /// Resolves each of `remaining` to the least upper bound of its lower
    /// bounds. Targets without lower bounds or equalities are left out.
    pub fn solve(
        &self,
        remaining: &[TargetId],
        map: &ConstraintMap,
    ) -> Result<InferenceResult, InferenceError> {
        let tops = self.types.hierarchies();
        let lubs = self.target_to_type_lubs(remaining, map, &tops)?;

        let mut solution = InferenceResult::new();
        for target in remaining {
            let record = map.constraints(target)?;
            let inferred = if let Some(lub) = lubs.types.get(target) {
                Some(merge_bound_with_equalities(record, lub, &tops))
            } else if let Some(qualifiers) = lubs.primaries.get(target) {
                merge_qualifiers_with_equalities(record, qualifiers, &tops)
            } else {
                None
            };
            if let Some(ty) = inferred {
                solution.insert(target.clone(), InferredValue::Type(ty));
            }
        }
        Ok(solution)
    }

    fn target_to_type_lubs(
        &self,
        remaining: &[TargetId],
        map: &ConstraintMap,
        tops: &[Hierarchy],
    ) -> Result<Lubs, InferenceError> {
        let mut lubs = Lubs::default();
        for target in solve_order(remaining, map, |r| &r.supertypes)? {
            let record = map.constraints(&target)?;
            let mut lower_bounds = record.supertypes.types.clone();
            propagate_previous(&record.supertypes.targets, &lubs.types, &mut lower_bounds);

            let primary_lubs = self.lub_primaries(&record.supertypes, tops);

            if !lower_bounds.is_empty() {
                let mut lub = self.least_upper_bound(&lower_bounds, tops)?;
                // Raise the lub to the lub of the primary lower bounds.
                for top in tops {
                    let (Some(lub_qualifier), Some(primary)) =
                        (lub.qualifier(top).cloned(), primary_lubs.get(top))
                    else {
                        continue;
                    };
                    if self.types.is_subtype_qualifier(&lub_qualifier, primary)
                        && &lub_qualifier != primary
                    {
                        lub.replace_qualifier(primary.clone());
                    }
                }
                lubs.types.insert(target.clone(), lub);
            }
            lubs.primaries.insert(target, primary_lubs);
        }
        Ok(lubs)
    }

    /// Per hierarchy, the lub of the primary lower bounds, or bottom.
    fn lub_primaries(&self, bounds: &Bounds, tops: &[Hierarchy]) -> BTreeMap<Hierarchy, Qualifier> {
        tops.iter()
            .map(|top| {
                let lub = bounds
                    .primaries
                    .get(top)
                    .and_then(|qualifiers| {
                        let mut iter = qualifiers.iter();
                        let first = iter.next()?.clone();
                        Some(iter.fold(first, |acc, q| self.types.lub_qualifier(&acc, q)))
                    })
                    .unwrap_or_else(|| self.types.bottom(top));
                (top.clone(), lub)
            })
            .collect()
    }

    fn least_upper_bound(
        &self,
        lower_bounds: &BTreeMap<AnnotatedType, HierarchySet>,
        tops: &[Hierarchy],
    ) -> Result<AnnotatedType, InferenceError> {
        let bottoms: BTreeMap<Hierarchy, Qualifier> = tops
            .iter()
            .map(|top| (top.clone(), self.types.bottom(top)))
            .collect();

        let mut iter = lower_bounds.iter();
        let Some((head, present)) = iter.next() else {
            return Err(InferenceError::internal("least upper bound of an empty list"));
        };
        let mut lub = ground_missing_hierarchies(head, present, &bottoms);
        for (next, present) in iter {
            let next = ground_missing_hierarchies(next, present, &bottoms);
            lub = combine_boxed(self.types, lub, next, |a, b| self.types.lub(a, b));
        }
        Ok(lub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_system::SimpleTypeSystem;
    use pretty_assertions::assert_eq;

    fn t(name: &str) -> TargetId {
        TargetId::new(name)
    }

    fn setup() -> (SimpleTypeSystem, Hierarchy, HierarchySet) {
        let mut ts = SimpleTypeSystem::new();
        let h = ts.add_hierarchy("Nullable", "NonNull");
        let all: HierarchySet = [h.clone()].into_iter().collect();
        (ts, h, all)
    }

    fn qualified(name: &str, h: &Hierarchy, q: &str) -> AnnotatedType {
        AnnotatedType::class(name).with_qualifier(Qualifier::new(h, q))
    }

    // ── lub of lower bounds ──

    #[test]
    fn test_lub_of_two_lower_bounds() {
        let (ts, h, all) = setup();
        let targets = [t("T")];
        let mut map = ConstraintMap::new(targets.clone());
        map.add_type_supertype(&t("T"), qualified("Integer", &h, "NonNull"), &all)
            .unwrap();
        map.add_type_supertype(&t("T"), qualified("Long", &h, "Nullable"), &all)
            .unwrap();

        let solution = SupertypesSolver::new(&ts).solve(&targets, &map).unwrap();
        assert_eq!(
            solution.get(&t("T")),
            Some(&InferredValue::Type(qualified("Number", &h, "Nullable")))
        );
    }

    #[test]
    fn test_primitive_lower_bound_is_boxed() {
        let (ts, h, all) = setup();
        let targets = [t("T")];
        let mut map = ConstraintMap::new(targets.clone());
        let int = AnnotatedType::primitive("int").with_qualifier(Qualifier::new(&h, "NonNull"));
        map.add_type_supertype(&t("T"), int, &all).unwrap();
        map.add_type_supertype(&t("T"), qualified("Integer", &h, "NonNull"), &all)
            .unwrap();

        let solution = SupertypesSolver::new(&ts).solve(&targets, &map).unwrap();
        assert_eq!(
            solution.get(&t("T")),
            Some(&InferredValue::Type(qualified("Integer", &h, "NonNull")))
        );
    }

    #[test]
    fn test_primary_lower_bound_raises_lub() {
        let (ts, h, all) = setup();
        let targets = [t("T")];
        let mut map = ConstraintMap::new(targets.clone());
        map.add_type_supertype(&t("T"), qualified("String", &h, "NonNull"), &all)
            .unwrap();
        map.add_primary_supertype(&t("T"), Qualifier::new(&h, "Nullable"))
            .unwrap();

        let solution = SupertypesSolver::new(&ts).solve(&targets, &map).unwrap();
        assert_eq!(
            solution.get(&t("T")),
            Some(&InferredValue::Type(qualified("String", &h, "Nullable")))
        );
    }

    // ── ordering ──

    #[test]
    fn test_lower_bound_target_solved_first() {
        let (ts, h, all) = setup();
        // U is listed first but depends on T's lub.
        let targets = [t("U"), t("T")];
        let mut map = ConstraintMap::new(targets.clone());
        map.add_target_supertype(&t("U"), &t("T"), &all).unwrap();
        map.add_type_supertype(&t("T"), qualified("Integer", &h, "NonNull"), &all)
            .unwrap();
        map.add_type_supertype(&t("U"), qualified("Long", &h, "NonNull"), &all)
            .unwrap();

        let order = solve_order(&targets, &map, |r| &r.supertypes).unwrap();
        assert_eq!(order, vec![t("T"), t("U")]);

        let solution = SupertypesSolver::new(&ts).solve(&targets, &map).unwrap();
        assert_eq!(
            solution.get(&t("U")),
            Some(&InferredValue::Type(qualified("Number", &h, "NonNull")))
        );
    }

    #[test]
    fn test_no_bounds_no_solution() {
        let (ts, _, _) = setup();
        let targets = [t("T")];
        let map = ConstraintMap::new(targets.clone());
        let solution = SupertypesSolver::new(&ts).solve(&targets, &map).unwrap();
        assert!(solution.is_empty());
    }
}
