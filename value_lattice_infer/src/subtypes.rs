//! Solving targets from their upper bounds.
//!
//! The mirror image of the supertypes pass: each remaining target is
//! resolved to the greatest lower bound of the types it must be a subtype
//! of, visiting the targets it is bounded by first.

use crate::constraint_map::{Bounds, ConstraintMap, HierarchySet};
use crate::error::InferenceError;
use crate::result::{InferenceResult, InferredValue};
use crate::supertypes::{
    combine_boxed, ground_missing_hierarchies, merge_bound_with_equalities,
    merge_qualifiers_with_equalities, propagate_previous, solve_order,
};
use crate::type_system::TypeSystem;
use crate::types::{AnnotatedType, Hierarchy, Qualifier, TargetId};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct Glbs {
    types: BTreeMap<TargetId, AnnotatedType>,
    primaries: BTreeMap<TargetId, BTreeMap<Hierarchy, Qualifier>>,
}

/// The subtypes pass.
#[derive(Debug)]
pub struct SubtypesSolver<'a> {
    types: &'a dyn TypeSystem,
}

impl<'a> SubtypesSolver<'a> {
    pub fn new(types: &'a dyn TypeSystem) -> Self {
        Self { types }
    }

    /// Resolves each of `remaining` to the greatest lower bound of its upper
    /// bounds. Targets without upper bounds or equalities are left out.
    pub fn solve(
        &self,
        remaining: &[TargetId],
        map: &ConstraintMap,
    ) -> Result<InferenceResult, InferenceError> {
        let tops = self.types.hierarchies();
        let glbs = self.target_to_type_glbs(remaining, map, &tops)?;

        let mut solution = InferenceResult::new();
        for target in remaining {
            let record = map.constraints(target)?;
            let inferred = if let Some(glb) = glbs.types.get(target) {
                Some(merge_bound_with_equalities(record, glb, &tops))
            } else if let Some(qualifiers) = glbs.primaries.get(target) {
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

    fn target_to_type_glbs(
        &self,
        remaining: &[TargetId],
        map: &ConstraintMap,
        tops: &[Hierarchy],
    ) -> Result<Glbs, InferenceError> {
        let mut glbs = Glbs::default();
        for target in solve_order(remaining, map, |r| &r.subtypes)? {
            let record = map.constraints(&target)?;
            let mut upper_bounds = record.subtypes.types.clone();
            propagate_previous(&record.subtypes.targets, &glbs.types, &mut upper_bounds);

            let primary_glbs = self.glb_primaries(&record.subtypes, tops);

            if !upper_bounds.is_empty() {
                let mut glb = self.greatest_lower_bound(&upper_bounds, tops)?;
                // Lower the glb to the glb of the primary upper bounds.
                for top in tops {
                    let (Some(glb_qualifier), Some(primary)) =
                        (glb.qualifier(top).cloned(), primary_glbs.get(top))
                    else {
                        continue;
                    };
                    if self.types.is_subtype_qualifier(primary, &glb_qualifier)
                        && &glb_qualifier != primary
                    {
                        glb.replace_qualifier(primary.clone());
                    }
                }
                glbs.types.insert(target.clone(), glb);
            }
            glbs.primaries.insert(target, primary_glbs);
        }
        Ok(glbs)
    }

    /// Per hierarchy, the glb of the primary upper bounds, or top.
    fn glb_primaries(&self, bounds: &Bounds, tops: &[Hierarchy]) -> BTreeMap<Hierarchy, Qualifier> {
        tops.iter()
            .map(|top| {
                let glb = bounds
                    .primaries
                    .get(top)
                    .and_then(|qualifiers| {
                        let mut iter = qualifiers.iter();
                        let first = iter.next()?.clone();
                        Some(iter.fold(first, |acc, q| self.types.glb_qualifier(&acc, q)))
                    })
                    .unwrap_or_else(|| self.types.top(top));
                (top.clone(), glb)
            })
            .collect()
    }

    fn greatest_lower_bound(
        &self,
        upper_bounds: &BTreeMap<AnnotatedType, HierarchySet>,
        tops: &[Hierarchy],
    ) -> Result<AnnotatedType, InferenceError> {
        let top_qualifiers: BTreeMap<Hierarchy, Qualifier> = tops
            .iter()
            .map(|top| (top.clone(), self.types.top(top)))
            .collect();

        let mut iter = upper_bounds.iter();
        let Some((head, present)) = iter.next() else {
            return Err(InferenceError::internal(
                "greatest lower bound of an empty list",
            ));
        };
        let mut glb = ground_missing_hierarchies(head, present, &top_qualifiers);
        for (next, present) in iter {
            let next = ground_missing_hierarchies(next, present, &top_qualifiers);
            glb = combine_boxed(self.types, glb, next, |a, b| self.types.glb(a, b));
        }
        Ok(glb)
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
        ts.add_class("Animal", "Object");
        ts.add_class("Dog", "Animal");
        let h = ts.add_hierarchy("Nullable", "NonNull");
        let all: HierarchySet = [h.clone()].into_iter().collect();
        (ts, h, all)
    }

    fn qualified(name: &str, h: &Hierarchy, q: &str) -> AnnotatedType {
        AnnotatedType::class(name).with_qualifier(Qualifier::new(h, q))
    }

    // ── glb of upper bounds ──

    #[test]
    fn test_glb_of_two_upper_bounds() {
        let (ts, h, all) = setup();
        let targets = [t("T")];
        let mut map = ConstraintMap::new(targets.clone());
        map.add_type_subtype(&t("T"), qualified("Animal", &h, "NonNull"), &all)
            .unwrap();
        map.add_type_subtype(&t("T"), qualified("Dog", &h, "Nullable"), &all)
            .unwrap();

        let solution = SubtypesSolver::new(&ts).solve(&targets, &map).unwrap();
        assert_eq!(
            solution.get(&t("T")),
            Some(&InferredValue::Type(qualified("Dog", &h, "NonNull")))
        );
    }

    #[test]
    fn test_missing_hierarchy_grounded_at_top() {
        let (mut ts, h, all) = setup();
        let v = ts.add_hierarchy("UnknownVal", "BottomVal");
        let targets = [t("T")];
        let mut map = ConstraintMap::new(targets.clone());
        map.add_type_subtype(&t("T"), qualified("Dog", &h, "NonNull"), &all)
            .unwrap();

        let solution = SubtypesSolver::new(&ts).solve(&targets, &map).unwrap();
        let resolved = solution.get(&t("T")).and_then(InferredValue::as_type).unwrap();
        assert_eq!(resolved.qualifier(&v), Some(&ts.top(&v)));
    }

    #[test]
    fn test_primary_upper_bound_lowers_glb() {
        let (ts, h, all) = setup();
        let targets = [t("T")];
        let mut map = ConstraintMap::new(targets.clone());
        map.add_type_subtype(&t("T"), qualified("Dog", &h, "Nullable"), &all)
            .unwrap();
        map.add_primary_subtype(&t("T"), Qualifier::new(&h, "NonNull"))
            .unwrap();

        let solution = SubtypesSolver::new(&ts).solve(&targets, &map).unwrap();
        assert_eq!(
            solution.get(&t("T")),
            Some(&InferredValue::Type(qualified("Dog", &h, "NonNull")))
        );
    }

    #[test]
    fn test_upper_bound_target_solved_first() {
        let (ts, h, all) = setup();
        let targets = [t("T"), t("U")];
        let mut map = ConstraintMap::new(targets.clone());
        // T <: U <: Animal, and T <: Object
        map.add_target_subtype(&t("T"), &t("U"), &all).unwrap();
        map.add_type_subtype(&t("U"), qualified("Animal", &h, "Nullable"), &all)
            .unwrap();
        map.add_type_subtype(&t("T"), qualified("Object", &h, "Nullable"), &all)
            .unwrap();

        let solution = SubtypesSolver::new(&ts).solve(&targets, &map).unwrap();
        assert_eq!(
            solution.get(&t("T")),
            Some(&InferredValue::Type(qualified("Animal", &h, "Nullable")))
        );
    }
}
