//! Per-target constraint records.
//!
//! Every relation is tagged with the set of hierarchies in which it holds.
//! Records only grow while a target is unresolved; once a target is solved
//! its record is cleared and the solution is substituted into every other
//! record that mentions it.

use crate::error::InferenceError;
use crate::types::{AnnotatedType, Hierarchy, Qualifier, TargetId};
use std::collections::{BTreeMap, BTreeSet};

/// Hierarchies in which one relation holds.
pub type HierarchySet = BTreeSet<Hierarchy>;

/// `target == X` relations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Equalities {
    pub types: BTreeMap<AnnotatedType, HierarchySet>,
    pub targets: BTreeMap<TargetId, HierarchySet>,
    /// Qualifiers the target must carry, from annotated uses of other targets.
    pub primaries: BTreeMap<Hierarchy, Qualifier>,
}

impl Equalities {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.targets.is_empty() && self.primaries.is_empty()
    }
}

/// One direction of bound relations on a target.
///
/// In [`TargetConstraints::supertypes`] these are the target's lower bounds
/// (the target is a supertype of each entry); in
/// [`TargetConstraints::subtypes`] they are its upper bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bounds {
    pub types: BTreeMap<AnnotatedType, HierarchySet>,
    pub targets: BTreeMap<TargetId, HierarchySet>,
    pub primaries: BTreeMap<Hierarchy, BTreeSet<Qualifier>>,
}

impl Bounds {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.targets.is_empty() && self.primaries.is_empty()
    }
}

/// Everything known about one target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetConstraints {
    pub equalities: Equalities,
    pub supertypes: Bounds,
    pub subtypes: Bounds,
}

impl TargetConstraints {
    pub fn is_empty(&self) -> bool {
        self.equalities.is_empty() && self.supertypes.is_empty() && self.subtypes.is_empty()
    }
}

fn add_hierarchies<K: Ord>(
    map: &mut BTreeMap<K, HierarchySet>,
    key: K,
    hierarchies: &HierarchySet,
) {
    map.entry(key)
        .or_default()
        .extend(hierarchies.iter().cloned());
}

fn substitute_keys(
    types: BTreeMap<AnnotatedType, HierarchySet>,
    target: &TargetId,
    replacement: &AnnotatedType,
) -> BTreeMap<AnnotatedType, HierarchySet> {
    let mut out = BTreeMap::new();
    for (ty, hierarchies) in types {
        let ty = if ty.mentions(target) {
            ty.substitute(target, replacement)
        } else {
            ty
        };
        add_hierarchies(&mut out, ty, &hierarchies);
    }
    out
}

/// The constraint graph of one inference call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintMap {
    records: BTreeMap<TargetId, TargetConstraints>,
}

impl ConstraintMap {
    /// Creates an empty record for each target.
    pub fn new(targets: impl IntoIterator<Item = TargetId>) -> Self {
        Self {
            records: targets
                .into_iter()
                .map(|t| (t, TargetConstraints::default()))
                .collect(),
        }
    }

    pub fn targets(&self) -> Vec<TargetId> {
        self.records.keys().cloned().collect()
    }

    pub fn contains(&self, target: &TargetId) -> bool {
        self.records.contains_key(target)
    }

    pub fn constraints(&self, target: &TargetId) -> Result<&TargetConstraints, InferenceError> {
        self.records
            .get(target)
            .ok_or_else(|| InferenceError::UnknownTarget(target.to_string()))
    }

    pub fn constraints_mut(
        &mut self,
        target: &TargetId,
    ) -> Result<&mut TargetConstraints, InferenceError> {
        self.records
            .get_mut(target)
            .ok_or_else(|| InferenceError::UnknownTarget(target.to_string()))
    }

    // ── target-to-target relations ──

    /// Records `target == other` on both records.
    pub fn add_target_equality(
        &mut self,
        target: &TargetId,
        other: &TargetId,
        hierarchies: &HierarchySet,
    ) -> Result<(), InferenceError> {
        if target == other {
            return Ok(());
        }
        self.constraints(other)?;
        add_hierarchies(
            &mut self.constraints_mut(target)?.equalities.targets,
            other.clone(),
            hierarchies,
        );
        add_hierarchies(
            &mut self.constraints_mut(other)?.equalities.targets,
            target.clone(),
            hierarchies,
        );
        Ok(())
    }

    /// Records `target :> other`.
    pub fn add_target_supertype(
        &mut self,
        target: &TargetId,
        other: &TargetId,
        hierarchies: &HierarchySet,
    ) -> Result<(), InferenceError> {
        if target == other {
            return Ok(());
        }
        self.constraints(other)?;
        add_hierarchies(
            &mut self.constraints_mut(target)?.supertypes.targets,
            other.clone(),
            hierarchies,
        );
        add_hierarchies(
            &mut self.constraints_mut(other)?.subtypes.targets,
            target.clone(),
            hierarchies,
        );
        Ok(())
    }

    /// Records `target <: other`.
    pub fn add_target_subtype(
        &mut self,
        target: &TargetId,
        other: &TargetId,
        hierarchies: &HierarchySet,
    ) -> Result<(), InferenceError> {
        self.add_target_supertype(other, target, hierarchies)
    }

    // ── target-to-type relations ──

    pub fn add_type_equality(
        &mut self,
        target: &TargetId,
        ty: AnnotatedType,
        hierarchies: &HierarchySet,
    ) -> Result<(), InferenceError> {
        add_hierarchies(
            &mut self.constraints_mut(target)?.equalities.types,
            ty,
            hierarchies,
        );
        Ok(())
    }

    /// Records `target :> ty`.
    pub fn add_type_supertype(
        &mut self,
        target: &TargetId,
        ty: AnnotatedType,
        hierarchies: &HierarchySet,
    ) -> Result<(), InferenceError> {
        add_hierarchies(
            &mut self.constraints_mut(target)?.supertypes.types,
            ty,
            hierarchies,
        );
        Ok(())
    }

    /// Records `target <: ty`.
    pub fn add_type_subtype(
        &mut self,
        target: &TargetId,
        ty: AnnotatedType,
        hierarchies: &HierarchySet,
    ) -> Result<(), InferenceError> {
        add_hierarchies(
            &mut self.constraints_mut(target)?.subtypes.types,
            ty,
            hierarchies,
        );
        Ok(())
    }

    // ── primary qualifiers ──

    /// Records that `target` carries exactly `qualifier`.
    ///
    /// Two different exact qualifiers in the same hierarchy cannot both hold.
    pub fn add_primary_equality(
        &mut self,
        target: &TargetId,
        qualifier: Qualifier,
    ) -> Result<(), InferenceError> {
        let primaries = &mut self.constraints_mut(target)?.equalities.primaries;
        match primaries.get(&qualifier.hierarchy) {
            Some(existing) if existing != &qualifier => Err(InferenceError::internal(format!(
                "conflicting primary qualifiers for {}: {} and {}",
                target, existing, qualifier
            ))),
            Some(_) => Ok(()),
            None => {
                primaries.insert(qualifier.hierarchy.clone(), qualifier);
                Ok(())
            }
        }
    }

    /// Records that `target` is above `qualifier`.
    pub fn add_primary_supertype(
        &mut self,
        target: &TargetId,
        qualifier: Qualifier,
    ) -> Result<(), InferenceError> {
        self.constraints_mut(target)?
            .supertypes
            .primaries
            .entry(qualifier.hierarchy.clone())
            .or_default()
            .insert(qualifier);
        Ok(())
    }

    /// Records that `target` is below `qualifier`.
    pub fn add_primary_subtype(
        &mut self,
        target: &TargetId,
        qualifier: Qualifier,
    ) -> Result<(), InferenceError> {
        self.constraints_mut(target)?
            .subtypes
            .primaries
            .entry(qualifier.hierarchy.clone())
            .or_default()
            .insert(qualifier);
        Ok(())
    }

    // ── rewriting ──

    /// Substitutes the solution `target = ty` into every other record, then
    /// clears the record of `target`.
    pub fn rewrite_with_type(
        &mut self,
        target: &TargetId,
        ty: &AnnotatedType,
    ) -> Result<(), InferenceError> {
        let equivalent = self.constraints(target)?.equalities.targets.clone();
        for (other, hierarchies) in &equivalent {
            if other != target {
                self.add_type_equality(other, ty.clone(), hierarchies)?;
            }
        }

        for other in self.targets() {
            if &other == target {
                continue;
            }
            let record = self.constraints_mut(&other)?;

            if let Some(hierarchies) = record.equalities.targets.remove(target) {
                add_hierarchies(&mut record.equalities.types, ty.clone(), &hierarchies);
            }
            record.equalities.types =
                substitute_keys(std::mem::take(&mut record.equalities.types), target, ty);

            if let Some(hierarchies) = record.supertypes.targets.remove(target) {
                add_hierarchies(&mut record.supertypes.types, ty.clone(), &hierarchies);
            }
            record.supertypes.types =
                substitute_keys(std::mem::take(&mut record.supertypes.types), target, ty);

            if let Some(hierarchies) = record.subtypes.targets.remove(target) {
                add_hierarchies(&mut record.subtypes.types, ty.clone(), &hierarchies);
            }
            record.subtypes.types =
                substitute_keys(std::mem::take(&mut record.subtypes.types), target, ty);
        }

        *self.constraints_mut(target)? = TargetConstraints::default();
        Ok(())
    }

    /// Moves the record of `target` onto `inferred` after finding
    /// `target == inferred`, and redirects every other mention of `target`.
    pub fn rewrite_with_target(
        &mut self,
        target: &TargetId,
        inferred: &TargetId,
    ) -> Result<(), InferenceError> {
        self.constraints(inferred)?;
        let record = std::mem::take(self.constraints_mut(target)?);

        for (ty, hierarchies) in record.equalities.types {
            self.add_type_equality(inferred, ty, &hierarchies)?;
        }
        for (ty, hierarchies) in record.supertypes.types {
            self.add_type_supertype(inferred, ty, &hierarchies)?;
        }
        for (ty, hierarchies) in record.subtypes.types {
            self.add_type_subtype(inferred, ty, &hierarchies)?;
        }
        for (other, hierarchies) in &record.supertypes.targets {
            if other != inferred {
                self.add_target_supertype(inferred, other, hierarchies)?;
            }
        }
        for (other, hierarchies) in &record.subtypes.targets {
            if other != inferred {
                self.add_target_subtype(inferred, other, hierarchies)?;
            }
        }

        let use_of_inferred = AnnotatedType::var(inferred.clone());
        for other in self.targets() {
            if &other == target || &other == inferred {
                continue;
            }
            let (equal, supertype, subtype) = {
                let record = self.constraints_mut(&other)?;
                record.equalities.types = substitute_keys(
                    std::mem::take(&mut record.equalities.types),
                    target,
                    &use_of_inferred,
                );
                record.supertypes.types = substitute_keys(
                    std::mem::take(&mut record.supertypes.types),
                    target,
                    &use_of_inferred,
                );
                record.subtypes.types = substitute_keys(
                    std::mem::take(&mut record.subtypes.types),
                    target,
                    &use_of_inferred,
                );
                (
                    record.equalities.targets.remove(target),
                    record.supertypes.targets.remove(target),
                    record.subtypes.targets.remove(target),
                )
            };
            if let Some(hierarchies) = equal {
                self.add_target_equality(&other, inferred, &hierarchies)?;
            }
            if let Some(hierarchies) = supertype {
                self.add_target_supertype(&other, inferred, &hierarchies)?;
            }
            if let Some(hierarchies) = subtype {
                self.add_target_subtype(&other, inferred, &hierarchies)?;
            }
        }

        let inferred_record = self.constraints_mut(inferred)?;
        inferred_record.equalities.targets.remove(target);
        inferred_record.supertypes.targets.remove(target);
        inferred_record.subtypes.targets.remove(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(name: &str) -> Hierarchy {
        Hierarchy::new(name)
    }

    fn all() -> HierarchySet {
        [h("A"), h("B")].into_iter().collect()
    }

    fn t(name: &str) -> TargetId {
        TargetId::new(name)
    }

    fn map() -> ConstraintMap {
        ConstraintMap::new([t("T"), t("U"), t("V")])
    }

    // ── recording ──

    #[test]
    fn test_target_equality_is_symmetric() {
        let mut m = map();
        m.add_target_equality(&t("T"), &t("U"), &all()).unwrap();
        assert_eq!(m.constraints(&t("T")).unwrap().equalities.targets.get(&t("U")), Some(&all()));
        assert_eq!(m.constraints(&t("U")).unwrap().equalities.targets.get(&t("T")), Some(&all()));
    }

    #[test]
    fn test_target_supertype_records_both_directions() {
        let mut m = map();
        m.add_target_supertype(&t("T"), &t("U"), &all()).unwrap();
        assert!(m.constraints(&t("T")).unwrap().supertypes.targets.contains_key(&t("U")));
        assert!(m.constraints(&t("U")).unwrap().subtypes.targets.contains_key(&t("T")));
    }

    #[test]
    fn test_hierarchies_accumulate() {
        let mut m = map();
        let string = AnnotatedType::class("String");
        m.add_type_equality(&t("T"), string.clone(), &[h("A")].into_iter().collect())
            .unwrap();
        m.add_type_equality(&t("T"), string.clone(), &[h("B")].into_iter().collect())
            .unwrap();
        assert_eq!(m.constraints(&t("T")).unwrap().equalities.types.get(&string), Some(&all()));
    }

    #[test]
    fn test_unknown_target() {
        let mut m = map();
        let err = m
            .add_type_equality(&t("X"), AnnotatedType::class("String"), &all())
            .unwrap_err();
        assert_eq!(err, InferenceError::UnknownTarget("X".to_string()));
    }

    #[test]
    fn test_conflicting_primary_is_internal_error() {
        let mut m = map();
        m.add_primary_equality(&t("T"), Qualifier::new(&h("A"), "A1")).unwrap();
        m.add_primary_equality(&t("T"), Qualifier::new(&h("A"), "A1")).unwrap();
        let err = m
            .add_primary_equality(&t("T"), Qualifier::new(&h("A"), "A2"))
            .unwrap_err();
        assert!(matches!(err, InferenceError::Internal(_)));
    }

    // ── rewriting ──

    #[test]
    fn test_rewrite_with_type_substitutes_everywhere() {
        let mut m = map();
        let string = AnnotatedType::class("String");
        let list_of_t = AnnotatedType::class_with_args("List", vec![AnnotatedType::var(t("T"))]);
        m.add_target_equality(&t("T"), &t("U"), &all()).unwrap();
        m.add_target_supertype(&t("V"), &t("T"), &all()).unwrap();
        m.add_type_subtype(&t("V"), list_of_t, &all()).unwrap();

        m.rewrite_with_type(&t("T"), &string).unwrap();

        assert!(m.constraints(&t("T")).unwrap().is_empty());
        let u = m.constraints(&t("U")).unwrap();
        assert!(u.equalities.targets.is_empty());
        assert_eq!(u.equalities.types.get(&string), Some(&all()));

        let v = m.constraints(&t("V")).unwrap();
        assert!(v.supertypes.targets.is_empty());
        assert_eq!(v.supertypes.types.get(&string), Some(&all()));
        let list_of_string = AnnotatedType::class_with_args("List", vec![string]);
        assert_eq!(v.subtypes.types.get(&list_of_string), Some(&all()));
    }

    #[test]
    fn test_rewrite_with_target_moves_record() {
        let mut m = map();
        let string = AnnotatedType::class("String");
        m.add_target_equality(&t("T"), &t("U"), &all()).unwrap();
        m.add_target_equality(&t("T"), &t("V"), &all()).unwrap();
        m.add_type_supertype(&t("T"), string.clone(), &all()).unwrap();

        m.rewrite_with_target(&t("T"), &t("U")).unwrap();

        assert!(m.constraints(&t("T")).unwrap().is_empty());
        let u = m.constraints(&t("U")).unwrap();
        assert_eq!(u.supertypes.types.get(&string), Some(&all()));
        assert!(!u.equalities.targets.contains_key(&t("T")));
        assert_eq!(u.equalities.targets.get(&t("V")), Some(&all()));
        let v = m.constraints(&t("V")).unwrap();
        assert!(!v.equalities.targets.contains_key(&t("T")));
        assert_eq!(v.equalities.targets.get(&t("U")), Some(&all()));
    }
}
