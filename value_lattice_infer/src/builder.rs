//! Building a [`ConstraintMap`] from target-to-type constraints.

use crate::constraint_map::{ConstraintMap, HierarchySet};
use crate::error::InferenceError;
use crate::type_system::TypeSystem;
use crate::types::{AnnotatedType, TargetId, TypeBase};
use serde::{Deserialize, Serialize};

/// How a target relates to the other side of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// `T == U`
    Equal,
    /// `T :> U`
    Supertype,
    /// `T <: U`
    Subtype,
}

/// A constraint between one target and a type, which may itself be a use of
/// another target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TUConstraint {
    pub target: TargetId,
    pub related: AnnotatedType,
    pub relation: Relation,
}

impl TUConstraint {
    pub fn new(target: TargetId, relation: Relation, related: AnnotatedType) -> Self {
        Self {
            target,
            related,
            relation,
        }
    }

    /// `target == related`
    pub fn equal(target: TargetId, related: AnnotatedType) -> Self {
        Self::new(target, Relation::Equal, related)
    }

    /// `target :> related`
    pub fn supertype_of(target: TargetId, related: AnnotatedType) -> Self {
        Self::new(target, Relation::Supertype, related)
    }

    /// `target <: related`
    pub fn subtype_of(target: TargetId, related: AnnotatedType) -> Self {
        Self::new(target, Relation::Subtype, related)
    }
}

/// Splits constraints per hierarchy and records them in a [`ConstraintMap`].
///
/// A constraint against a plain type holds in every hierarchy. A constraint
/// against a use of another target holds between the two targets only in the
/// hierarchies where the use carries no qualifier; where it does, the
/// qualifier becomes a primary constraint on the first target.
#[derive(Debug)]
pub struct ConstraintMapBuilder<'a> {
    types: &'a dyn TypeSystem,
}

impl<'a> ConstraintMapBuilder<'a> {
    pub fn new(types: &'a dyn TypeSystem) -> Self {
        Self { types }
    }

    pub fn build(
        &self,
        targets: &[TargetId],
        constraints: &[TUConstraint],
    ) -> Result<ConstraintMap, InferenceError> {
        let tops: HierarchySet = self.types.hierarchies().into_iter().collect();
        let mut map = ConstraintMap::new(targets.iter().cloned());

        for constraint in constraints {
            let target = &constraint.target;
            if !map.contains(target) {
                return Err(InferenceError::UnknownTarget(target.to_string()));
            }

            match &constraint.related.base {
                TypeBase::Var(other) if map.contains(other) => {
                    let mut related_in = HierarchySet::new();
                    for hierarchy in &tops {
                        match constraint.related.qualifier(hierarchy) {
                            Some(qualifier) => {
                                let qualifier = qualifier.clone();
                                match constraint.relation {
                                    Relation::Equal => {
                                        map.add_primary_equality(target, qualifier)?
                                    }
                                    Relation::Supertype => {
                                        map.add_primary_supertype(target, qualifier)?
                                    }
                                    Relation::Subtype => {
                                        map.add_primary_subtype(target, qualifier)?
                                    }
                                }
                            }
                            None => {
                                related_in.insert(hierarchy.clone());
                            }
                        }
                    }
                    if !related_in.is_empty() {
                        match constraint.relation {
                            Relation::Equal => {
                                map.add_target_equality(target, other, &related_in)?
                            }
                            Relation::Supertype => {
                                map.add_target_supertype(target, other, &related_in)?
                            }
                            Relation::Subtype => {
                                map.add_target_subtype(target, other, &related_in)?
                            }
                        }
                    }
                }
                _ => {
                    let related = constraint.related.clone();
                    match constraint.relation {
                        Relation::Equal => map.add_type_equality(target, related, &tops)?,
                        Relation::Supertype => map.add_type_supertype(target, related, &tops)?,
                        Relation::Subtype => map.add_type_subtype(target, related, &tops)?,
                    }
                }
            }
        }

        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_system::SimpleTypeSystem;
    use crate::types::{Hierarchy, Qualifier};

    fn two_hierarchies() -> (SimpleTypeSystem, Hierarchy, Hierarchy) {
        let mut ts = SimpleTypeSystem::new();
        let a = ts.add_hierarchy("Nullable", "NonNull");
        let b = ts.add_hierarchy("UnknownVal", "BottomVal");
        (ts, a, b)
    }

    fn t(name: &str) -> TargetId {
        TargetId::new(name)
    }

    // ── plain types ──

    #[test]
    fn test_type_constraint_holds_in_every_hierarchy() {
        let (ts, a, b) = two_hierarchies();
        let targets = [t("T")];
        let string = AnnotatedType::class("String");
        let map = ConstraintMapBuilder::new(&ts)
            .build(&targets, &[TUConstraint::equal(t("T"), string.clone())])
            .unwrap();

        let expected: HierarchySet = [a, b].into_iter().collect();
        let record = map.constraints(&t("T")).unwrap();
        assert_eq!(record.equalities.types.get(&string), Some(&expected));
    }

    // ── target uses ──

    #[test]
    fn test_annotated_target_use_splits_hierarchies() {
        let (ts, a, b) = two_hierarchies();
        let targets = [t("T"), t("U")];
        let non_null = Qualifier::new(&a, "NonNull");
        let use_of_u = AnnotatedType::var(t("U")).with_qualifier(non_null.clone());
        let map = ConstraintMapBuilder::new(&ts)
            .build(&targets, &[TUConstraint::supertype_of(t("T"), use_of_u)])
            .unwrap();

        let record = map.constraints(&t("T")).unwrap();
        let only_b: HierarchySet = [b].into_iter().collect();
        assert_eq!(record.supertypes.targets.get(&t("U")), Some(&only_b));
        assert!(record.supertypes.primaries[&a].contains(&non_null));
        assert_eq!(
            map.constraints(&t("U")).unwrap().subtypes.targets.get(&t("T")),
            Some(&only_b)
        );
    }

    #[test]
    fn test_non_target_variable_is_a_plain_type() {
        let (ts, _, _) = two_hierarchies();
        let targets = [t("T")];
        let outer = AnnotatedType::var(t("E"));
        let map = ConstraintMapBuilder::new(&ts)
            .build(&targets, &[TUConstraint::subtype_of(t("T"), outer.clone())])
            .unwrap();
        assert!(map.constraints(&t("T")).unwrap().subtypes.types.contains_key(&outer));
    }

    #[test]
    fn test_constraint_on_unknown_target() {
        let (ts, _, _) = two_hierarchies();
        let err = ConstraintMapBuilder::new(&ts)
            .build(&[t("T")], &[TUConstraint::equal(t("X"), AnnotatedType::class("String"))])
            .unwrap_err();
        assert_eq!(err, InferenceError::UnknownTarget("X".to_string()));
    }
}
