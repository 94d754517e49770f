//! Solving targets from their equality constraints.
//!
//! A target is resolved when its equality types cover every hierarchy once
//! merged, or when it is equal to a single other target in every hierarchy
//! (directly, or with its own primary qualifiers filling the gaps). Each
//! resolution is substituted into the constraint map at once, so later
//! targets in the same pass see it.

use crate::constraint_map::{ConstraintMap, Equalities, HierarchySet};
use crate::error::InferenceError;
use crate::result::{InferenceResult, InferredValue};
use crate::type_system::TypeSystem;
use crate::types::{AnnotatedType, Hierarchy, Qualifier, TargetId};
use std::collections::BTreeMap;

/// The equalities pass.
#[derive(Debug)]
pub struct EqualitiesSolver<'a> {
    types: &'a dyn TypeSystem,
    dirty: bool,
}

impl<'a> EqualitiesSolver<'a> {
    pub fn new(types: &'a dyn TypeSystem) -> Self {
        Self {
            types,
            dirty: false,
        }
    }

    /// Resolves as many of `targets` as the equalities allow.
    ///
    /// Targets that `known` already resolved to a type are skipped. Repeats
    /// until a full sweep neither resolves a target nor propagates a partial
    /// type to an equal target.
    pub fn solve(
        &mut self,
        targets: &[TargetId],
        map: &mut ConstraintMap,
        known: &InferenceResult,
    ) -> Result<InferenceResult, InferenceError> {
        let tops: HierarchySet = self.types.hierarchies().into_iter().collect();
        let mut solution = InferenceResult::new();

        loop {
            self.dirty = false;
            for target in targets {
                if solution.contains(target) || known.is_resolved_type(target) {
                    continue;
                }

                if let Some(inferred) = self.merge_constraints(target, map, &tops)? {
                    match &inferred {
                        InferredValue::Type(ty) => map.rewrite_with_type(target, ty)?,
                        InferredValue::Target { target: other, .. } => {
                            map.rewrite_with_target(target, other)?
                        }
                    }
                    solution.insert(target.clone(), inferred);
                    self.dirty = true;
                }
            }
            if !self.dirty {
                break;
            }
        }

        solution.resolve_chained_targets();
        Ok(solution)
    }

    fn merge_constraints(
        &mut self,
        target: &TargetId,
        map: &mut ConstraintMap,
        tops: &HierarchySet,
    ) -> Result<Option<InferredValue>, InferenceError> {
        let equalities = &mut map.constraints_mut(target)?.equalities;
        if !equalities.types.is_empty() {
            if let Some(ty) =
                merge_types_and_primaries(&mut equalities.types, &equalities.primaries, tops)?
            {
                return Ok(Some(InferredValue::Type(ty)));
            }
        }
        let equalities = equalities.clone();

        self.dirty |= update_targets_with_partial_type(&equalities, map)?;

        let mut inferred = find_equal_target(&equalities, tops);
        if inferred.is_none() && equalities.types.len() == 1 {
            inferred = equalities
                .types
                .keys()
                .next()
                .map(|ty| InferredValue::Type(ty.clone()));
        }
        Ok(inferred)
    }
}

/// Merges the equality types of one target into a single type.
///
/// Returns the type once every hierarchy is covered. Otherwise the partially
/// merged type is left as the only entry of `types`, tagged with the
/// hierarchies it covers.
fn merge_types_and_primaries(
    types: &mut BTreeMap<AnnotatedType, HierarchySet>,
    primaries: &BTreeMap<Hierarchy, Qualifier>,
    tops: &HierarchySet,
) -> Result<Option<AnnotatedType>, InferenceError> {
    let mut missing = tops.clone();
    let mut entries = std::mem::take(types).into_iter();
    let Some((mut merged, covered)) = entries.next() else {
        return Err(InferenceError::internal("merging an empty list of types"));
    };
    missing.retain(|h| !covered.contains(h));

    for (current, hierarchies) in entries {
        if missing.is_empty() {
            break;
        }
        let mut found = Vec::new();
        for hierarchy in &missing {
            if !hierarchies.contains(hierarchy) {
                continue;
            }
            if !merged.has_same_base(&current) {
                return Err(InferenceError::internal(format!(
                    "types equal by construction differ: {} and {}",
                    merged, current
                )));
            }
            match current.qualifier(hierarchy) {
                Some(qualifier) => {
                    merged.replace_qualifier(qualifier.clone());
                    found.push(hierarchy.clone());
                }
                None if merged.base.is_var() => found.push(hierarchy.clone()),
                None => {
                    return Err(InferenceError::internal(format!(
                        "missing qualifier in hierarchy {} on {}",
                        hierarchy, current
                    )));
                }
            }
        }
        missing.retain(|h| !found.contains(h));
    }

    for hierarchy in &missing {
        if let Some(qualifier) = primaries.get(hierarchy) {
            merged.replace_qualifier(qualifier.clone());
        }
    }

    if missing.is_empty() {
        return Ok(Some(merged));
    }
    let covered: HierarchySet = tops.difference(&missing).cloned().collect();
    types.insert(merged, covered);
    Ok(None)
}

/// Copies a partially merged equality type onto every equal target, in the
/// hierarchies both equalities hold in.
///
/// Returns `true` if some other target learned something new.
fn update_targets_with_partial_type(
    equalities: &Equalities,
    map: &mut ConstraintMap,
) -> Result<bool, InferenceError> {
    let mut remaining = equalities.types.iter();
    let Some((remaining_type, remaining_hierarchies)) = remaining.next() else {
        return Ok(false);
    };
    if remaining.next().is_some() {
        return Err(InferenceError::internal(
            "equalities should hold at most one type after merging",
        ));
    }

    let mut updated = false;
    for (equal_target, hierarchies) in &equalities.targets {
        let shared: HierarchySet = remaining_hierarchies
            .intersection(hierarchies)
            .cloned()
            .collect();
        if shared.is_empty() {
            continue;
        }
        let entry = map
            .constraints_mut(equal_target)?
            .equalities
            .types
            .entry(remaining_type.clone())
            .or_default();
        let before = entry.len();
        entry.extend(shared);
        updated |= entry.len() != before;
    }
    Ok(updated)
}

/// A target equal to this one in every hierarchy, counting this target's own
/// primary qualifiers as covering the hierarchies they name.
fn find_equal_target(equalities: &Equalities, tops: &HierarchySet) -> Option<InferredValue> {
    for (equal_target, hierarchies) in &equalities.targets {
        if hierarchies.len() == tops.len() {
            return Some(InferredValue::Target {
                target: equal_target.clone(),
                primaries: Vec::new(),
            });
        }

        let required: Vec<Qualifier> = equalities
            .primaries
            .iter()
            .filter(|(h, _)| !hierarchies.contains(*h))
            .map(|(_, q)| q.clone())
            .collect();
        if required.len() + hierarchies.len() == tops.len() {
            return Some(InferredValue::Target {
                target: equal_target.clone(),
                primaries: required,
            });
        }
    }
    None
}
