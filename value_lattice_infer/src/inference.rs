//! The coordinating loop over the three solver passes.

use crate::builder::{ConstraintMapBuilder, TUConstraint};
use crate::constraint_map::ConstraintMap;
use crate::equalities::EqualitiesSolver;
use crate::error::InferenceError;
use crate::result::{InferenceResult, InferredValue};
use crate::subtypes::SubtypesSolver;
use crate::supertypes::SupertypesSolver;
use crate::type_system::TypeSystem;
use crate::types::TargetId;
use value_lattice::diagnostics::emit_unresolved_target;

/// Infers type arguments for a set of targets.
///
/// Each round runs the equalities pass, then the supertypes and subtypes
/// passes on whatever is still unresolved. Supertype solutions take
/// precedence over subtype solutions. Every new concrete solution is
/// substituted into the constraint map before the next round, and rounds
/// stop once one resolves nothing new. Solutions are then substituted into
/// each other, and targets still unresolved are reported through the
/// diagnostics channel.
#[derive(Debug)]
pub struct TypeArgInference<'a> {
    types: &'a dyn TypeSystem,
}

impl<'a> TypeArgInference<'a> {
    pub fn new(types: &'a dyn TypeSystem) -> Self {
        Self { types }
    }

    pub fn infer(
        &self,
        targets: &[TargetId],
        constraints: &[TUConstraint],
    ) -> Result<InferenceResult, InferenceError> {
        let mut map = ConstraintMapBuilder::new(self.types).build(targets, constraints)?;
        self.solve(targets, &mut map)
    }

    /// Solves an already built constraint map.
    pub fn solve(
        &self,
        targets: &[TargetId],
        map: &mut ConstraintMap,
    ) -> Result<InferenceResult, InferenceError> {
        let mut equalities = EqualitiesSolver::new(self.types);
        let supertypes = SupertypesSolver::new(self.types);
        let subtypes = SubtypesSolver::new(self.types);

        let mut result = InferenceResult::new();
        loop {
            let resolved_before = result.resolved_count();

            let from_equalities = equalities.solve(targets, map, &result)?;
            result.merge_subordinate(from_equalities);

            let remaining = result.remaining_targets(targets, true);
            if !remaining.is_empty() {
                let mut from_bounds = supertypes.solve(&remaining, map)?;
                from_bounds.merge_subordinate(subtypes.solve(&remaining, map)?);
                for (target, value) in from_bounds.iter() {
                    if let InferredValue::Type(ty) = value {
                        map.rewrite_with_type(target, ty)?;
                    }
                }
                result.merge_subordinate(from_bounds);
            }

            if result.resolved_count() == resolved_before {
                break;
            }
        }

        result.resolve_chained_targets();
        result.substitute_solutions();
        for target in result.remaining_targets(targets, true) {
            emit_unresolved_target(target.name());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_system::SimpleTypeSystem;
    use crate::types::{AnnotatedType, Hierarchy, Qualifier};
    use pretty_assertions::assert_eq;
    use value_lattice::diagnostics::{DiagnosticReason, DiagnosticsCollector};

    fn t(name: &str) -> TargetId {
        TargetId::new(name)
    }

    fn setup() -> (SimpleTypeSystem, Hierarchy) {
        let mut ts = SimpleTypeSystem::new();
        let h = ts.add_hierarchy("Nullable", "NonNull");
        (ts, h)
    }

    fn qualified(name: &str, h: &Hierarchy, q: &str) -> AnnotatedType {
        AnnotatedType::class(name).with_qualifier(Qualifier::new(h, q))
    }

    // ── passes ──

    #[test]
    fn test_equality_wins_over_bounds() {
        let (ts, h) = setup();
        let targets = [t("T")];
        let constraints = [
            TUConstraint::equal(t("T"), qualified("String", &h, "NonNull")),
            TUConstraint::supertype_of(t("T"), qualified("Integer", &h, "NonNull")),
        ];
        let result = TypeArgInference::new(&ts).infer(&targets, &constraints).unwrap();
        assert_eq!(
            result.get(&t("T")),
            Some(&InferredValue::Type(qualified("String", &h, "NonNull")))
        );
    }

    #[test]
    fn test_supertype_solution_feeds_equal_target() {
        let (ts, h) = setup();
        let targets = [t("T"), t("U")];
        // T :> Integer, T :> Long, U == List<T>
        let list_of_t = AnnotatedType::class_with_args("List", vec![AnnotatedType::var(t("T"))])
            .with_qualifier(Qualifier::new(&h, "NonNull"));
        let constraints = [
            TUConstraint::supertype_of(t("T"), qualified("Integer", &h, "NonNull")),
            TUConstraint::supertype_of(t("T"), qualified("Long", &h, "NonNull")),
            TUConstraint::equal(t("U"), list_of_t),
        ];
        let result = TypeArgInference::new(&ts).infer(&targets, &constraints).unwrap();
        assert!(result.is_complete(&targets));
        assert_eq!(
            result.get(&t("T")).map(|v| v.to_string()),
            Some("InferredType(@NonNull Number)".to_string())
        );
        assert_eq!(
            result.get(&t("U")).map(|v| v.to_string()),
            Some("InferredType(@NonNull List<@NonNull Number>)".to_string())
        );
    }

    #[test]
    fn test_subtypes_used_when_no_lower_bound() {
        let (ts, h) = setup();
        let targets = [t("T")];
        let constraints = [TUConstraint::subtype_of(
            t("T"),
            qualified("String", &h, "Nullable"),
        )];
        let result = TypeArgInference::new(&ts).infer(&targets, &constraints).unwrap();
        assert_eq!(
            result.get(&t("T")),
            Some(&InferredValue::Type(qualified("String", &h, "Nullable")))
        );
    }

    // ── unresolved ──

    #[test]
    fn test_unconstrained_target_reported() {
        let (ts, _) = setup();
        DiagnosticsCollector::enable();
        DiagnosticsCollector::clear();

        let targets = [t("T")];
        let result = TypeArgInference::new(&ts).infer(&targets, &[]).unwrap();
        assert!(!result.is_complete(&targets));

        let diags = DiagnosticsCollector::take();
        DiagnosticsCollector::disable();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].reason, DiagnosticReason::UnresolvedTarget("T".to_string()));
    }
}
