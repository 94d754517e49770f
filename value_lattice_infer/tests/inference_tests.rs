//! End-to-end tests for type-argument inference.

use pretty_assertions::assert_eq;
use value_lattice_infer::{
    AnnotatedType, ConstraintMap, ConstraintMapBuilder, Hierarchy, HierarchySet, InferenceError,
    InferredValue, Qualifier, SimpleTypeSystem, TUConstraint, TargetId, TypeArgInference,
    TypeSystem,
};

// ============================================================================
// Helpers
// ============================================================================

struct Checker {
    ts: SimpleTypeSystem,
    nullness: Hierarchy,
    value: Hierarchy,
}

/// Two orthogonal hierarchies: nullness and constant value.
fn checker() -> Checker {
    let mut ts = SimpleTypeSystem::new();
    ts.add_class("Animal", "Object");
    ts.add_class("Dog", "Animal");
    ts.add_class("Cat", "Animal");
    let nullness = ts.add_hierarchy("Nullable", "NonNull");
    let value = ts.add_hierarchy("UnknownVal", "BottomVal");
    ts.add_qualifier(&value, "IntRange", &[]);
    ts.add_qualifier(&value, "IntVal", &["IntRange"]);
    Checker {
        ts,
        nullness,
        value,
    }
}

fn t(name: &str) -> TargetId {
    TargetId::new(name)
}

impl Checker {
    fn ty(&self, name: &str, nullness: &str, value: &str) -> AnnotatedType {
        AnnotatedType::class(name)
            .with_qualifier(Qualifier::new(&self.nullness, nullness))
            .with_qualifier(Qualifier::new(&self.value, value))
    }

    fn only(&self, h: &Hierarchy) -> HierarchySet {
        [h.clone()].into_iter().collect()
    }
}

// ============================================================================
// Equalities
// ============================================================================

#[test]
fn test_same_type_equal_in_each_hierarchy_merges() {
    let c = checker();
    let targets = [t("T")];
    let string = c.ty("String", "NonNull", "UnknownVal");

    let mut map = ConstraintMap::new(targets.clone());
    map.add_type_equality(&t("T"), string.clone(), &c.only(&c.nullness))
        .unwrap();
    map.add_type_equality(&t("T"), string.clone(), &c.only(&c.value))
        .unwrap();

    let result = TypeArgInference::new(&c.ts).solve(&targets, &mut map).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.get(&t("T")), Some(&InferredValue::Type(string)));
    assert!(result.is_complete(&targets));
    assert!(map.constraints(&t("T")).unwrap().is_empty());
}

#[test]
fn test_equal_targets_share_a_solution() {
    let c = checker();
    let targets = [t("K"), t("V")];
    let string = c.ty("String", "NonNull", "UnknownVal");
    let constraints = [
        TUConstraint::equal(t("K"), AnnotatedType::var(t("V"))),
        TUConstraint::equal(t("V"), string.clone()),
    ];

    let result = TypeArgInference::new(&c.ts)
        .infer(&targets, &constraints)
        .unwrap();
    assert_eq!(result.get(&t("K")), Some(&InferredValue::Type(string.clone())));
    assert_eq!(result.get(&t("V")), Some(&InferredValue::Type(string)));
}

#[test]
fn test_annotated_target_use_keeps_its_qualifier() {
    let c = checker();
    let targets = [t("K"), t("V")];
    // K == @NonNull V, V == @Nullable String
    let use_of_v =
        AnnotatedType::var(t("V")).with_qualifier(Qualifier::new(&c.nullness, "NonNull"));
    let constraints = [
        TUConstraint::equal(t("K"), use_of_v),
        TUConstraint::equal(t("V"), c.ty("String", "Nullable", "UnknownVal")),
    ];

    let result = TypeArgInference::new(&c.ts)
        .infer(&targets, &constraints)
        .unwrap();
    assert!(result.is_complete(&targets));
    assert_eq!(
        result.get(&t("K")),
        Some(&InferredValue::Type(c.ty("String", "NonNull", "UnknownVal")))
    );
}

#[test]
fn test_conflicting_merge_is_internal_error() {
    let c = checker();
    let targets = [t("T")];
    let mut map = ConstraintMap::new(targets.clone());
    map.add_type_equality(
        &t("T"),
        c.ty("String", "NonNull", "UnknownVal"),
        &c.only(&c.nullness),
    )
    .unwrap();
    map.add_type_equality(
        &t("T"),
        c.ty("Integer", "NonNull", "UnknownVal"),
        &c.only(&c.value),
    )
    .unwrap();

    let err = TypeArgInference::new(&c.ts)
        .solve(&targets, &mut map)
        .unwrap_err();
    assert!(matches!(err, InferenceError::Internal(_)));
    assert!(err.to_string().starts_with("InternalError"));
}

// ============================================================================
// Bounds
// ============================================================================

#[test]
fn test_lub_of_argument_types() {
    let c = checker();
    let targets = [t("T")];
    // <T> T pick(T a, T b) called with a Dog and a Cat
    let constraints = [
        TUConstraint::supertype_of(t("T"), c.ty("Dog", "NonNull", "UnknownVal")),
        TUConstraint::supertype_of(t("T"), c.ty("Cat", "Nullable", "UnknownVal")),
    ];

    let result = TypeArgInference::new(&c.ts)
        .infer(&targets, &constraints)
        .unwrap();
    assert_eq!(
        result.get(&t("T")),
        Some(&InferredValue::Type(c.ty("Animal", "Nullable", "UnknownVal")))
    );
}

#[test]
fn test_value_qualifiers_join() {
    let c = checker();
    let targets = [t("T")];
    let constraints = [
        TUConstraint::supertype_of(t("T"), c.ty("Integer", "NonNull", "IntVal")),
        TUConstraint::supertype_of(t("T"), c.ty("Integer", "NonNull", "IntRange")),
    ];

    let result = TypeArgInference::new(&c.ts)
        .infer(&targets, &constraints)
        .unwrap();
    assert_eq!(
        result.get(&t("T")),
        Some(&InferredValue::Type(c.ty("Integer", "NonNull", "IntRange")))
    );
}

#[test]
fn test_dependent_lower_bound_resolves_in_order() {
    let c = checker();
    // U :> T, T :> Dog, U :> Cat
    let targets = [t("U"), t("T")];
    let constraints = [
        TUConstraint::supertype_of(t("U"), AnnotatedType::var(t("T"))),
        TUConstraint::supertype_of(t("T"), c.ty("Dog", "NonNull", "UnknownVal")),
        TUConstraint::supertype_of(t("U"), c.ty("Cat", "NonNull", "UnknownVal")),
    ];

    let result = TypeArgInference::new(&c.ts)
        .infer(&targets, &constraints)
        .unwrap();
    assert_eq!(
        result.get(&t("T")),
        Some(&InferredValue::Type(c.ty("Dog", "NonNull", "UnknownVal")))
    );
    assert_eq!(
        result.get(&t("U")),
        Some(&InferredValue::Type(c.ty("Animal", "NonNull", "UnknownVal")))
    );
}

#[test]
fn test_upper_bound_only() {
    let c = checker();
    let targets = [t("T")];
    let constraints = [TUConstraint::subtype_of(
        t("T"),
        c.ty("Animal", "Nullable", "UnknownVal"),
    )];

    let result = TypeArgInference::new(&c.ts)
        .infer(&targets, &constraints)
        .unwrap();
    assert_eq!(
        result.get(&t("T")).and_then(InferredValue::as_type).map(|ty| ty.to_string()),
        Some("@Nullable @UnknownVal Animal".to_string())
    );
}

// ============================================================================
// Result handling
// ============================================================================

#[test]
fn test_partial_result_and_type_map() {
    let c = checker();
    let targets = [t("T"), t("U")];
    let constraints = [TUConstraint::equal(
        t("T"),
        c.ty("String", "NonNull", "UnknownVal"),
    )];

    let result = TypeArgInference::new(&c.ts)
        .infer(&targets, &constraints)
        .unwrap();
    assert!(!result.is_complete(&targets));
    assert_eq!(result.remaining_targets(&targets, true), vec![t("U")]);

    let map = result.to_type_map();
    assert_eq!(map.keys().cloned().collect::<Vec<_>>(), vec![t("T")]);
}

#[test]
fn test_builder_rejects_unknown_target() {
    let c = checker();
    let err = ConstraintMapBuilder::new(&c.ts)
        .build(
            &[t("T")],
            &[TUConstraint::equal(t("X"), c.ty("String", "NonNull", "UnknownVal"))],
        )
        .unwrap_err();
    assert_eq!(err, InferenceError::UnknownTarget("X".to_string()));
}

#[test]
fn test_hierarchies_listed_in_declaration_order() {
    let c = checker();
    assert_eq!(c.ts.hierarchies(), vec![c.nullness.clone(), c.value.clone()]);
}
