//! value_lattice_infer
//!
//! Constraint-based inference of type arguments over qualified types.
//!
//! Each inference call collects equality, subtype and supertype constraints
//! between its *targets* (the type parameters being inferred) and concrete
//! types, per qualifier hierarchy. Three passes then resolve targets:
//! equalities first, then least upper bounds of lower bounds, then greatest
//! lower bounds of upper bounds. Every solution is substituted back into the
//! constraint graph, and the passes repeat until nothing new resolves.
//!
//! # Example
//!
//! ```
//! use value_lattice_infer::{
//!     AnnotatedType, InferredValue, SimpleTypeSystem, TUConstraint, TargetId, TypeArgInference,
//!     TypeSystem,
//! };
//!
//! let mut ts = SimpleTypeSystem::new();
//! let nullness = ts.add_hierarchy("Nullable", "NonNull");
//! let string = AnnotatedType::class("String").with_qualifier(ts.bottom(&nullness));
//!
//! let t = TargetId::new("T");
//! let result = TypeArgInference::new(&ts)
//!     .infer(&[t.clone()], &[TUConstraint::equal(t.clone(), string.clone())])
//!     .unwrap();
//!
//! assert_eq!(result.get(&t), Some(&InferredValue::Type(string)));
//! ```

pub mod builder;
pub mod constraint_map;
pub mod equalities;
pub mod error;
pub mod inference;
pub mod result;
pub mod subtypes;
pub mod supertypes;
pub mod type_system;
pub mod types;

// Re-exports
pub use builder::{ConstraintMapBuilder, Relation, TUConstraint};
pub use constraint_map::{ConstraintMap, HierarchySet, TargetConstraints};
pub use error::InferenceError;
pub use inference::TypeArgInference;
pub use result::{InferenceResult, InferredValue};
pub use type_system::{SimpleTypeSystem, TypeSystem};
pub use types::{AnnotatedType, Hierarchy, Qualifier, TargetId, TypeBase};
