//! Type terms the inference solver works over.
//!
//! An [`AnnotatedType`] is an underlying type ([`TypeBase`]) plus at most one
//! primary [`Qualifier`] per qualifier [`Hierarchy`]. Hierarchies are
//! independent lattices (e.g. nullness and value), so a constraint can hold in
//! some of them and not in others.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One qualifier hierarchy, named after its top qualifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hierarchy(pub String);

impl Hierarchy {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A type qualifier such as `@NonNull`, member of exactly one hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Qualifier {
    pub hierarchy: Hierarchy,
    pub name: String,
}

impl Qualifier {
    pub fn new(hierarchy: &Hierarchy, name: impl Into<String>) -> Self {
        Self {
            hierarchy: hierarchy.clone(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)
    }
}

/// An inference target: a type parameter whose argument is being inferred.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The underlying (unqualified) part of a type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypeBase {
    /// A primitive such as `int` or `boolean`.
    Primitive(String),
    /// A nominal class type with its type arguments.
    Class {
        name: String,
        args: Vec<AnnotatedType>,
    },
    /// An array with the given component type.
    Array(Box<AnnotatedType>),
    /// A use of a type variable.
    Var(TargetId),
}

impl TypeBase {
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeBase::Primitive(_))
    }

    pub fn is_var(&self) -> bool {
        matches!(self, TypeBase::Var(_))
    }

    /// Structural equality ignoring every qualifier, including nested ones.
    pub fn same_erasure(&self, other: &TypeBase) -> bool {
        match (self, other) {
            (TypeBase::Primitive(a), TypeBase::Primitive(b)) => a == b,
            (
                TypeBase::Class { name: a, args: aa },
                TypeBase::Class { name: b, args: ba },
            ) => {
                a == b
                    && aa.len() == ba.len()
                    && aa
                        .iter()
                        .zip(ba.iter())
                        .all(|(x, y)| x.base.same_erasure(&y.base))
            }
            (TypeBase::Array(a), TypeBase::Array(b)) => a.base.same_erasure(&b.base),
            (TypeBase::Var(a), TypeBase::Var(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for TypeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeBase::Primitive(name) => f.write_str(name),
            TypeBase::Class { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeBase::Array(component) => write!(f, "{}[]", component),
            TypeBase::Var(target) => write!(f, "{}", target),
        }
    }
}

/// A type together with its primary qualifiers.
///
/// # Example
/// ```
/// use value_lattice_infer::types::{AnnotatedType, Hierarchy, Qualifier};
///
/// let nullness = Hierarchy::new("Nullable");
/// let ty = AnnotatedType::class("String").with_qualifier(Qualifier::new(&nullness, "NonNull"));
/// assert_eq!(ty.to_string(), "@NonNull String");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnnotatedType {
    pub base: TypeBase,
    pub qualifiers: BTreeMap<Hierarchy, Qualifier>,
}

impl AnnotatedType {
    pub fn new(base: TypeBase) -> Self {
        Self {
            base,
            qualifiers: BTreeMap::new(),
        }
    }

    pub fn primitive(name: impl Into<String>) -> Self {
        Self::new(TypeBase::Primitive(name.into()))
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::class_with_args(name, Vec::new())
    }

    pub fn class_with_args(name: impl Into<String>, args: Vec<AnnotatedType>) -> Self {
        Self::new(TypeBase::Class {
            name: name.into(),
            args,
        })
    }

    pub fn array(component: AnnotatedType) -> Self {
        Self::new(TypeBase::Array(Box::new(component)))
    }

    pub fn var(target: TargetId) -> Self {
        Self::new(TypeBase::Var(target))
    }

    /// Returns `self` with `qualifier` as its primary qualifier in that hierarchy.
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.replace_qualifier(qualifier);
        self
    }

    pub fn qualifier(&self, hierarchy: &Hierarchy) -> Option<&Qualifier> {
        self.qualifiers.get(hierarchy)
    }

    /// Replaces the primary qualifier in the qualifier's own hierarchy.
    pub fn replace_qualifier(&mut self, qualifier: Qualifier) {
        self.qualifiers.insert(qualifier.hierarchy.clone(), qualifier);
    }

    /// True if both types have the same underlying type.
    pub fn has_same_base(&self, other: &AnnotatedType) -> bool {
        self.base.same_erasure(&other.base)
    }

    /// True if `target` occurs anywhere in this type.
    pub fn mentions(&self, target: &TargetId) -> bool {
        match &self.base {
            TypeBase::Var(t) => t == target,
            TypeBase::Class { args, .. } => args.iter().any(|a| a.mentions(target)),
            TypeBase::Array(component) => component.mentions(target),
            TypeBase::Primitive(_) => false,
        }
    }

    /// Replaces every use of `target` by `replacement`.
    ///
    /// Qualifiers written on the use override the replacement's qualifiers in
    /// the same hierarchy.
    pub fn substitute(&self, target: &TargetId, replacement: &AnnotatedType) -> AnnotatedType {
        match &self.base {
            TypeBase::Var(t) if t == target => {
                let mut out = replacement.clone();
                for qualifier in self.qualifiers.values() {
                    out.replace_qualifier(qualifier.clone());
                }
                out
            }
            TypeBase::Class { name, args } => AnnotatedType {
                base: TypeBase::Class {
                    name: name.clone(),
                    args: args
                        .iter()
                        .map(|a| a.substitute(target, replacement))
                        .collect(),
                },
                qualifiers: self.qualifiers.clone(),
            },
            TypeBase::Array(component) => AnnotatedType {
                base: TypeBase::Array(Box::new(component.substitute(target, replacement))),
                qualifiers: self.qualifiers.clone(),
            },
            _ => self.clone(),
        }
    }
}

impl fmt::Display for AnnotatedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for qualifier in self.qualifiers.values() {
            write!(f, "{} ", qualifier)?;
        }
        write!(f, "{}", self.base)
    }
}
