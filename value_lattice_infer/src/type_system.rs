//! The host's view of types and qualifiers.
//!
//! The solver never decides subtyping itself. It asks a [`TypeSystem`] for
//! the qualifier hierarchies, their tops and bottoms, and least upper and
//! greatest lower bounds. [`SimpleTypeSystem`] is a small nominal
//! implementation for hosts without their own type model, and for tests.

use crate::types::{AnnotatedType, Hierarchy, Qualifier, TypeBase};
use std::collections::BTreeMap;
use std::fmt;

/// Type and qualifier operations the solver needs from its host.
pub trait TypeSystem: fmt::Debug {
    /// Every qualifier hierarchy, in a stable order.
    fn hierarchies(&self) -> Vec<Hierarchy>;

    fn top(&self, hierarchy: &Hierarchy) -> Qualifier;

    fn bottom(&self, hierarchy: &Hierarchy) -> Qualifier;

    fn is_subtype_qualifier(&self, sub: &Qualifier, sup: &Qualifier) -> bool;

    fn lub_qualifier(&self, a: &Qualifier, b: &Qualifier) -> Qualifier;

    fn glb_qualifier(&self, a: &Qualifier, b: &Qualifier) -> Qualifier;

    /// Least upper bound of two underlying types.
    fn lub_base(&self, a: &TypeBase, b: &TypeBase) -> TypeBase;

    /// Greatest lower bound of two underlying types.
    fn glb_base(&self, a: &TypeBase, b: &TypeBase) -> TypeBase;

    /// The boxed class of a primitive; other types are returned unchanged.
    fn boxed(&self, base: &TypeBase) -> TypeBase;

    /// Least upper bound of two annotated types, hierarchy by hierarchy.
    fn lub(&self, a: &AnnotatedType, b: &AnnotatedType) -> AnnotatedType {
        let mut out = AnnotatedType::new(self.lub_base(&a.base, &b.base));
        for hierarchy in self.hierarchies() {
            let q = match (a.qualifier(&hierarchy), b.qualifier(&hierarchy)) {
                (Some(x), Some(y)) => Some(self.lub_qualifier(x, y)),
                (Some(x), None) | (None, Some(x)) => Some(x.clone()),
                (None, None) => None,
            };
            if let Some(q) = q {
                out.replace_qualifier(q);
            }
        }
        out
    }

    /// Greatest lower bound of two annotated types, hierarchy by hierarchy.
    fn glb(&self, a: &AnnotatedType, b: &AnnotatedType) -> AnnotatedType {
        let mut out = AnnotatedType::new(self.glb_base(&a.base, &b.base));
        for hierarchy in self.hierarchies() {
            let q = match (a.qualifier(&hierarchy), b.qualifier(&hierarchy)) {
                (Some(x), Some(y)) => Some(self.glb_qualifier(x, y)),
                (Some(x), None) | (None, Some(x)) => Some(x.clone()),
                (None, None) => None,
            };
            if let Some(q) = q {
                out.replace_qualifier(q);
            }
        }
        out
    }
}

/// A finite qualifier poset with a single top and bottom.
#[derive(Debug, Clone)]
struct QualifierPoset {
    top: String,
    bottom: String,
    /// Qualifier name to its direct supertypes; top and bottom are implicit.
    supers: BTreeMap<String, Vec<String>>,
}

impl QualifierPoset {
    fn names(&self) -> Vec<&str> {
        let mut names = vec![self.top.as_str(), self.bottom.as_str()];
        names.extend(self.supers.keys().map(String::as_str));
        names
    }

    fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup || sup == self.top || sub == self.bottom {
            return true;
        }
        let mut stack = vec![sub];
        let mut seen = Vec::new();
        while let Some(current) = stack.pop() {
            if current == sup {
                return true;
            }
            if seen.contains(&current) {
                continue;
            }
            seen.push(current);
            if let Some(parents) = self.supers.get(current) {
                stack.extend(parents.iter().map(String::as_str));
            }
        }
        false
    }

    /// The least element among the common supertypes of `a` and `b`.
    fn lub(&self, a: &str, b: &str) -> String {
        let candidates: Vec<&str> = self
            .names()
            .into_iter()
            .filter(|c| self.is_subtype(a, c) && self.is_subtype(b, c))
            .collect();
        candidates
            .iter()
            .find(|c| candidates.iter().all(|d| self.is_subtype(c, d)))
            .map(|c| c.to_string())
            .unwrap_or_else(|| self.top.clone())
    }

    /// The greatest element among the common subtypes of `a` and `b`.
    fn glb(&self, a: &str, b: &str) -> String {
        let candidates: Vec<&str> = self
            .names()
            .into_iter()
            .filter(|c| self.is_subtype(c, a) && self.is_subtype(c, b))
            .collect();
        candidates
            .iter()
            .find(|c| candidates.iter().all(|d| self.is_subtype(d, c)))
            .map(|c| c.to_string())
            .unwrap_or_else(|| self.bottom.clone())
    }
}

const OBJECT: &str = "Object";

/// Nominal classes with single inheritance, Java-style boxing, and one
/// qualifier poset per hierarchy.
///
/// # Example
/// ```
/// use value_lattice_infer::type_system::{SimpleTypeSystem, TypeSystem};
/// use value_lattice_infer::types::TypeBase;
///
/// let ts = SimpleTypeSystem::new();
/// let int = TypeBase::Primitive("int".to_string());
/// let string = TypeBase::Class { name: "String".to_string(), args: vec![] };
/// assert_eq!(ts.lub_base(&int, &string).to_string(), "Object");
/// ```
#[derive(Debug, Clone)]
pub struct SimpleTypeSystem {
    hierarchies: Vec<Hierarchy>,
    posets: BTreeMap<Hierarchy, QualifierPoset>,
    superclasses: BTreeMap<String, String>,
    boxes: BTreeMap<String, String>,
}

impl Default for SimpleTypeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleTypeSystem {
    /// Creates a type system with `Object`, `String` and the boxed primitives.
    pub fn new() -> Self {
        let mut ts = Self {
            hierarchies: Vec::new(),
            posets: BTreeMap::new(),
            superclasses: BTreeMap::new(),
            boxes: BTreeMap::new(),
        };
        ts.add_class("String", OBJECT);
        ts.add_class("Number", OBJECT);
        for (primitive, boxed, parent) in [
            ("boolean", "Boolean", OBJECT),
            ("char", "Character", OBJECT),
            ("byte", "Byte", "Number"),
            ("short", "Short", "Number"),
            ("int", "Integer", "Number"),
            ("long", "Long", "Number"),
            ("float", "Float", "Number"),
            ("double", "Double", "Number"),
        ] {
            ts.add_class(boxed, parent);
            ts.boxes.insert(primitive.to_string(), boxed.to_string());
        }
        ts
    }

    /// Adds a qualifier hierarchy with the given top and bottom qualifiers.
    pub fn add_hierarchy(&mut self, top: &str, bottom: &str) -> Hierarchy {
        let hierarchy = Hierarchy::new(top);
        self.hierarchies.push(hierarchy.clone());
        self.posets.insert(
            hierarchy.clone(),
            QualifierPoset {
                top: top.to_string(),
                bottom: bottom.to_string(),
                supers: BTreeMap::new(),
            },
        );
        hierarchy
    }

    /// Adds a qualifier below each of `supers` (or directly below top).
    pub fn add_qualifier(
        &mut self,
        hierarchy: &Hierarchy,
        name: &str,
        supers: &[&str],
    ) -> Qualifier {
        if let Some(poset) = self.posets.get_mut(hierarchy) {
            let parents = if supers.is_empty() {
                vec![poset.top.clone()]
            } else {
                supers.iter().map(|s| s.to_string()).collect()
            };
            poset.supers.insert(name.to_string(), parents);
        }
        Qualifier::new(hierarchy, name)
    }

    pub fn add_class(&mut self, name: &str, superclass: &str) {
        self.superclasses
            .insert(name.to_string(), superclass.to_string());
    }

    /// `name` followed by its superclasses, ending at `Object`.
    fn ancestors(&self, name: &str) -> Vec<String> {
        let mut chain = vec![name.to_string()];
        let mut current = name;
        while let Some(parent) = self.superclasses.get(current) {
            if chain.contains(parent) {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }
        if chain.last().map(String::as_str) != Some(OBJECT) {
            chain.push(OBJECT.to_string());
        }
        chain
    }

    pub fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        self.ancestors(sub).iter().any(|a| a == sup)
    }

    fn object() -> TypeBase {
        TypeBase::Class {
            name: OBJECT.to_string(),
            args: Vec::new(),
        }
    }
}

impl TypeSystem for SimpleTypeSystem {
    fn hierarchies(&self) -> Vec<Hierarchy> {
        self.hierarchies.clone()
    }

    fn top(&self, hierarchy: &Hierarchy) -> Qualifier {
        let name = self
            .posets
            .get(hierarchy)
            .map(|p| p.top.clone())
            .unwrap_or_else(|| hierarchy.name().to_string());
        Qualifier::new(hierarchy, name)
    }

    fn bottom(&self, hierarchy: &Hierarchy) -> Qualifier {
        let name = self
            .posets
            .get(hierarchy)
            .map(|p| p.bottom.clone())
            .unwrap_or_else(|| hierarchy.name().to_string());
        Qualifier::new(hierarchy, name)
    }

    fn is_subtype_qualifier(&self, sub: &Qualifier, sup: &Qualifier) -> bool {
        if sub.hierarchy != sup.hierarchy {
            return false;
        }
        self.posets
            .get(&sub.hierarchy)
            .is_some_and(|p| p.is_subtype(&sub.name, &sup.name))
    }

    fn lub_qualifier(&self, a: &Qualifier, b: &Qualifier) -> Qualifier {
        match self.posets.get(&a.hierarchy) {
            Some(poset) => Qualifier::new(&a.hierarchy, poset.lub(&a.name, &b.name)),
            None => a.clone(),
        }
    }

    fn glb_qualifier(&self, a: &Qualifier, b: &Qualifier) -> Qualifier {
        match self.posets.get(&a.hierarchy) {
            Some(poset) => Qualifier::new(&a.hierarchy, poset.glb(&a.name, &b.name)),
            None => a.clone(),
        }
    }

    fn lub_base(&self, a: &TypeBase, b: &TypeBase) -> TypeBase {
        if a == b {
            return a.clone();
        }
        match (a, b) {
            (TypeBase::Primitive(_), _) | (_, TypeBase::Primitive(_)) => {
                let (ba, bb) = (self.boxed(a), self.boxed(b));
                if ba.is_primitive() || bb.is_primitive() {
                    Self::object()
                } else {
                    self.lub_base(&ba, &bb)
                }
            }
            (TypeBase::Class { name: na, .. }, TypeBase::Class { name: nb, .. }) => {
                if self.is_subclass(na, nb) && na != nb {
                    return b.clone();
                }
                if self.is_subclass(nb, na) && na != nb {
                    return a.clone();
                }
                // Same class with different arguments erases to the raw class.
                let common = self
                    .ancestors(na)
                    .into_iter()
                    .find(|c| self.is_subclass(nb, c))
                    .unwrap_or_else(|| OBJECT.to_string());
                TypeBase::Class {
                    name: common,
                    args: Vec::new(),
                }
            }
            _ => Self::object(),
        }
    }

    fn glb_base(&self, a: &TypeBase, b: &TypeBase) -> TypeBase {
        if a == b {
            return a.clone();
        }
        match (self.boxed(a), self.boxed(b)) {
            (TypeBase::Class { name: na, .. }, TypeBase::Class { name: nb, .. }) => {
                if self.is_subclass(&nb, &na) && !self.is_subclass(&na, &nb) {
                    b.clone()
                } else {
                    // Intersection types are not modeled; the first operand wins.
                    a.clone()
                }
            }
            _ => a.clone(),
        }
    }

    fn boxed(&self, base: &TypeBase) -> TypeBase {
        match base {
            TypeBase::Primitive(name) => match self.boxes.get(name) {
                Some(class) => TypeBase::Class {
                    name: class.clone(),
                    args: Vec::new(),
                },
                None => base.clone(),
            },
            _ => base.clone(),
        }
    }
}
