//! Resolved type model.
//!
//! Simple and complex type definitions live in two arenas owned by a
//! [`SchemaSet`]; a [`Type`] is a small handle into them (or a builtin).
//! Handles make recursive type graphs (an element whose type contains
//! itself) representable without reference cycles.

use std::fmt;

use crate::FastIndexMap;
use crate::qname::{QName, XS_NS};

use super::builtin::Builtin;

/// Handle of a [`SimpleType`] in its [`SchemaSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimpleId(pub(crate) u32);

/// Handle of a [`ComplexType`] in its [`SchemaSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComplexId(pub(crate) u32);

/// A type reference.
///
/// `Linked` is a placeholder that only exists while a schema set is being
/// resolved. A `SchemaSet` returned from [`crate::xsd::parse`] never contains
/// one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Builtin(Builtin),
    Simple(SimpleId),
    Complex(ComplexId),
    Linked(QName),
}

impl Type {
    #[inline]
    pub fn is_linked(&self) -> bool {
        matches!(self, Type::Linked(_))
    }
}

impl From<Builtin> for Type {
    fn from(b: Builtin) -> Self {
        Type::Builtin(b)
    }
}

/// Value of a `min*`/`max*` facet.
#[derive(Debug, Clone, PartialEq)]
pub enum FacetValue {
    Number(f64),
    /// Lexical date, time or duration value, kept verbatim.
    Temporal(String),
}

/// A lower or upper bound facet.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub value: FacetValue,
    pub inclusive: bool,
}

/// Restriction facets. Informational only; nothing is validated against them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Restriction {
    pub enumeration: Vec<String>,
    /// Anchored pattern, already checked to compile.
    pub pattern: Option<String>,
    pub min: Option<Bound>,
    pub max: Option<Bound>,
    pub length: Option<u64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub total_digits: Option<u32>,
    pub fraction_digits: Option<u32>,
}

impl Restriction {
    pub fn is_empty(&self) -> bool {
        *self == Restriction::default()
    }
}

/// A `<simpleType>`: restriction, list or union of a base type.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleType {
    pub name: QName,
    /// The name was synthesized during normalization.
    pub anonymous: bool,
    pub base: Type,
    /// Whitespace-separated list of `base` values.
    pub list: bool,
    /// Member types of a union; empty otherwise.
    pub union: Vec<Type>,
    pub restriction: Restriction,
    pub doc: String,
}

/// A `<complexType>`, always derived from a base by extension or restriction.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexType {
    pub name: QName,
    pub anonymous: bool,
    pub base: Type,
    pub elements: Vec<Element>,
    pub attributes: Vec<Attribute>,
    /// Derived by extension (`false`: by restriction).
    pub extends: bool,
    pub is_abstract: bool,
    /// Character data may appear between child elements.
    pub mixed: bool,
    pub doc: String,
}

/// A slot in a complex type's content model.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: QName,
    pub ty: Type,
    /// May occur more than once.
    pub plural: bool,
    /// `minOccurs="0"` or has a default value.
    pub optional: bool,
    pub nillable: bool,
    /// `<any>`: matches any element.
    pub wildcard: bool,
    pub is_abstract: bool,
    pub default: Option<String>,
    pub doc: String,
}

/// An XML attribute of a complex type.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: QName,
    pub ty: Type,
    pub optional: bool,
    pub default: Option<String>,
    pub doc: String,
}

/// One target namespace's worth of declarations.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub target_ns: String,
    /// Canonical name → type. Includes top-level element aliases and `_self`.
    pub types: FastIndexMap<QName, Type>,
    pub doc: String,
}

impl Schema {
    pub fn new(target_ns: impl Into<String>) -> Self {
        Self {
            target_ns: target_ns.into(),
            ..Self::default()
        }
    }

    /// Looks up a type by local name in this schema's namespace.
    pub fn get(&self, local: &str) -> Option<&Type> {
        self.types.get(&QName::new(self.target_ns.as_str(), local))
    }
}

/// Borrowed view of whatever a [`Type`] handle points to.
///
/// Borgt nur aus dem [`SchemaSet`], nicht aus dem Handle.
#[derive(Debug, Clone)]
pub enum TypeDef<'a> {
    Builtin(Builtin),
    Simple(&'a SimpleType),
    Complex(&'a ComplexType),
    Linked(QName),
}

/// Mutable view handed to user transforms.
#[derive(Debug)]
pub enum TypeDefMut<'a> {
    Simple(&'a mut SimpleType),
    Complex(&'a mut ComplexType),
}

/// Every schema of a parse run plus the arenas their types live in.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    simple: Vec<SimpleType>,
    complex: Vec<ComplexType>,
    schemas: Vec<Schema>,
}

impl SchemaSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_simple(&mut self, t: SimpleType) -> SimpleId {
        self.simple.push(t);
        SimpleId(self.simple.len() as u32 - 1)
    }

    pub(crate) fn push_complex(&mut self, t: ComplexType) -> ComplexId {
        self.complex.push(t);
        ComplexId(self.complex.len() as u32 - 1)
    }

    pub(crate) fn complex_mut(&mut self, id: ComplexId) -> &mut ComplexType {
        &mut self.complex[id.0 as usize]
    }

    pub(crate) fn simple_types_mut(&mut self) -> impl Iterator<Item = &mut SimpleType> {
        self.simple.iter_mut()
    }

    pub(crate) fn complex_types_mut(&mut self) -> impl Iterator<Item = &mut ComplexType> {
        self.complex.iter_mut()
    }

    pub(crate) fn schemas_mut(&mut self) -> &mut Vec<Schema> {
        &mut self.schemas
    }

    /// All schemas; the builtin pseudo-schema comes last.
    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    /// Schema for a target namespace.
    pub fn schema(&self, target_ns: &str) -> Option<&Schema> {
        self.schemas.iter().find(|s| s.target_ns == target_ns)
    }

    pub fn simple(&self, id: SimpleId) -> &SimpleType {
        &self.simple[id.0 as usize]
    }

    pub fn complex(&self, id: ComplexId) -> &ComplexType {
        &self.complex[id.0 as usize]
    }

    pub fn simple_types(&self) -> impl Iterator<Item = (SimpleId, &SimpleType)> {
        self.simple
            .iter()
            .enumerate()
            .map(|(i, t)| (SimpleId(i as u32), t))
    }

    pub fn complex_types(&self) -> impl Iterator<Item = (ComplexId, &ComplexType)> {
        self.complex
            .iter()
            .enumerate()
            .map(|(i, t)| (ComplexId(i as u32), t))
    }

    /// Dereferences a handle.
    pub fn get(&self, ty: &Type) -> TypeDef<'_> {
        match ty {
            Type::Builtin(b) => TypeDef::Builtin(*b),
            Type::Simple(id) => TypeDef::Simple(self.simple(*id)),
            Type::Complex(id) => TypeDef::Complex(self.complex(*id)),
            Type::Linked(name) => TypeDef::Linked(name.clone()),
        }
    }

    /// Canonical name of any type.
    pub fn type_name(&self, ty: &Type) -> QName {
        match self.get(ty) {
            TypeDef::Builtin(b) => b.name(),
            TypeDef::Simple(s) => s.name.clone(),
            TypeDef::Complex(c) => c.name.clone(),
            TypeDef::Linked(name) => name,
        }
    }

    /// Base type; `None` for builtins and placeholders.
    pub fn base(&self, ty: &Type) -> Option<&Type> {
        match ty {
            Type::Simple(id) => Some(&self.simple(*id).base),
            Type::Complex(id) => Some(&self.complex(*id).base),
            Type::Builtin(_) | Type::Linked(_) => None,
        }
    }

    /// Follows `base` until a builtin is reached.
    ///
    /// Returns `None` if the chain hits a placeholder or is longer than the
    /// number of types in the set (i.e. cyclic).
    pub fn root_builtin(&self, ty: &Type) -> Option<Builtin> {
        let mut current = ty;
        for _ in 0..=(self.simple.len() + self.complex.len()) {
            match current {
                Type::Builtin(b) => return Some(*b),
                Type::Linked(_) => return None,
                other => current = self.base(other)?,
            }
        }
        None
    }

    /// Looks up a type by canonical name across every schema and builtins.
    pub fn find_type(&self, name: &QName) -> Option<Type> {
        if let Some(b) = super::builtin::Builtin::from_name(name) {
            return Some(Type::Builtin(b));
        }
        self.schemas
            .iter()
            .filter(|s| *s.target_ns == *name.uri)
            .find_map(|s| s.types.get(name).cloned())
    }

    /// The builtin pseudo-schema (`http://www.w3.org/2001/XMLSchema`).
    pub(crate) fn builtin_schema() -> Schema {
        let mut schema = Schema::new(XS_NS);
        for &b in Builtin::ALL {
            schema.types.insert(b.name(), Type::Builtin(b));
        }
        schema
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Builtin(b) => write!(f, "{b}"),
            Type::Simple(id) => write!(f, "simple#{}", id.0),
            Type::Complex(id) => write!(f, "complex#{}", id.0),
            Type::Linked(name) => write!(f, "linked({name})"),
        }
    }
}
