//! Type Parser/Resolver: normalized schema trees → [`SchemaSet`].
//!
//! Ablauf:
//!
//! 1. jedes `<schema>` wird einzeln geparst; Typreferenzen bleiben dabei
//!    [`Type::Linked`]-Platzhalter
//! 2. Schemas mit gleichem targetNamespace werden zusammengeführt
//! 3. alle Platzhalter werden gegen Builtins und die globale Typ-Map
//!    aufgelöst
//! 4. `mixed` wird entlang von Extension-Ketten propagiert
//! 5. Top-Level-Elemente werden als Typ-Aliase registriert
//! 6. Transforms aus der [`Config`] laufen
//! 7. Invarianten (keine Platzhalter, Basisketten enden in Builtins)

use log::{debug, warn};
use regex::Regex;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::qname::{QName, XS_NS};
use crate::xml::{NodeId, Tree};
use crate::{FastHashMap, FastIndexMap};

use super::builtin::Builtin;
use super::normalize::{normalize, Normalized};
use super::predicate::{children, is, or};
use super::types::{
    Attribute, Bound, ComplexType, Element, FacetValue, Restriction, Schema, SchemaSet,
    SimpleType, Type, TypeDefMut,
};
use super::{breadcrumbs, documentation};

/// Local name of the synthetic complex type listing a namespace's
/// top-level elements.
pub const SELF_TYPE: &str = "_self";

/// Upper bound of an occurrence range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    /// More than one occurrence allowed.
    pub fn is_plural(self) -> bool {
        match self {
            MaxOccurs::Bounded(n) => n > 1,
            MaxOccurs::Unbounded => true,
        }
    }
}

/// Parses `minOccurs`/`maxOccurs`. Absent or empty means 1.
pub fn parse_occurs(min: Option<&str>, max: Option<&str>) -> Result<(u32, MaxOccurs)> {
    let min = match min.map(str::trim) {
        None | Some("") => 1,
        Some(v) => v.parse().map_err(|_| Error::invalid_value("minOccurs", v))?,
    };
    let max = match max.map(str::trim) {
        None | Some("") => MaxOccurs::Bounded(1),
        Some("unbounded") => MaxOccurs::Unbounded,
        Some(v) => MaxOccurs::Bounded(v.parse().map_err(|_| Error::invalid_value("maxOccurs", v))?),
    };
    Ok((min, max))
}

/// Parses an XSD boolean. Absent or empty means `false`.
pub fn parse_bool(attribute: &str, value: Option<&str>) -> Result<bool> {
    match value.map(str::trim) {
        None | Some("" | "false" | "0") => Ok(false),
        Some("true" | "1") => Ok(true),
        Some(v) => Err(Error::invalid_value(attribute, v)),
    }
}

/// Cardinality inherited from enclosing compositors.
#[derive(Debug, Clone, Copy, Default)]
struct Occurs {
    optional: bool,
    plural: bool,
}

impl Occurs {
    fn nest(self, min: u32, max: MaxOccurs) -> Occurs {
        Occurs {
            optional: self.optional || min == 0,
            plural: self.plural || max.is_plural(),
        }
    }
}

/// Normalizes and resolves `docs` into a [`SchemaSet`].
///
/// # Beispiel
///
/// ```
/// use xsdgen::config::Config;
/// use xsdgen::qname::QName;
/// use xsdgen::xsd::{parse, Builtin, Type, TypeDef};
///
/// let xsd = r#"
///     <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:w">
///       <xs:element name="Widget">
///         <xs:complexType><xs:sequence>
///           <xs:element name="Count" type="xs:int" minOccurs="0"/>
///         </xs:sequence></xs:complexType>
///       </xs:element>
///     </xs:schema>"#;
///
/// let set = parse(&[xsd], &Config::default()).unwrap();
/// let widget = set.find_type(&QName::new("urn:w", "Widget")).unwrap();
/// let TypeDef::Complex(widget) = set.get(&widget) else { panic!() };
/// assert_eq!(widget.elements[0].ty, Type::Builtin(Builtin::Int));
/// assert!(widget.elements[0].optional);
/// ```
pub fn parse(docs: &[&str], config: &Config) -> Result<SchemaSet> {
    let normalized = normalize(docs, config)?;
    resolve(&normalized, config)
}

/// Builds the type model from already normalized trees.
pub fn resolve(normalized: &Normalized, config: &Config) -> Result<SchemaSet> {
    let mut parser = Parser {
        tree: &normalized.tree,
        normalized,
        set: SchemaSet::new(),
        schemas: FastIndexMap::default(),
        roots: Vec::new(),
    };
    for &schema in &normalized.schemas {
        parser.parse_schema(schema)?;
    }
    let Parser {
        mut set,
        mut schemas,
        mut roots,
        ..
    } = parser;

    let global: FastHashMap<QName, Type> = schemas
        .values()
        .flat_map(|s| s.types.iter().map(|(n, t)| (n.clone(), t.clone())))
        .collect();
    link_types(&mut set, &global)?;
    for (name, ty) in &mut roots {
        link(&global, ty, || format!("element \"{name}\""))?;
    }

    propagate_mixed(&mut set);

    for (name, ty) in roots {
        if let Some(schema) = schemas.get_mut(&*name.uri) {
            schema.types.entry(name).or_insert(ty);
        }
    }

    for transform in config.transforms() {
        for st in set.simple_types_mut() {
            transform(TypeDefMut::Simple(st));
        }
        for ct in set.complex_types_mut() {
            transform(TypeDefMut::Complex(ct));
        }
    }

    let out = set.schemas_mut();
    out.extend(schemas.into_values());
    out.push(SchemaSet::builtin_schema());

    check_invariants(&set)?;
    debug!(
        "resolved {} schemas ({} simple, {} complex types)",
        set.schemas().len(),
        set.simple_types().count(),
        set.complex_types().count()
    );
    Ok(set)
}

struct Parser<'n> {
    tree: &'n Tree,
    normalized: &'n Normalized,
    set: SchemaSet,
    /// Per target namespace, in order of first appearance.
    schemas: FastIndexMap<String, Schema>,
    /// Top-level elements, for aliasing once their types are known.
    roots: Vec<(QName, Type)>,
}

impl Parser<'_> {
    fn parse_schema(&mut self, schema: NodeId) -> Result<()> {
        let tree = self.tree;
        let tns = self.normalized.target_ns(schema).to_string();
        let mut types: Vec<(QName, Type)> = Vec::new();
        let mut top_elements = Vec::new();

        for &child in &tree[schema].children {
            let el = &tree[child];
            if !el.name.is_xs() {
                continue;
            }
            match el.local() {
                "complexType" => {
                    let id = self.parse_complex(child, &tns)?;
                    types.push((self.set.complex(id).name.clone(), Type::Complex(id)));
                }
                "simpleType" => {
                    let id = self.parse_simple(child, &tns)?;
                    types.push((self.set.simple(id).name.clone(), Type::Simple(id)));
                }
                "element" => {
                    let element = self.parse_element(child, &tns, Occurs::default())?;
                    self.roots.push((element.name.clone(), element.ty.clone()));
                    top_elements.push(element);
                }
                _ => {}
            }
        }

        let entry = self
            .schemas
            .entry(tns.clone())
            .or_insert_with(|| Schema::new(tns.as_str()));
        let doc = documentation(tree, schema);
        if !doc.is_empty() {
            if !entry.doc.is_empty() {
                entry.doc.push_str("\n\n");
            }
            entry.doc.push_str(&doc);
        }

        let count = types.len();
        for (name, ty) in types {
            if entry.types.contains_key(&name) {
                return Err(Error::DuplicateType {
                    namespace: tns,
                    name: name.local_name.to_string(),
                });
            }
            entry.types.insert(name, ty);
        }

        if !top_elements.is_empty() {
            let self_name = QName::new(tns.as_str(), SELF_TYPE);
            match entry.types.get(&self_name) {
                Some(Type::Complex(id)) => self.set.complex_mut(*id).elements.extend(top_elements),
                _ => {
                    let id = self.set.push_complex(ComplexType {
                        name: self_name.clone(),
                        anonymous: true,
                        base: Type::Builtin(Builtin::AnyType),
                        elements: top_elements,
                        attributes: Vec::new(),
                        extends: false,
                        is_abstract: false,
                        mixed: false,
                        doc: String::new(),
                    });
                    entry.types.insert(self_name, Type::Complex(id));
                }
            }
        }
        debug!("schema {tns:?}: {count} types");
        Ok(())
    }

    // ========================================================================
    // Typen
    // ========================================================================

    fn parse_complex(&mut self, node: NodeId, tns: &str) -> Result<super::types::ComplexId> {
        let tree = self.tree;
        let mut ct = ComplexType {
            name: self.declared_name(node, tns)?,
            anonymous: self.normalized.is_anonymous(node),
            base: Type::Builtin(Builtin::AnyType),
            elements: Vec::new(),
            attributes: Vec::new(),
            extends: false,
            is_abstract: self.flag(node, "abstract")?,
            mixed: self.flag(node, "mixed")?,
            doc: documentation(tree, node),
        };

        let content = children(tree, node, or(is("complexContent"), is("simpleContent")));
        if let Some(&content) = content.first() {
            ct.mixed |= self.flag(content, "mixed")?;
            let derivation = children(tree, content, or(is("restriction"), is("extension")));
            if let Some(&derivation) = derivation.first() {
                ct.extends = tree[derivation].is(XS_NS, "extension");
                ct.base = self.type_ref(derivation, "base", tns)?;
                self.collect(derivation, tns, Occurs::default(), &mut ct)?;
            }
        }
        Ok(self.set.push_complex(ct))
    }

    /// Gathers elements and attributes below a derivation node.
    fn collect(
        &self,
        parent: NodeId,
        tns: &str,
        occurs: Occurs,
        ct: &mut ComplexType,
    ) -> Result<()> {
        let tree = self.tree;
        for &child in &tree[parent].children {
            let el = &tree[child];
            if !el.name.is_xs() {
                continue;
            }
            match el.local() {
                "element" => ct.elements.push(self.parse_element(child, tns, occurs)?),
                "any" => ct.elements.push(self.parse_any(child, occurs)?),
                "attribute" => {
                    if let Some(attr) = self.parse_attribute(child, tns)? {
                        ct.attributes.push(attr);
                    }
                }
                "sequence" | "choice" | "all" | "group" => {
                    let (min, max) = self.occurs(child)?;
                    self.collect(child, tns, occurs.nest(min, max), ct)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_simple(&mut self, node: NodeId, tns: &str) -> Result<super::types::SimpleId> {
        let tree = self.tree;
        let mut st = SimpleType {
            name: self.declared_name(node, tns)?,
            anonymous: self.normalized.is_anonymous(node),
            base: Type::Builtin(Builtin::AnySimpleType),
            list: false,
            union: Vec::new(),
            restriction: Restriction::default(),
            doc: documentation(tree, node),
        };

        let derivation = children(tree, node, or(or(is("restriction"), is("list")), is("union")));
        if let Some(&d) = derivation.first() {
            match tree[d].local() {
                "restriction" => {
                    st.base = self.type_ref(d, "base", tns)?;
                    st.restriction = parse_restriction(tree, d, &st.name, &mut st.doc);
                }
                "list" => {
                    st.base = self.type_ref(d, "itemType", tns)?;
                    st.list = true;
                }
                _ => {
                    st.union = tree
                        .attr(d, "memberTypes")
                        .unwrap_or_default()
                        .split_whitespace()
                        .map(|m| self.qname(d, m, tns).map(Type::Linked))
                        .collect::<Result<_>>()?;
                }
            }
        }
        Ok(self.set.push_simple(st))
    }

    // ========================================================================
    // Elemente und Attribute
    // ========================================================================

    fn parse_element(&self, node: NodeId, tns: &str, occurs: Occurs) -> Result<Element> {
        let tree = self.tree;
        let (min, max) = self.occurs(node)?;
        let occurs = occurs.nest(min, max);
        let default = tree
            .attr(node, "default")
            .or_else(|| tree.attr(node, "fixed"))
            .map(str::to_string);
        Ok(Element {
            name: self.declared_name(node, tns)?,
            ty: self.type_ref(node, "type", tns)?,
            plural: occurs.plural,
            optional: occurs.optional || default.is_some(),
            nillable: self.flag(node, "nillable")?,
            wildcard: false,
            is_abstract: self.flag(node, "abstract")?,
            default,
            doc: documentation(tree, node),
        })
    }

    fn parse_any(&self, node: NodeId, occurs: Occurs) -> Result<Element> {
        let (min, max) = self.occurs(node)?;
        let occurs = occurs.nest(min, max);
        Ok(Element {
            name: QName::xs("any"),
            ty: Type::Builtin(Builtin::AnyType),
            plural: occurs.plural,
            optional: occurs.optional,
            nillable: false,
            wildcard: true,
            is_abstract: false,
            default: None,
            doc: documentation(self.tree, node),
        })
    }

    /// `None` for `use="prohibited"`.
    fn parse_attribute(&self, node: NodeId, tns: &str) -> Result<Option<Attribute>> {
        let tree = self.tree;
        let usage = tree.attr(node, "use").map(str::trim).unwrap_or("optional");
        if usage == "prohibited" {
            return Ok(None);
        }
        let default = tree
            .attr(node, "default")
            .or_else(|| tree.attr(node, "fixed"))
            .map(str::to_string);
        Ok(Some(Attribute {
            name: self.declared_name(node, tns)?,
            ty: self.type_ref(node, "type", tns)?,
            optional: usage != "required",
            default,
            doc: documentation(tree, node),
        }))
    }

    // ========================================================================
    // Attribut-Helfer (Fehler tragen den Ort)
    // ========================================================================

    fn at<T>(&self, node: NodeId, result: Result<T>) -> Result<T> {
        breadcrumbs(self.tree, node, result)
    }

    /// Canonical name of a declaration. Names re-prefixed by ref flattening
    /// carry their own namespace; plain names belong to `tns`.
    fn declared_name(&self, node: NodeId, tns: &str) -> Result<QName> {
        let tree = self.tree;
        let name = match tree.attr(node, "name").map(str::trim) {
            Some(n) if !n.is_empty() => n,
            _ => {
                return self.at(
                    node,
                    Err(Error::MissingAttribute {
                        element: tree[node].local().to_string(),
                        attribute: "name",
                    }),
                );
            }
        };
        if name.contains(':') {
            self.qname(node, name, tns)
        } else {
            Ok(QName::new(tns, name))
        }
    }

    fn qname(&self, node: NodeId, value: &str, tns: &str) -> Result<QName> {
        self.at(node, self.tree.resolve(node, value, tns))
    }

    fn type_ref(&self, node: NodeId, attr: &'static str, tns: &str) -> Result<Type> {
        match self.tree.attr(node, attr) {
            Some(value) => self.qname(node, value, tns).map(Type::Linked),
            None => self.at(
                node,
                Err(Error::MissingAttribute {
                    element: self.tree[node].local().to_string(),
                    attribute: attr,
                }),
            ),
        }
    }

    fn occurs(&self, node: NodeId) -> Result<(u32, MaxOccurs)> {
        let tree = self.tree;
        self.at(
            node,
            parse_occurs(tree.attr(node, "minOccurs"), tree.attr(node, "maxOccurs")),
        )
    }

    fn flag(&self, node: NodeId, attr: &str) -> Result<bool> {
        self.at(node, parse_bool(attr, self.tree.attr(node, attr)))
    }
}

// ========================================================================
// Facetten (nicht fatal)
// ========================================================================

fn parse_restriction(tree: &Tree, node: NodeId, name: &QName, doc: &mut String) -> Restriction {
    let mut r = Restriction::default();
    let mut patterns: Vec<&str> = Vec::new();
    for &facet in &tree[node].children {
        let el = &tree[facet];
        if !el.name.is_xs() {
            continue;
        }
        let Some(value) = el.attr("value") else {
            continue;
        };
        let local = el.local();
        let outcome = match local {
            "enumeration" => {
                r.enumeration.push(value.to_string());
                Ok(())
            }
            "pattern" => {
                patterns.push(value);
                Ok(())
            }
            "minInclusive" => parse_bound(value, true).map(|b| r.min = Some(b)),
            "minExclusive" => parse_bound(value, false).map(|b| r.min = Some(b)),
            "maxInclusive" => parse_bound(value, true).map(|b| r.max = Some(b)),
            "maxExclusive" => parse_bound(value, false).map(|b| r.max = Some(b)),
            "length" => parse_count(value).map(|n| r.length = Some(n)),
            "minLength" => parse_count(value).map(|n| r.min_length = Some(n)),
            "maxLength" => parse_count(value).map(|n| r.max_length = Some(n)),
            "totalDigits" => parse_count(value).map(|n| r.total_digits = Some(n)),
            "fractionDigits" => parse_count(value).map(|n| r.fraction_digits = Some(n)),
            _ => Ok(()),
        };
        if let Err(reason) = outcome {
            drop_facet(name, doc, local, &reason);
        }
    }

    if !patterns.is_empty() {
        // Mehrere pattern-Facetten derselben Restriction sind ODER-verknüpft.
        let combined = if patterns.len() == 1 {
            patterns[0].to_string()
        } else {
            patterns
                .iter()
                .map(|p| format!("(?:{p})"))
                .collect::<Vec<_>>()
                .join("|")
        };
        let anchored = format!("^(?:{combined})$");
        match Regex::new(&anchored) {
            Ok(_) => r.pattern = Some(anchored),
            Err(_) => drop_facet(
                name,
                doc,
                "pattern",
                &format!("unsupported regular expression {combined:?}"),
            ),
        }
    }
    r
}

fn parse_bound(value: &str, inclusive: bool) -> std::result::Result<Bound, String> {
    let v = value.trim();
    let value = if let Ok(n) = v.parse::<f64>() {
        FacetValue::Number(n)
    } else if is_temporal_lexical(v) {
        FacetValue::Temporal(v.to_string())
    } else {
        return Err(format!("cannot interpret {v:?}"));
    };
    Ok(Bound { value, inclusive })
}

fn parse_count<T: std::str::FromStr>(value: &str) -> std::result::Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{value:?} is not a non-negative integer"))
}

/// Lexical shape of date, time and duration values (`2001-10-26`,
/// `13:20:00Z`, `P1Y2M`).
fn is_temporal_lexical(v: &str) -> bool {
    v.chars().any(|c| c.is_ascii_digit())
        && v.chars()
            .all(|c| c.is_ascii_digit() || "-:TZ.+PYMDHS".contains(c))
}

fn drop_facet(name: &QName, doc: &mut String, facet: &str, reason: &str) {
    warn!("{name}: {facet} restriction dropped: {reason}");
    if !doc.is_empty() {
        doc.push('\n');
    }
    doc.push_str(&format!("{facet} restriction dropped: {reason}"));
}

// ========================================================================
// Auflösung
// ========================================================================

fn link(
    global: &FastHashMap<QName, Type>,
    ty: &mut Type,
    context: impl FnOnce() -> String,
) -> Result<()> {
    let Type::Linked(name) = ty else {
        return Ok(());
    };
    let resolved = Builtin::from_name(name)
        .map(Type::Builtin)
        .or_else(|| global.get(name).cloned());
    match resolved {
        Some(t) => {
            *ty = t;
            Ok(())
        }
        None => Err(Error::UnresolvedType {
            name: name.to_string(),
            context: context(),
        }),
    }
}

/// Replaces every placeholder in the arenas by the type it names.
fn link_types(set: &mut SchemaSet, global: &FastHashMap<QName, Type>) -> Result<()> {
    for st in set.simple_types_mut() {
        let name = &st.name;
        link(global, &mut st.base, || format!("base of simpleType \"{name}\""))?;
        for member in &mut st.union {
            link(global, member, || format!("union member of simpleType \"{name}\""))?;
        }
    }
    for ct in set.complex_types_mut() {
        let name = &ct.name;
        link(global, &mut ct.base, || format!("base of complexType \"{name}\""))?;
        for el in &mut ct.elements {
            let el_name = &el.name;
            link(global, &mut el.ty, || {
                format!("element \"{el_name}\" in complexType \"{name}\"")
            })?;
        }
        for attr in &mut ct.attributes {
            let attr_name = &attr.name;
            link(global, &mut attr.ty, || {
                format!("attribute \"{attr_name}\" in complexType \"{name}\"")
            })?;
        }
    }
    Ok(())
}

/// A type extending a mixed complex type is mixed itself.
fn propagate_mixed(set: &mut SchemaSet) {
    loop {
        let pending: Vec<_> = set
            .complex_types()
            .filter(|(_, ct)| ct.extends && !ct.mixed)
            .filter(|(_, ct)| matches!(ct.base, Type::Complex(b) if set.complex(b).mixed))
            .map(|(id, _)| id)
            .collect();
        if pending.is_empty() {
            return;
        }
        for id in pending {
            set.complex_mut(id).mixed = true;
        }
    }
}

fn check_invariants(set: &SchemaSet) -> Result<()> {
    let leaked = |ty: &Type, context: &dyn Fn() -> String| match ty {
        Type::Linked(name) => Err(Error::UnresolvedType {
            name: name.to_string(),
            context: context(),
        }),
        _ => Ok(()),
    };
    for (id, st) in set.simple_types() {
        let context = || format!("simpleType \"{}\"", st.name);
        for ty in std::iter::once(&st.base).chain(&st.union) {
            leaked(ty, &context)?;
        }
        if set.root_builtin(&Type::Simple(id)).is_none() {
            return Err(Error::BaseCycle {
                name: st.name.to_string(),
            });
        }
    }
    for (id, ct) in set.complex_types() {
        let context = || format!("complexType \"{}\"", ct.name);
        let fields = ct
            .elements
            .iter()
            .map(|e| &e.ty)
            .chain(ct.attributes.iter().map(|a| &a.ty));
        for ty in std::iter::once(&ct.base).chain(fields) {
            leaked(ty, &context)?;
        }
        if set.root_builtin(&Type::Complex(id)).is_none() {
            return Err(Error::BaseCycle {
                name: ct.name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const XS: &str = r#"xmlns:xs="http://www.w3.org/2001/XMLSchema""#;

    fn bare() -> Config {
        Config::default().without_standard_schemas()
    }

    fn parse_one(doc: &str) -> SchemaSet {
        parse(&[doc], &bare()).unwrap()
    }

    fn complex<'a>(set: &'a SchemaSet, ns: &str, local: &str) -> &'a ComplexType {
        set.complex_types()
            .map(|(_, ct)| ct)
            .find(|ct| ct.name == QName::new(ns, local))
            .unwrap_or_else(|| panic!("no complex type {local}"))
    }

    fn simple<'a>(set: &'a SchemaSet, ns: &str, local: &str) -> &'a SimpleType {
        set.simple_types()
            .map(|(_, st)| st)
            .find(|st| st.name == QName::new(ns, local))
            .unwrap_or_else(|| panic!("no simple type {local}"))
    }

    #[test]
    fn occurs_parsing() {
        assert_eq!(parse_occurs(None, None).unwrap(), (1, MaxOccurs::Bounded(1)));
        assert_eq!(parse_occurs(Some(""), Some("")).unwrap(), (1, MaxOccurs::Bounded(1)));
        assert_eq!(
            parse_occurs(Some("0"), Some("unbounded")).unwrap(),
            (0, MaxOccurs::Unbounded)
        );
        assert_eq!(parse_occurs(Some("2"), Some("5")).unwrap(), (2, MaxOccurs::Bounded(5)));
        assert!(matches!(
            parse_occurs(Some("many"), None),
            Err(Error::InvalidValue { .. })
        ));
        assert!(parse_occurs(None, Some("-1")).is_err());
    }

    #[test]
    fn bool_parsing() {
        assert!(!parse_bool("a", None).unwrap());
        assert!(!parse_bool("a", Some("")).unwrap());
        assert!(!parse_bool("a", Some("0")).unwrap());
        assert!(parse_bool("a", Some("1")).unwrap());
        assert!(parse_bool("a", Some("true")).unwrap());
        assert!(parse_bool("a", Some("yes")).is_err());
    }

    #[test]
    fn widget_round_trip() {
        let set = parse_one(&format!(
            r#"<xs:schema {XS} targetNamespace="urn:w">
                 <xs:element name="Widget"><xs:complexType><xs:sequence>
                   <xs:element name="Count" type="xs:int" minOccurs="0"/>
                 </xs:sequence></xs:complexType></xs:element>
               </xs:schema>"#
        ));
        let widgets: Vec<_> = set
            .complex_types()
            .filter(|(_, ct)| ct.name == QName::new("urn:w", "Widget"))
            .collect();
        assert_eq!(widgets.len(), 1);
        let widget = widgets[0].1;
        assert_eq!(widget.elements.len(), 1);
        let count = &widget.elements[0];
        assert_eq!(count.name, QName::new("urn:w", "Count"));
        assert_eq!(count.ty, Type::Builtin(Builtin::Int));
        assert!(count.optional);
        assert!(!count.plural);
    }

    #[test]
    fn choice_branches_are_optional() {
        let set = parse_one(&format!(
            r#"<xs:schema {XS}>
                 <xs:complexType name="C"><xs:choice>
                   <xs:element name="A" type="xs:string"/>
                   <xs:element name="B" type="xs:string"/>
                 </xs:choice></xs:complexType>
               </xs:schema>"#
        ));
        let c = complex(&set, "", "C");
        assert_eq!(c.elements.len(), 2);
        assert!(c.elements.iter().all(|e| e.optional));
    }

    #[test]
    fn compositor_cardinality_is_inherited() {
        let set = parse_one(&format!(
            r#"<xs:schema {XS}>
                 <xs:complexType name="C"><xs:sequence maxOccurs="unbounded">
                   <xs:element name="a" type="xs:string"/>
                   <xs:element name="b" type="xs:string" maxOccurs="3" default="x"/>
                 </xs:sequence></xs:complexType>
               </xs:schema>"#
        ));
        let c = complex(&set, "", "C");
        assert!(c.elements.iter().all(|e| e.plural));
        assert!(!c.elements[0].optional);
        assert!(c.elements[1].optional);
        assert_eq!(c.elements[1].default.as_deref(), Some("x"));
    }

    #[test]
    fn merge_same_namespace() {
        let a = format!(
            r#"<xs:schema {XS} targetNamespace="urn:x">
                 <xs:simpleType name="A"><xs:restriction base="xs:string"/></xs:simpleType>
               </xs:schema>"#
        );
        let b = format!(
            r#"<xs:schema {XS} xmlns:x="urn:x" targetNamespace="urn:x">
                 <xs:complexType name="B"><xs:sequence>
                   <xs:element name="a" type="x:A"/>
                 </xs:sequence></xs:complexType>
               </xs:schema>"#
        );
        let set = parse(&[&a, &b], &bare()).unwrap();
        let schemas: Vec<_> = set.schemas().iter().filter(|s| s.target_ns == "urn:x").collect();
        assert_eq!(schemas.len(), 1);
        assert!(schemas[0].get("A").is_some());
        assert!(schemas[0].get("B").is_some());
        let b = complex(&set, "urn:x", "B");
        assert!(matches!(b.elements[0].ty, Type::Simple(_)));
    }

    #[test]
    fn merge_collision_is_error() {
        let doc = format!(
            r#"<xs:schema {XS} targetNamespace="urn:x">
                 <xs:complexType name="T"/>
               </xs:schema>"#
        );
        let err = parse(&[&doc, &doc], &bare()).unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateType {
                namespace: "urn:x".into(),
                name: "T".into()
            }
        );
    }

    #[test]
    fn mixed_propagates_along_extension() {
        let set = parse_one(&format!(
            r#"<xs:schema {XS}>
                 <xs:complexType name="A" mixed="true"><xs:sequence/></xs:complexType>
                 <xs:complexType name="B"><xs:complexContent>
                   <xs:extension base="A"/>
                 </xs:complexContent></xs:complexType>
                 <xs:complexType name="C"><xs:complexContent>
                   <xs:extension base="B"/>
                 </xs:complexContent></xs:complexType>
                 <xs:complexType name="D"><xs:complexContent>
                   <xs:restriction base="A"/>
                 </xs:complexContent></xs:complexType>
               </xs:schema>"#
        ));
        assert!(complex(&set, "", "A").mixed);
        assert!(complex(&set, "", "B").mixed);
        assert!(complex(&set, "", "C").mixed);
        assert!(complex(&set, "", "C").extends);
        assert!(!complex(&set, "", "D").mixed);
    }

    #[test]
    fn no_placeholders_and_chains_end_in_builtins() {
        let set = parse(
            &[&format!(
                r#"<xs:schema {XS} xmlns:t="urn:t" targetNamespace="urn:t">
                     <xs:complexType name="Later"><xs:simpleContent>
                       <xs:extension base="t:Code"><xs:attribute name="lang" type="xs:language"/></xs:extension>
                     </xs:simpleContent></xs:complexType>
                     <xs:simpleType name="Code"><xs:restriction base="t:Base"/></xs:simpleType>
                     <xs:simpleType name="Base"><xs:restriction base="xs:token"/></xs:simpleType>
                     <xs:simpleType name="Codes"><xs:list itemType="t:Code"/></xs:simpleType>
                     <xs:simpleType name="Either"><xs:union memberTypes="t:Code xs:int"/></xs:simpleType>
                   </xs:schema>"#
            )],
            &Config::default(),
        )
        .unwrap();
        for (id, st) in set.simple_types() {
            assert!(!st.base.is_linked());
            assert!(st.union.iter().all(|t| !t.is_linked()));
            assert!(set.root_builtin(&Type::Simple(id)).is_some(), "{}", st.name);
        }
        for (id, ct) in set.complex_types() {
            assert!(!ct.base.is_linked());
            assert!(ct.elements.iter().all(|e| !e.ty.is_linked()));
            assert!(ct.attributes.iter().all(|a| !a.ty.is_linked()));
            assert!(set.root_builtin(&Type::Complex(id)).is_some(), "{}", ct.name);
        }
        let later = complex(&set, "urn:t", "Later");
        assert_eq!(set.root_builtin(&later.base), Some(Builtin::Token));
        assert!(simple(&set, "urn:t", "Codes").list);
        assert_eq!(simple(&set, "urn:t", "Either").union.len(), 2);
        assert_eq!(
            simple(&set, "urn:t", "Either").base,
            Type::Builtin(Builtin::AnySimpleType)
        );
    }

    #[test]
    fn unresolved_type_names_reference() {
        let err = parse(
            &[&format!(
                r#"<xs:schema {XS}>
                     <xs:complexType name="C"><xs:sequence>
                       <xs:element name="e" type="Nope"/>
                     </xs:sequence></xs:complexType>
                   </xs:schema>"#
            )],
            &bare(),
        )
        .unwrap_err();
        match err {
            Error::UnresolvedType { name, context } => {
                assert_eq!(name, "Nope");
                assert!(context.contains("element \"e\""), "{context}");
                assert!(context.contains("complexType \"C\""), "{context}");
            }
            other => panic!("expected UnresolvedType, got {other:?}"),
        }
    }

    #[test]
    fn base_cycle_is_error() {
        let err = parse(
            &[&format!(
                r#"<xs:schema {XS}>
                     <xs:simpleType name="A"><xs:restriction base="B"/></xs:simpleType>
                     <xs:simpleType name="B"><xs:restriction base="A"/></xs:simpleType>
                   </xs:schema>"#
            )],
            &bare(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::BaseCycle { .. }), "{err}");
    }

    #[test]
    fn invalid_occurs_is_fatal_with_location() {
        let err = parse(
            &[&format!(
                r#"<xs:schema {XS}>
                     <xs:complexType name="C"><xs:sequence>
                       <xs:element name="e" type="xs:int" maxOccurs="lots"/>
                     </xs:sequence></xs:complexType>
                   </xs:schema>"#
            )],
            &bare(),
        )
        .unwrap_err();
        assert!(matches!(err.root_cause(), Error::InvalidValue { .. }), "{err}");
        assert_eq!(err.frames(), ["complexType \"C\"", "element \"e\""]);
    }

    #[test]
    fn facets_are_parsed_and_bad_ones_dropped() {
        let set = parse_one(&format!(
            r#"<xs:schema {XS}>
                 <xs:simpleType name="Size">
                   <xs:annotation><xs:documentation> T-shirt size </xs:documentation></xs:annotation>
                   <xs:restriction base="xs:string">
                     <xs:enumeration value="S"/><xs:enumeration value="M"/>
                     <xs:maxLength value="1"/>
                     <xs:pattern value="[SML]"/>
                   </xs:restriction>
                 </xs:simpleType>
                 <xs:simpleType name="Odd">
                   <xs:restriction base="xs:decimal">
                     <xs:minInclusive value="0"/>
                     <xs:maxExclusive value="one hundred"/>
                     <xs:totalDigits value="x"/>
                     <xs:pattern value="\p{{IsBogusBlock}}"/>
                   </xs:restriction>
                 </xs:simpleType>
                 <xs:simpleType name="When">
                   <xs:restriction base="xs:date"><xs:minInclusive value="2001-01-01"/></xs:restriction>
                 </xs:simpleType>
               </xs:schema>"#
        ));
        let size = simple(&set, "", "Size");
        assert_eq!(size.doc, "T-shirt size");
        assert_eq!(size.restriction.enumeration, ["S", "M"]);
        assert_eq!(size.restriction.max_length, Some(1));
        assert_eq!(size.restriction.pattern.as_deref(), Some("^(?:[SML])$"));

        let odd = simple(&set, "", "Odd");
        assert_eq!(
            odd.restriction.min,
            Some(Bound {
                value: FacetValue::Number(0.0),
                inclusive: true
            })
        );
        assert_eq!(odd.restriction.max, None);
        assert_eq!(odd.restriction.total_digits, None);
        assert_eq!(odd.restriction.pattern, None);
        assert!(odd.doc.contains("maxExclusive restriction dropped"), "{}", odd.doc);
        assert!(odd.doc.contains("totalDigits restriction dropped"), "{}", odd.doc);
        assert!(odd.doc.contains("pattern restriction dropped"), "{}", odd.doc);

        let when = simple(&set, "", "When");
        assert_eq!(
            when.restriction.min.as_ref().map(|b| &b.value),
            Some(&FacetValue::Temporal("2001-01-01".into()))
        );
    }

    #[test]
    fn attributes_wildcards_and_prohibited() {
        let set = parse_one(&format!(
            r#"<xs:schema {XS}>
                 <xs:complexType name="C">
                   <xs:sequence><xs:any minOccurs="0" maxOccurs="unbounded"/></xs:sequence>
                   <xs:attribute name="req" type="xs:string" use="required"/>
                   <xs:attribute name="opt" type="xs:int" default="3"/>
                   <xs:attribute name="gone" type="xs:int" use="prohibited"/>
                   <xs:attribute name="untyped"/>
                 </xs:complexType>
               </xs:schema>"#
        ));
        let c = complex(&set, "", "C");
        let any = &c.elements[0];
        assert!(any.wildcard && any.plural && any.optional);
        assert_eq!(any.ty, Type::Builtin(Builtin::AnyType));
        let names: Vec<&str> = c.attributes.iter().map(|a| &*a.name.local_name).collect();
        assert_eq!(names, ["req", "opt", "untyped"]);
        assert!(!c.attributes[0].optional);
        assert!(c.attributes[1].optional);
        assert_eq!(c.attributes[1].default.as_deref(), Some("3"));
        assert_eq!(c.attributes[2].ty, Type::Builtin(Builtin::AnySimpleType));
    }

    #[test]
    fn self_type_and_element_aliases() {
        let set = parse_one(&format!(
            r#"<xs:schema {XS} targetNamespace="urn:r">
                 <xs:element name="root" type="xs:string"/>
                 <xs:element name="other" type="xs:int" nillable="true"/>
               </xs:schema>"#
        ));
        let schema = set.schema("urn:r").unwrap();
        assert_eq!(schema.get("root"), Some(&Type::Builtin(Builtin::String)));
        let this = complex(&set, "urn:r", SELF_TYPE);
        assert_eq!(this.elements.len(), 2);
        assert!(this.elements[1].nillable);
        assert!(this.anonymous);
    }

    #[test]
    fn attribute_group_from_soap_encoding_keeps_its_namespace() {
        let set = parse(
            &[&format!(
                r#"<xs:schema {XS} xmlns:enc="http://schemas.xmlsoap.org/soap/encoding/"
                              targetNamespace="urn:user">
                     <xs:complexType name="Vector">
                       <xs:attributeGroup ref="enc:arrayAttributes"/>
                     </xs:complexType>
                   </xs:schema>"#
            )],
            &Config::default(),
        )
        .unwrap();
        let enc = crate::xsd::standard::SOAP_ENC_NS;
        let vector = complex(&set, "urn:user", "Vector");
        let names: Vec<&QName> = vector.attributes.iter().map(|a| &a.name).collect();
        assert_eq!(
            names,
            [&QName::new(enc, "arrayType"), &QName::new(enc, "offset")]
        );
        let array = complex(&set, enc, "Array");
        assert_eq!(array.attributes[0].name, vector.attributes[0].name);
    }

    #[test]
    fn xml_lang_ref_uses_standard_schema() {
        let set = parse(
            &[&format!(
                r#"<xs:schema {XS}>
                     <xs:complexType name="Text"><xs:simpleContent>
                       <xs:extension base="xs:string"><xs:attribute ref="xml:lang"/></xs:extension>
                     </xs:simpleContent></xs:complexType>
                   </xs:schema>"#
            )],
            &Config::default(),
        )
        .unwrap();
        let text = complex(&set, "", "Text");
        assert_eq!(
            text.attributes[0].name,
            QName::new(crate::qname::XML_NS, "lang")
        );
        assert_eq!(set.root_builtin(&text.attributes[0].ty), Some(Builtin::Language));
    }

    #[test]
    fn transforms_run_on_every_type() {
        let config = bare().with_transform(|def| {
            if let TypeDefMut::Complex(c) = def {
                c.doc = format!("complex {}", c.name.local_name);
            }
        });
        let set = parse(
            &[&format!(r#"<xs:schema {XS}><xs:complexType name="T"/></xs:schema>"#)],
            &config,
        )
        .unwrap();
        assert_eq!(complex(&set, "", "T").doc, "complex T");
    }

    #[test]
    fn builtin_schema_comes_last() {
        let set = parse_one(&format!(r#"<xs:schema {XS} targetNamespace="urn:a"/>"#));
        let last = set.schemas().last().unwrap();
        assert_eq!(last.target_ns, XS_NS);
        assert_eq!(last.types.len(), Builtin::ALL.len());
    }
}
