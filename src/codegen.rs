//! Minimaler Rust-Emitter über einem aufgelösten [`SchemaSet`].
//!
//! Pro benanntem Typ eine Deklaration:
//!
//! - complex type → `struct` (Attribute, dann Elemente; geerbte Felder bei
//!   Extension zuerst)
//! - simple type mit Enumeration → `enum`
//! - sonstiger simple type → `type` Alias
//!
//! Keine Serde-Annotationen, keine (De-)Serialisierung: die Ausgabe ist ein
//! Startpunkt für handgeschriebenen Code.

use std::fmt::Write as _;

use heck::{ToSnakeCase, ToUpperCamelCase};

use crate::qname::{QName, XS_NS};
use crate::xsd::{Builtin, ComplexType, SchemaSet, SimpleType, Type, TypeDef, SELF_TYPE};
use crate::{FastHashMap, FastHashSet};

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "static", "struct", "trait", "true", "try", "type",
    "unsafe", "use", "where", "while", "yield",
];

/// Rust type for a builtin.
pub fn builtin_type(b: Builtin) -> &'static str {
    match b {
        Builtin::Boolean => "bool",
        Builtin::Byte => "i8",
        Builtin::Short => "i16",
        Builtin::Int => "i32",
        Builtin::Long
        | Builtin::Integer
        | Builtin::NegativeInteger
        | Builtin::NonPositiveInteger => "i64",
        Builtin::UnsignedByte => "u8",
        Builtin::UnsignedShort => "u16",
        Builtin::UnsignedInt => "u32",
        Builtin::UnsignedLong | Builtin::NonNegativeInteger | Builtin::PositiveInteger => "u64",
        Builtin::Float => "f32",
        Builtin::Double | Builtin::Decimal => "f64",
        Builtin::Base64Binary | Builtin::HexBinary => "Vec<u8>",
        Builtin::IdRefs | Builtin::NmTokens | Builtin::Entities => "Vec<String>",
        _ => "String",
    }
}

/// Renders every user type of `set` as Rust source.
///
/// # Beispiel
///
/// ```
/// use xsdgen::codegen::render;
/// use xsdgen::config::Config;
/// use xsdgen::xsd::parse;
///
/// let xsd = r#"
///     <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
///       <xs:complexType name="point">
///         <xs:attribute name="x" type="xs:int" use="required"/>
///       </xs:complexType>
///     </xs:schema>"#;
/// let set = parse(&[xsd], &Config::default().without_standard_schemas()).unwrap();
/// let code = render(&set);
/// assert!(code.contains("pub struct Point {"));
/// assert!(code.contains("pub x: i32,"));
/// ```
pub fn render(set: &SchemaSet) -> String {
    let names = Names::assign(set);
    let mut out = String::from("// Generated by xsdgen. Do not edit.\n");
    let mut emitted: FastHashSet<QName> = FastHashSet::default();

    for schema in set.schemas() {
        if schema.target_ns == XS_NS {
            continue;
        }
        for (name, ty) in &schema.types {
            // Element-Aliase zeigen auf schon ausgegebene Typen.
            if set.type_name(ty) != *name || !emitted.insert(name.clone()) {
                continue;
            }
            match set.get(ty) {
                TypeDef::Simple(st) => render_simple(set, &names, st, &mut out),
                TypeDef::Complex(ct) if &*ct.name.local_name != SELF_TYPE => {
                    render_complex(set, &names, ct, &mut out)
                }
                _ => {}
            }
        }
    }
    out
}

/// Eindeutige Rust-Bezeichner pro Typname.
struct Names {
    idents: FastHashMap<QName, String>,
}

impl Names {
    fn assign(set: &SchemaSet) -> Names {
        let mut idents = FastHashMap::default();
        let mut used = FastHashSet::default();
        let all = set
            .simple_types()
            .map(|(_, st)| &st.name)
            .chain(set.complex_types().map(|(_, ct)| &ct.name));
        for name in all {
            if idents.contains_key(name) {
                continue;
            }
            let ident = unique(type_ident(&name.local_name), &mut used);
            idents.insert(name.clone(), ident);
        }
        Names { idents }
    }

    fn rust_type(&self, set: &SchemaSet, ty: &Type) -> String {
        match ty {
            Type::Builtin(b) => builtin_type(*b).to_string(),
            _ => self
                .idents
                .get(&set.type_name(ty))
                .cloned()
                .unwrap_or_else(|| "String".to_string()),
        }
    }
}

fn unique(base: String, used: &mut FastHashSet<String>) -> String {
    let mut candidate = base.clone();
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{base}{n}");
        n += 1;
    }
    candidate
}

fn type_ident(local: &str) -> String {
    let ident = local.to_upper_camel_case();
    match ident.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => ident,
        _ => format!("T{ident}"),
    }
}

fn field_ident(local: &str) -> String {
    let ident = local.to_snake_case();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("f_{ident}")
    } else if matches!(ident.as_str(), "self" | "super" | "crate" | "Self") {
        format!("{ident}_")
    } else if KEYWORDS.contains(&ident.as_str()) {
        format!("r#{ident}")
    } else {
        ident
    }
}

fn variant_ident(value: &str) -> String {
    let ident = value.to_upper_camel_case();
    match ident.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => ident,
        _ => format!("V{ident}"),
    }
}

fn doc_comment(doc: &str, indent: &str, out: &mut String) {
    for line in doc.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            let _ = writeln!(out, "{indent}///");
        } else {
            let _ = writeln!(out, "{indent}/// {line}");
        }
    }
}

fn render_simple(set: &SchemaSet, names: &Names, st: &SimpleType, out: &mut String) {
    let Some(ident) = names.idents.get(&st.name) else {
        return;
    };
    out.push('\n');
    doc_comment(&st.doc, "", out);

    if !st.restriction.enumeration.is_empty() && !st.list && st.union.is_empty() {
        let _ = writeln!(out, "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
        let _ = writeln!(out, "pub enum {ident} {{");
        let mut used = FastHashSet::default();
        for value in &st.restriction.enumeration {
            let variant = unique(variant_ident(value), &mut used);
            let _ = writeln!(out, "    /// `{value}`");
            let _ = writeln!(out, "    {variant},");
        }
        let _ = writeln!(out, "}}");
        return;
    }

    let target = if st.list {
        format!("Vec<{}>", names.rust_type(set, &st.base))
    } else if !st.union.is_empty() {
        // Unions werden als Text behandelt.
        "String".to_string()
    } else {
        names.rust_type(set, &st.base)
    };
    let _ = writeln!(out, "pub type {ident} = {target};");
}

/// Fields inherited through extension, outermost base first.
fn inherited<'a>(set: &'a SchemaSet, ct: &'a ComplexType) -> Vec<&'a ComplexType> {
    let mut chain = Vec::new();
    let mut current = ct;
    // Basisketten sind nach der Auflösung endlich.
    for _ in 0..set.complex_types().count() {
        if !current.extends {
            break;
        }
        let TypeDef::Complex(base) = set.get(&current.base) else {
            break;
        };
        chain.push(base);
        current = base;
    }
    chain.reverse();
    chain
}

fn render_complex(set: &SchemaSet, names: &Names, ct: &ComplexType, out: &mut String) {
    let Some(ident) = names.idents.get(&ct.name) else {
        return;
    };
    out.push('\n');
    doc_comment(&ct.doc, "", out);
    let _ = writeln!(out, "#[derive(Debug, Clone, PartialEq)]");
    let _ = writeln!(out, "pub struct {ident} {{");

    let mut used = FastHashSet::default();
    let mut field = |out: &mut String, doc: &str, name: &str, ty: String| {
        let name = unique(field_ident(name), &mut used);
        doc_comment(doc, "    ", out);
        let _ = writeln!(out, "    pub {name}: {ty},");
    };

    let chain = inherited(set, ct);
    let root = chain.first().copied().unwrap_or(ct);
    match set.get(&root.base) {
        TypeDef::Simple(_) => field(out, "", "value", names.rust_type(set, &root.base)),
        TypeDef::Builtin(b) if b != Builtin::AnyType => {
            field(out, "", "value", builtin_type(b).to_string())
        }
        _ => {}
    }
    if ct.mixed {
        field(out, "Character data between child elements.", "text", "String".into());
    }

    for part in chain.into_iter().chain(std::iter::once(ct)) {
        for attr in &part.attributes {
            let ty = names.rust_type(set, &attr.ty);
            let ty = if attr.optional { format!("Option<{ty}>") } else { ty };
            field(out, &attr.doc, &attr.name.local_name, ty);
        }
        for el in &part.elements {
            let mut ty = if el.wildcard {
                "String".to_string()
            } else {
                names.rust_type(set, &el.ty)
            };
            if ty == *ident {
                ty = format!("Box<{ty}>");
            }
            let ty = if el.plural {
                format!("Vec<{ty}>")
            } else if el.optional || el.nillable {
                format!("Option<{ty}>")
            } else {
                ty
            };
            field(out, &el.doc, &el.name.local_name, ty);
        }
    }
    let _ = writeln!(out, "}}");
}
