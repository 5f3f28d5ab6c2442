//! XSD Normalisierung und Typauflösung.
//!
//! Zwei Stufen:
//!
//! - [`normalize`]: rewrites the raw schema trees into a canonical form
//!   (named top-level types only, no `ref=`, no group wrappers)
//! - [`parse`]: turns the canonical trees into a [`SchemaSet`] where every
//!   type reference points at a builtin or an arena type
//!
//! `xs:import` wird nicht automatisch aufgelöst; [`load_with_imports`] liest
//! die referenzierten Dateien vorab ein.

pub mod builtin;
pub mod imports;
pub mod index;
pub mod normalize;
pub mod parse;
pub mod predicate;
mod standard;
pub mod types;

pub use builtin::Builtin;
pub use imports::{imports, load_with_imports, Import, ImportKind};
pub use normalize::{normalize, Normalized};
pub use parse::{parse, resolve, MaxOccurs, SELF_TYPE};
pub use types::{
    Attribute, Bound, ComplexId, ComplexType, Element, FacetValue, Restriction, Schema,
    SchemaSet, SimpleId, SimpleType, Type, TypeDef, TypeDefMut,
};

use crate::error::Result;
use crate::qname::XS_NS;
use crate::xml::{NodeId, Tree};

/// Target namespace of the nearest enclosing `<schema>` (or `id` itself).
pub(crate) fn target_ns(tree: &Tree, id: NodeId) -> &str {
    std::iter::once(id)
        .chain(tree.ancestors(id))
        .find(|&n| tree[n].is(XS_NS, "schema"))
        .and_then(|s| tree.attr(s, "targetNamespace"))
        .unwrap_or("")
}

/// Short label for error frames: `element "Count"`, `group ref="g"`.
pub(crate) fn describe(tree: &Tree, id: NodeId) -> String {
    let el = &tree[id];
    match (el.attr("name"), el.attr("ref")) {
        (Some(name), _) => format!("{} \"{name}\"", el.local()),
        (None, Some(r)) => format!("{} ref=\"{r}\"", el.local()),
        (None, None) => el.local().to_string(),
    }
}

/// Annotates an error with the named components from `id` up to (not
/// including) its `<schema>`.
pub(crate) fn breadcrumbs<T>(tree: &Tree, id: NodeId, result: Result<T>) -> Result<T> {
    result.map_err(|mut err| {
        for n in std::iter::once(id).chain(tree.ancestors(id)) {
            let el = &tree[n];
            if el.is(XS_NS, "schema") {
                break;
            }
            if el.attr("name").is_some() || el.attr("ref").is_some() {
                err = err.with_frame(describe(tree, n));
            }
        }
        err
    })
}

/// Text of `<annotation><documentation>` children, trimmed, paragraphs
/// separated by a blank line.
pub(crate) fn documentation(tree: &Tree, id: NodeId) -> String {
    let mut parts = Vec::new();
    for &annotation in &tree[id].children {
        if !tree[annotation].is(XS_NS, "annotation") {
            continue;
        }
        for &doc in &tree[annotation].children {
            if tree[doc].is(XS_NS, "documentation") {
                let text = tree.text(doc);
                let text = text.trim();
                if !text.is_empty() {
                    parts.push(text.to_string());
                }
            }
        }
    }
    parts.join("\n\n")
}
