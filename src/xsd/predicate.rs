//! Composable predicates over tree nodes.
//!
//! Die Normalisierungs-Pässe formulieren ihre Zielknoten als kleine
//! Prädikate (`is("element")`, `has_attr("ref")`, ...) und kombinieren sie
//! mit [`and`], [`or`] und [`not`].

use crate::qname::XS_NS;
use crate::xml::{NodeId, Tree};

/// QName-valued attributes that must be re-spelled when a node moves to a
/// different namespace scope.
pub const QNAME_ATTRS: &[&str] = &["type", "base", "ref", "itemType", "substitutionGroup", "refer"];

/// Whitespace-separated list of QNames (`<union memberTypes="...">`).
pub const QNAME_LIST_ATTRS: &[&str] = &["memberTypes"];

/// Node predicate. Has access to the whole tree so it can look at children.
pub trait Predicate: Fn(&Tree, NodeId) -> bool {}

impl<F: Fn(&Tree, NodeId) -> bool> Predicate for F {}

/// `xs:<local>`.
pub fn is(local: &'static str) -> impl Predicate {
    move |tree: &Tree, id: NodeId| tree[id].is(XS_NS, local)
}

/// `xs:complexType` or `xs:simpleType`.
pub fn is_type() -> impl Predicate {
    or(is("complexType"), is("simpleType"))
}

/// Carries the unqualified attribute `local`.
pub fn has_attr(local: &'static str) -> impl Predicate {
    move |tree: &Tree, id: NodeId| tree.attr(id, local).is_some()
}

/// At least one direct child matches `pred`.
pub fn has_child(pred: impl Predicate) -> impl Predicate {
    move |tree: &Tree, id: NodeId| tree[id].children.iter().any(|&c| pred(tree, c))
}

/// Direct child of an `xs:schema` element.
pub fn is_top_level() -> impl Predicate {
    |tree: &Tree, id: NodeId| {
        tree[id]
            .parent
            .is_some_and(|p| tree[p].is(XS_NS, "schema"))
    }
}

pub fn and(a: impl Predicate, b: impl Predicate) -> impl Predicate {
    move |tree: &Tree, id: NodeId| a(tree, id) && b(tree, id)
}

pub fn or(a: impl Predicate, b: impl Predicate) -> impl Predicate {
    move |tree: &Tree, id: NodeId| a(tree, id) || b(tree, id)
}

pub fn not(a: impl Predicate) -> impl Predicate {
    move |tree: &Tree, id: NodeId| !a(tree, id)
}

/// Preorder list of nodes under `root` (inclusive) matching `pred`.
pub fn select(tree: &Tree, root: NodeId, pred: impl Predicate) -> Vec<NodeId> {
    tree.descendants(root)
        .into_iter()
        .filter(|&id| pred(tree, id))
        .collect()
}

/// Direct children of `id` matching `pred`.
pub fn children(tree: &Tree, id: NodeId, pred: impl Predicate) -> Vec<NodeId> {
    tree[id]
        .children
        .iter()
        .copied()
        .filter(|&c| pred(tree, c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn tree(text: &str) -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree.parse_document(text, &Config::default()).unwrap();
        (tree, root)
    }

    const DOC: &str = r#"
        <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
          <xs:element name="a">
            <xs:complexType><xs:sequence><xs:element ref="b"/></xs:sequence></xs:complexType>
          </xs:element>
          <xs:element name="b" type="xs:string"/>
          <xs:simpleType name="s"><xs:restriction base="xs:string"/></xs:simpleType>
        </xs:schema>"#;

    #[test]
    fn anonymous_types() {
        let (tree, root) = tree(DOC);
        let found = select(&tree, root, and(is_type(), not(has_attr("name"))));
        assert_eq!(found.len(), 1);
        assert_eq!(tree[found[0]].local(), "complexType");
    }

    #[test]
    fn elements_with_inline_type() {
        let (tree, root) = tree(DOC);
        let found = select(&tree, root, and(is("element"), has_child(is_type())));
        assert_eq!(found.len(), 1);
        assert_eq!(tree.attr(found[0], "name"), Some("a"));
    }

    #[test]
    fn top_level_and_refs() {
        let (tree, root) = tree(DOC);
        assert_eq!(children(&tree, root, is_top_level()).len(), 3);
        let refs = select(&tree, root, has_attr("ref"));
        assert_eq!(refs.len(), 1);
        assert!(!is_top_level()(&tree, refs[0]));
    }

    #[test]
    fn or_matches_either() {
        let (tree, root) = tree(DOC);
        let found = select(&tree, root, or(is("simpleType"), is("sequence")));
        assert_eq!(found.len(), 2);
    }
}
