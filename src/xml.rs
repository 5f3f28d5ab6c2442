//! Namespace-aware XML element tree in arena storage.
//!
//! Schema documents are loaded (via roxmltree, see [`load`]) into a single
//! [`Tree`] shared by all documents of a run. Nodes are addressed by
//! [`NodeId`]; relocating a node (hoisting an anonymous type, splicing a
//! group) is a reparent of an index, never a pointer relink.
//!
//! Every element carries its complete in-scope namespace bindings
//! ([`Scope`]), so a node copied into a different document stays
//! interpretable on its own.

use std::ops::{Index, IndexMut};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::qname::{QName, XML_NS};

pub mod emit;
mod load;

pub(crate) use load::load;

/// Index of an element in a [`Tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Position in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Eine Namespace-Bindung `xmlns:prefix="uri"`. Leerer Prefix = Default-Namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsBinding {
    pub prefix: Rc<str>,
    pub uri: Rc<str>,
}

/// Sichtbare Namespace-Bindungen eines Elements (geerbt + eigene).
///
/// Die nächstgelegene Bindung steht am Ende; Lookups suchen rückwärts,
/// damit spätere Bindungen frühere verdecken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    bindings: Vec<NsBinding>,
}

impl Scope {
    /// Scope aus einer Liste von Bindungen.
    pub fn new(bindings: Vec<NsBinding>) -> Self {
        Self { bindings }
    }

    /// Alle Bindungen, nächstgelegene zuletzt.
    pub fn bindings(&self) -> &[NsBinding] {
        &self.bindings
    }

    /// URI für einen Prefix. `xml` ist implizit immer gebunden.
    pub fn lookup_prefix(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NS);
        }
        self.bindings
            .iter()
            .rev()
            .find(|b| &*b.prefix == prefix)
            .map(|b| &*b.uri)
    }

    /// Der Default-Namespace, falls einer (nicht-leer) gebunden ist.
    pub fn default_namespace(&self) -> Option<&str> {
        self.lookup_prefix("").filter(|uri| !uri.is_empty())
    }

    /// Löst einen QName-String aus einem Attributwert auf.
    ///
    /// `p:local` über die nächste Bindung von `p`. Unpräfixierte Namen
    /// gehören zum Default-Namespace; ohne Default-Bindung zu `fallback_ns`
    /// (dem targetNamespace des Schemas).
    pub fn resolve(&self, value: &str, fallback_ns: &str) -> Result<QName> {
        let value = value.trim();
        match value.split_once(':') {
            Some((prefix, local)) => {
                let uri = self.lookup_prefix(prefix).ok_or_else(|| Error::UnknownPrefix {
                    prefix: prefix.to_string(),
                    value: value.to_string(),
                })?;
                Ok(QName::new(uri, local))
            }
            None => {
                let uri = self.default_namespace().unwrap_or(fallback_ns);
                Ok(QName::new(uri, value))
            }
        }
    }

    /// Shortest prefix bound to `uri` that is not shadowed by a nearer binding.
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        if uri == XML_NS {
            return Some("xml");
        }
        self.bindings
            .iter()
            .filter(|b| !b.prefix.is_empty() && &*b.uri == uri)
            .filter(|b| self.lookup_prefix(&b.prefix) == Some(uri))
            .map(|b| &*b.prefix)
            .min_by_key(|p| (p.len(), *p))
    }

    /// Vereinigt zwei Scopes; Bindungen aus `nearer` verdecken gleichnamige.
    pub fn join(&self, nearer: &Scope) -> Scope {
        let mut bindings = self.bindings.clone();
        bindings.extend(nearer.bindings.iter().cloned());
        Scope { bindings }
    }

    fn with_binding(&self, prefix: &str, uri: &str) -> Scope {
        let mut bindings = self.bindings.clone();
        bindings.push(NsBinding {
            prefix: Rc::from(prefix),
            uri: Rc::from(uri),
        });
        Scope { bindings }
    }
}

/// An attribute. Unqualified attributes have an empty namespace URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: QName,
    pub value: String,
}

/// An element node.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: QName,
    pub attrs: Vec<Attr>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Character data directly inside this element.
    pub content: String,
    pub scope: Rc<Scope>,
}

impl Element {
    /// Creates a detached element without attributes or children.
    pub fn new(name: QName, scope: Rc<Scope>) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            children: Vec::new(),
            parent: None,
            content: String::new(),
            scope,
        }
    }

    /// Value of the unqualified attribute `local`.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.uri.is_empty() && &*a.name.local_name == local)
            .map(|a| a.value.as_str())
    }

    /// True if the element is `{ns}local`.
    #[inline]
    pub fn is(&self, ns: &str, local: &str) -> bool {
        &*self.name.uri == ns && &*self.name.local_name == local
    }

    /// Local part of the element name.
    #[inline]
    pub fn local(&self) -> &str {
        &self.name.local_name
    }

    /// Sets (or replaces) the unqualified attribute `local`.
    pub fn set_attr(&mut self, local: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|a| a.name.uri.is_empty() && &*a.name.local_name == local)
        {
            Some(attr) => attr.value = value,
            None => self.attrs.push(Attr {
                name: QName::new("", local),
                value,
            }),
        }
    }
}

/// Arena of elements. Roots are the document elements in load order.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Element>,
    roots: Vec<NodeId>,
}

impl Index<NodeId> for Tree {
    type Output = Element;

    fn index(&self, id: NodeId) -> &Element {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.index()]
    }
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `text` and appends its document element as a new root.
    ///
    /// # Beispiel
    ///
    /// ```
    /// use xsdgen::config::Config;
    /// use xsdgen::xml::Tree;
    ///
    /// let mut tree = Tree::new();
    /// let root = tree
    ///     .parse_document(r#"<a xmlns:p="urn:p"><p:b/></a>"#, &Config::default())
    ///     .unwrap();
    /// assert_eq!(tree[root].children.len(), 1);
    /// ```
    pub fn parse_document(&mut self, text: &str, config: &crate::config::Config) -> Result<NodeId> {
        let root = load(self, text, config)?;
        self.roots.push(root);
        Ok(root)
    }

    /// Document roots in load order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Number of allocated nodes (including detached ones).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocates a detached element.
    pub fn alloc(&mut self, element: Element) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(element);
        id
    }

    /// Value of the unqualified attribute `local` on `id`.
    pub fn attr(&self, id: NodeId, local: &str) -> Option<&str> {
        self[id].attr(local)
    }

    /// Appends a detached `child` to `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self[child].parent = Some(parent);
        self[parent].children.push(child);
    }

    /// Removes `id` from its parent's child list. The node stays allocated.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self[id].parent.take() {
            self[parent].children.retain(|&c| c != id);
        }
    }

    /// Puts `new` into the slot `old` occupies; `old` becomes detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        match self[old].parent.take() {
            Some(parent) => {
                if let Some(slot) = self[parent].children.iter_mut().find(|c| **c == old) {
                    *slot = new;
                }
                self[new].parent = Some(parent);
            }
            None => {
                if let Some(pos) = self.roots.iter().position(|&r| r == old) {
                    self.roots[pos] = new;
                }
            }
        }
    }

    /// Replaces `id` by its own children in the parent's child list.
    pub fn splice(&mut self, id: NodeId) {
        let Some(parent) = self[id].parent.take() else {
            return;
        };
        let children = std::mem::take(&mut self[id].children);
        for &child in &children {
            self[child].parent = Some(parent);
        }
        let siblings = &mut self[parent].children;
        if let Some(pos) = siblings.iter().position(|&c| c == id) {
            siblings.splice(pos..=pos, children);
        }
    }

    /// Copies the subtree rooted at `id`. The copy is detached.
    ///
    /// `depth` ist die Tiefe, in die die Kopie eingehängt wird. Läge ein
    /// kopierter Knoten tiefer als `max_depth`, bricht die Kopie mit
    /// [`Error::DepthLimitExceeded`] ab.
    pub fn deep_copy(&mut self, id: NodeId, depth: usize, max_depth: usize) -> Result<NodeId> {
        if depth > max_depth {
            return Err(Error::DepthLimitExceeded { limit: max_depth });
        }
        let copy = self.copy_node(id);
        let mut stack = vec![(id, copy, depth)];
        while let Some((source, target, depth)) = stack.pop() {
            let children = self[source].children.clone();
            if !children.is_empty() && depth >= max_depth {
                return Err(Error::DepthLimitExceeded { limit: max_depth });
            }
            for child in children {
                let child_copy = self.copy_node(child);
                self.append_child(target, child_copy);
                stack.push((child, child_copy, depth + 1));
            }
        }
        Ok(copy)
    }

    fn copy_node(&mut self, id: NodeId) -> NodeId {
        let mut node = self[id].clone();
        node.parent = None;
        node.children.clear();
        self.alloc(node)
    }

    /// Preorder list of `root` and all its descendants.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self[id].children.iter().rev().copied());
        }
        out
    }

    /// Depth-first search for `{ns}local` elements (including `root`).
    pub fn search(&self, root: NodeId, ns: &str, local: &str) -> Vec<NodeId> {
        self.search_by(root, |el| el.is(ns, local))
    }

    /// Depth-first search with an arbitrary predicate (including `root`).
    pub fn search_by(&self, root: NodeId, pred: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| pred(&self[id]))
            .collect()
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self[id].parent, move |&p| self[p].parent)
    }

    /// Resolves a QName-valued string in the scope of `id`.
    pub fn resolve(&self, id: NodeId, value: &str, fallback_ns: &str) -> Result<QName> {
        self[id].scope.resolve(value, fallback_ns)
    }

    /// Spells `name` so that [`Tree::resolve`] on `id` yields it again.
    ///
    /// Bevorzugt den kürzesten sichtbaren Prefix; ohne passende Bindung wird
    /// eine neue `nsN`-Bindung am Knoten ergänzt.
    pub fn spell(&mut self, id: NodeId, name: &QName, fallback_ns: &str) -> String {
        let scope = &self[id].scope;
        if let Some(prefix) = scope.prefix_for(&name.uri) {
            return format!("{prefix}:{}", name.local_name);
        }
        let unprefixed_ns = scope.default_namespace().unwrap_or(fallback_ns);
        if unprefixed_ns == &*name.uri {
            return name.local_name.to_string();
        }
        self.bind_fresh_prefix(id, name)
    }

    /// Like [`Tree::spell`], but never returns an unprefixed name.
    pub fn spell_qualified(&mut self, id: NodeId, name: &QName) -> String {
        if let Some(prefix) = self[id].scope.prefix_for(&name.uri) {
            return format!("{prefix}:{}", name.local_name);
        }
        self.bind_fresh_prefix(id, name)
    }

    fn bind_fresh_prefix(&mut self, id: NodeId, name: &QName) -> String {
        let scope = &self[id].scope;
        let prefix = (0..)
            .map(|n| format!("ns{n}"))
            .find(|p| scope.lookup_prefix(p).is_none())
            .unwrap_or_default();
        let scope = Rc::new(scope.with_binding(&prefix, &name.uri));
        self[id].scope = scope;
        format!("{prefix}:{}", name.local_name)
    }

    /// Concatenated character data of `id` and its descendants.
    pub fn text(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .map(|n| self[n].content.as_str())
            .collect()
    }

    /// Preorder walk with a depth ceiling. The callback sees node and depth.
    pub fn walk(
        &self,
        root: NodeId,
        max_depth: usize,
        mut f: impl FnMut(NodeId, usize) -> Result<()>,
    ) -> Result<()> {
        let mut stack = vec![(root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            if depth > max_depth {
                return Err(Error::DepthLimitExceeded { limit: max_depth });
            }
            f(id, depth)?;
            stack.extend(self[id].children.iter().rev().map(|&c| (c, depth + 1)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::qname::XS_NS;

    fn parse(text: &str) -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree.parse_document(text, &Config::default()).unwrap();
        (tree, root)
    }

    #[test]
    fn resolve_prefixed_and_default() {
        let (tree, root) = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns="urn:d"/>"#,
        );
        assert_eq!(tree.resolve(root, "xs:int", "").unwrap(), QName::xs("int"));
        assert_eq!(tree.resolve(root, "T", "urn:t").unwrap(), QName::new("urn:d", "T"));
        assert_eq!(
            tree.resolve(root, "xml:lang", "").unwrap(),
            QName::new(XML_NS, "lang")
        );
    }

    #[test]
    fn resolve_unprefixed_falls_back() {
        let (tree, root) = parse(r#"<schema/>"#);
        assert_eq!(tree.resolve(root, "T", "urn:t").unwrap(), QName::new("urn:t", "T"));
    }

    #[test]
    fn unknown_prefix_is_error() {
        let (tree, root) = parse("<a/>");
        let err = tree.resolve(root, "nope:T", "").unwrap_err();
        assert!(matches!(err, Error::UnknownPrefix { .. }));
    }

    #[test]
    fn spell_prefers_shortest_prefix() {
        let (mut tree, root) =
            parse(r#"<a xmlns:long="urn:x" xmlns:x="urn:x" xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#);
        assert_eq!(tree.spell(root, &QName::new("urn:x", "T"), ""), "x:T");
        assert_eq!(tree.spell(root, &QName::xs("int"), ""), "xs:int");
    }

    #[test]
    fn spell_adds_binding_when_missing() {
        let (mut tree, root) = parse(r#"<a xmlns="urn:d"/>"#);
        let name = QName::new("urn:other", "T");
        let spelled = tree.spell(root, &name, "");
        assert_eq!(spelled, "ns0:T");
        assert_eq!(tree.resolve(root, &spelled, "").unwrap(), name);
    }

    #[test]
    fn spell_qualified_ignores_default_namespace() {
        let (mut tree, root) = parse(r#"<a xmlns="urn:d"/>"#);
        let name = QName::new("urn:d", "T");
        assert_eq!(tree.spell(root, &name, ""), "T");
        let spelled = tree.spell_qualified(root, &name);
        assert_eq!(spelled, "ns0:T");
        assert_eq!(tree.resolve(root, &spelled, "").unwrap(), name);
    }

    #[test]
    fn spell_shadowed_prefix_not_used() {
        let (mut tree, root) = parse(r#"<a xmlns:p="urn:one"><b xmlns:p="urn:two"/></a>"#);
        let b = tree[root].children[0];
        let spelled = tree.spell(b, &QName::new("urn:one", "T"), "");
        assert_ne!(spelled, "p:T");
        assert_eq!(tree.resolve(b, &spelled, "").unwrap(), QName::new("urn:one", "T"));
    }

    #[test]
    fn search_finds_nested_in_document_order() {
        let (tree, root) = parse(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:element name="a"><xs:complexType><xs:sequence>
                   <xs:element name="b"/>
                 </xs:sequence></xs:complexType></xs:element>
                 <xs:element name="c"/>
               </xs:schema>"#,
        );
        let found: Vec<_> = tree
            .search(root, XS_NS, "element")
            .into_iter()
            .map(|id| tree.attr(id, "name").unwrap().to_string())
            .collect();
        assert_eq!(found, ["a", "b", "c"]);
    }

    #[test]
    fn splice_replaces_node_with_children() {
        let (mut tree, root) = parse("<r><g><x/><y/></g><z/></r>");
        let g = tree[root].children[0];
        tree.splice(g);
        let names: Vec<_> = tree[root]
            .children
            .iter()
            .map(|&c| tree[c].local().to_string())
            .collect();
        assert_eq!(names, ["x", "y", "z"]);
        assert!(tree[root].children.iter().all(|&c| tree[c].parent == Some(root)));
    }

    #[test]
    fn deep_copy_is_independent() {
        let (mut tree, root) = parse(r#"<r><a k="1"><b/></a></r>"#);
        let a = tree[root].children[0];
        let copy = tree.deep_copy(a, 1, 8).unwrap();
        tree[copy].set_attr("k", "2");
        assert_eq!(tree.attr(a, "k"), Some("1"));
        assert_eq!(tree.attr(copy, "k"), Some("2"));
        assert_ne!(tree[copy].children[0], tree[a].children[0]);
        assert_eq!(tree[copy].parent, None);
    }

    #[test]
    fn deep_copy_enforces_depth() {
        let (mut tree, root) = parse("<r><a><b><c/></b></a></r>");
        let a = tree[root].children[0];
        let copy = tree.deep_copy(a, 1, 3).unwrap();
        let b = tree[copy].children[0];
        assert_eq!(tree[tree[b].children[0]].name, QName::new("", "c"));
        let err = tree.deep_copy(a, 1, 2).unwrap_err();
        assert_eq!(err, Error::DepthLimitExceeded { limit: 2 });
        assert!(tree.deep_copy(a, 3, 2).is_err());
    }

    #[test]
    fn replace_swaps_slot() {
        let (mut tree, root) = parse("<r><a/><b/></r>");
        let a = tree[root].children[0];
        let fresh = tree.alloc(Element::new(QName::new("", "n"), Rc::clone(&tree[root].scope)));
        tree.replace(a, fresh);
        assert_eq!(tree[root].children[0], fresh);
        assert_eq!(tree[a].parent, None);
    }

    #[test]
    fn walk_enforces_depth() {
        let (tree, root) = parse("<a><b><c><d/></c></b></a>");
        assert!(tree.walk(root, 3, |_, _| Ok(())).is_ok());
        let err = tree.walk(root, 2, |_, _| Ok(())).unwrap_err();
        assert_eq!(err, Error::DepthLimitExceeded { limit: 2 });
    }

    #[test]
    fn text_collects_descendants() {
        let (tree, root) = parse("<doc>Hello <b>big</b> world</doc>");
        let text = tree.text(root);
        assert!(text.contains("Hello"));
        assert!(text.contains("big"));
        assert!(text.contains("world"));
    }
}
