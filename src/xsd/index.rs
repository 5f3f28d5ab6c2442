//! Schema Index: `(canonical name, kind)` → declaration node.
//!
//! Built once per normalization run over the top-level declarations of all
//! schema documents. Entries get dense integer ids so the dependency graph
//! of ref flattening can work on arena indices.

use std::fmt;

use log::warn;

use crate::error::{Error, Result};
use crate::qname::{QName, XS_NS};
use crate::xml::{NodeId, Tree};
use crate::FastHashMap;

/// Symbol space of a declaration. An element and a complex type may share a
/// name, so the kind is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Element,
    Attribute,
    ComplexType,
    SimpleType,
    Group,
    AttributeGroup,
}

impl Kind {
    /// Kind for an `xs:` element local name.
    pub fn from_local(local: &str) -> Option<Kind> {
        Some(match local {
            "element" => Kind::Element,
            "attribute" => Kind::Attribute,
            "complexType" => Kind::ComplexType,
            "simpleType" => Kind::SimpleType,
            "group" => Kind::Group,
            "attributeGroup" => Kind::AttributeGroup,
            _ => return None,
        })
    }

    pub fn local_name(self) -> &'static str {
        match self {
            Kind::Element => "element",
            Kind::Attribute => "attribute",
            Kind::ComplexType => "complexType",
            Kind::SimpleType => "simpleType",
            Kind::Group => "group",
            Kind::AttributeGroup => "attributeGroup",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.local_name())
    }
}

#[derive(Debug, Clone)]
struct Entry {
    name: QName,
    kind: Kind,
    node: NodeId,
    schema: NodeId,
}

/// Keyed lookup over top-level declarations.
#[derive(Debug, Clone, Default)]
pub struct Index {
    ids: FastHashMap<(QName, Kind), usize>,
    by_node: FastHashMap<NodeId, usize>,
    entries: Vec<Entry>,
}

impl Index {
    /// Indexes the direct children of every `<schema>` in `schemas`.
    ///
    /// A name declared twice in one document is an error. Across documents
    /// sharing a target namespace the first declaration wins; type
    /// collisions are reported later by the merge step.
    pub fn build(tree: &Tree, schemas: &[NodeId]) -> Result<Index> {
        let mut index = Index::default();
        for &schema in schemas {
            let tns = tree.attr(schema, "targetNamespace").unwrap_or("");
            for &child in &tree[schema].children {
                let el = &tree[child];
                if &*el.name.uri != XS_NS {
                    continue;
                }
                let (Some(kind), Some(local)) = (Kind::from_local(el.local()), el.attr("name"))
                else {
                    continue;
                };
                let name = QName::new(tns, local.trim());
                index.insert(name, kind, child, schema)?;
            }
        }
        Ok(index)
    }

    fn insert(&mut self, name: QName, kind: Kind, node: NodeId, schema: NodeId) -> Result<()> {
        let key = (name, kind);
        if let Some(&existing) = self.ids.get(&key) {
            let (name, kind) = key;
            if self.entries[existing].schema == schema {
                return Err(Error::DuplicateDeclaration {
                    kind: kind.to_string(),
                    name: name.to_string(),
                });
            }
            warn!("{kind} {name} declared in more than one document; keeping the first");
            return Ok(());
        }
        let id = self.entries.len();
        self.entries.push(Entry {
            name: key.0.clone(),
            kind,
            node,
            schema,
        });
        self.ids.insert(key, id);
        self.by_node.insert(node, id);
        Ok(())
    }

    /// Declaration node for `(name, kind)`.
    pub fn lookup(&self, name: &QName, kind: Kind) -> Option<NodeId> {
        self.id(name, kind).map(|id| self.entries[id].node)
    }

    /// Dense id for `(name, kind)`, usable as a [`crate::dependency::Graph`] node.
    pub fn id(&self, name: &QName, kind: Kind) -> Option<usize> {
        // Key-Klon ist billig: QName besteht aus zwei Rc und einem Hash.
        self.ids.get(&(name.clone(), kind)).copied()
    }

    /// Id of a declaration node, if it is indexed.
    pub fn id_of_node(&self, node: NodeId) -> Option<usize> {
        self.by_node.get(&node).copied()
    }

    /// Node behind an id.
    pub fn node(&self, id: usize) -> NodeId {
        self.entries[id].node
    }

    /// Canonical name and kind behind an id.
    pub fn key(&self, id: usize) -> (&QName, Kind) {
        let e = &self.entries[id];
        (&e.name, e.kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
