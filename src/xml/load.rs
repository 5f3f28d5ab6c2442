//! roxmltree → arena loader.

use std::rc::Rc;

use roxmltree::{Document, Node, ParsingOptions};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::qname::QName;

use super::{Attr, Element, NodeId, NsBinding, Scope, Tree};

/// Parses `text` into `tree` and returns the (detached) document element.
///
/// Rejects documents above `config.max_document_size` and element nesting
/// deeper than `config.max_depth` with an ordinary error instead of
/// exhausting the stack.
pub(crate) fn load(tree: &mut Tree, text: &str, config: &Config) -> Result<NodeId> {
    if text.len() > config.max_document_size {
        return Err(Error::DocumentTooLarge {
            size: text.len(),
            max: config.max_document_size,
        });
    }
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let xml_opts = ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = Document::parse_with_options(text, xml_opts)
        .map_err(|e| Error::XmlParseError(e.to_string()))?;

    let empty = Rc::new(Scope::default());
    copy_element(tree, doc.root_element(), &empty, 0, config.max_depth)
}

fn copy_element(
    tree: &mut Tree,
    node: Node<'_, '_>,
    parent_scope: &Rc<Scope>,
    depth: usize,
    max_depth: usize,
) -> Result<NodeId> {
    if depth > max_depth {
        return Err(Error::DepthLimitExceeded { limit: max_depth });
    }

    let scope = scope_of(node, parent_scope);
    let tag = node.tag_name();
    let mut element = Element::new(
        QName::new(tag.namespace().unwrap_or(""), tag.name()),
        Rc::clone(&scope),
    );
    element.attrs = node
        .attributes()
        .map(|a| Attr {
            name: QName::new(a.namespace().unwrap_or(""), a.name()),
            value: a.value().to_string(),
        })
        .collect();
    element.content = node
        .children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect();

    let id = tree.alloc(element);
    for child in node.children().filter(|c| c.is_element()) {
        let child_id = copy_element(tree, child, &scope, depth + 1, max_depth)?;
        tree.append_child(id, child_id);
    }
    Ok(id)
}

/// Scope eines Knotens; teilt das Rc des Elternknotens, wenn der Knoten
/// selbst nichts deklariert.
fn scope_of(node: Node<'_, '_>, parent_scope: &Rc<Scope>) -> Rc<Scope> {
    // roxmltree liefert alle sichtbaren Namespaces (ohne verdeckte), inkl. `xml`.
    let mut bindings: Vec<NsBinding> = node
        .namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .map(|ns| NsBinding {
            prefix: Rc::from(ns.name().unwrap_or("")),
            uri: Rc::from(ns.uri()),
        })
        .collect();
    bindings.sort_by(|a, b| a.prefix.cmp(&b.prefix));

    let mut inherited = parent_scope.bindings().to_vec();
    inherited.sort_by(|a, b| a.prefix.cmp(&b.prefix));
    if inherited == bindings {
        Rc::clone(parent_scope)
    } else {
        Rc::new(Scope::new(bindings))
    }
}
