//! Normalizer: rewrites raw schema trees into canonical form.
//!
//! Passes, in order (each relies on the ones before it):
//!
//! 1. default types for untyped `<element>`/`<attribute>`
//! 2. inline types named after their enclosing declaration, where free
//! 3. remaining inline types named `_anonN`; all inline types hoisted
//! 4. children of `<choice>` made optional
//! 5. `<complexType>` shorthand wrapped in `complexContent/restriction`
//! 6. `ref=` replaced by copies of the referenced declarations
//! 7. non-top-level `<group>`/`<attributeGroup>` wrappers spliced away
//! 8. acyclicity check
//!
//! Any error aborts the whole run; nothing is partially applied.

use std::rc::Rc;

use log::{debug, trace, warn};

use crate::config::Config;
use crate::dependency::Graph;
use crate::error::{Error, ErrorContext, Result};
use crate::qname::{QName, XS_NS};
use crate::xml::{emit, Attr, Element, NodeId, Scope, Tree};
use crate::{FastHashMap, FastHashSet};

use super::index::{Index, Kind};
use super::predicate::{
    and, children, has_attr, has_child, is, is_top_level, is_type, not, or, select, Predicate,
    QNAME_ATTRS, QNAME_LIST_ATTRS,
};
use super::{breadcrumbs, standard, target_ns};

/// Normalized schema trees.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub tree: Tree,
    /// Every `<schema>` element, user documents first, then standard schemas.
    pub schemas: Vec<NodeId>,
    anonymous: FastHashSet<NodeId>,
}

impl Normalized {
    /// True if the type declaration `id` was inline in the source and got
    /// its name during normalization.
    pub fn is_anonymous(&self, id: NodeId) -> bool {
        self.anonymous.contains(&id)
    }

    /// Target namespace of a `<schema>` element.
    pub fn target_ns(&self, schema: NodeId) -> &str {
        target_ns(&self.tree, schema)
    }
}

/// Loads `docs` (plus the standard schemas) and normalizes them.
///
/// Every `<xs:schema>` element is picked up wherever it sits in a document,
/// so WSDL files can be passed as-is.
///
/// # Beispiel
///
/// ```
/// use xsdgen::config::Config;
/// use xsdgen::xsd::normalize;
///
/// let xsd = r#"
///     <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
///         <xs:element name="a"/>
///     </xs:schema>"#;
/// let n = normalize(&[xsd], &Config::default().without_standard_schemas()).unwrap();
/// let el = n.tree[n.schemas[0]].children[0];
/// assert_eq!(n.tree.attr(el, "type"), Some("xs:anyType"));
/// ```
pub fn normalize(docs: &[&str], config: &Config) -> Result<Normalized> {
    let mut tree = Tree::new();
    for (i, doc) in docs.iter().enumerate() {
        tree.parse_document(doc, config)
            .frame(|| format!("document {}", i + 1))?;
    }
    let mut schemas = find_schemas(&tree);
    if schemas.is_empty() {
        return Err(Error::NoSchema);
    }

    if config.standard_schemas {
        let supplied: FastHashSet<String> = schemas
            .iter()
            .map(|&s| target_ns(&tree, s).to_string())
            .collect();
        for (ns, text) in standard::SCHEMAS {
            if supplied.contains(*ns) {
                warn!("built-in schema for {ns} shadowed by a supplied document");
                continue;
            }
            let root = tree.parse_document(text, config)?;
            schemas.push(root);
        }
    }

    let mut anonymous = FastHashSet::default();
    let mut taken = top_level_type_names(&tree, &schemas);

    default_types(&mut tree, &schemas);
    debug!("pass 1: default types");
    name_from_context(&mut tree, &schemas, &mut taken);
    debug!("pass 2: context names");
    hoist_anonymous(&mut tree, &schemas, &mut taken, &mut anonymous);
    debug!("pass 3: {} inline types hoisted", anonymous.len());
    choice_optional(&mut tree, &schemas);
    debug!("pass 4: choice optionality");
    expand_complex_shorthand(&mut tree, &schemas);
    debug!("pass 5: complex content shorthand");
    flatten_refs(&mut tree, &schemas, config.max_depth)?;
    debug!("pass 6: refs flattened");
    unpack_groups(&mut tree, &schemas);
    debug!("pass 7: groups unpacked");
    check_acyclic(&tree, &schemas, config.max_depth)?;
    debug!("pass 8: {} schema trees are acyclic", schemas.len());

    Ok(Normalized {
        tree,
        schemas,
        anonymous,
    })
}

fn find_schemas(tree: &Tree) -> Vec<NodeId> {
    tree.roots()
        .iter()
        .flat_map(|&root| tree.search(root, XS_NS, "schema"))
        .collect()
}

fn top_level_type_names(tree: &Tree, schemas: &[NodeId]) -> FastHashSet<QName> {
    let mut names = FastHashSet::default();
    for &schema in schemas {
        let tns = target_ns(tree, schema);
        for ty in children(tree, schema, and(is_type(), has_attr("name"))) {
            if let Some(name) = tree.attr(ty, "name") {
                names.insert(QName::new(tns, name.trim()));
            }
        }
    }
    names
}

fn is_xs_node(tree: &Tree, id: NodeId) -> bool {
    tree[id].name.is_xs()
}

/// A `ref=` site the flattening pass is responsible for.
fn is_ref() -> impl Predicate {
    |tree: &Tree, id: NodeId| {
        is_xs_node(tree, id)
            && Kind::from_local(tree[id].local()).is_some()
            && tree.attr(id, "ref").is_some()
    }
}

// ========================================================================
// Pass 1: Default-Typen
// ========================================================================

/// Gives every untyped element `xs:anyType` and every untyped attribute
/// `xs:anySimpleType`. Declarations with `ref=` or an inline type are left
/// alone.
pub(crate) fn default_types(tree: &mut Tree, schemas: &[NodeId]) {
    let untyped = and(
        or(is("element"), is("attribute")),
        not(or(or(has_attr("type"), has_attr("ref")), has_child(is_type()))),
    );
    for &schema in schemas {
        let tns = target_ns(tree, schema).to_string();
        for id in select(tree, schema, &untyped) {
            let default = if tree[id].is(XS_NS, "element") {
                "anyType"
            } else {
                "anySimpleType"
            };
            let spelled = tree.spell(id, &QName::xs(default), &tns);
            tree[id].set_attr("type", spelled);
        }
    }
}

// ========================================================================
// Pass 2 + 3: Anonyme Typen benennen und hochziehen
// ========================================================================

/// Names an inline type after its element/attribute if that name is still
/// free in the namespace.
pub(crate) fn name_from_context(
    tree: &mut Tree,
    schemas: &[NodeId],
    taken: &mut FastHashSet<QName>,
) {
    for &schema in schemas {
        let tns = target_ns(tree, schema).to_string();
        let sites = select(
            tree,
            schema,
            and(or(is("element"), is("attribute")), has_attr("name")),
        );
        for site in sites {
            let Some(&inline) = children(tree, site, and(is_type(), not(has_attr("name")))).first()
            else {
                continue;
            };
            let local = tree.attr(site, "name").unwrap_or_default().trim().to_string();
            if local.contains(':') {
                continue;
            }
            if taken.insert(QName::new(tns.as_str(), local.as_str())) {
                tree[inline].set_attr("name", local);
            }
        }
    }
}

/// Names every remaining inline type `_anonN` and moves all inline types to
/// the top level of their schema, rewriting the declaring site to refer to
/// them by name.
pub(crate) fn hoist_anonymous(
    tree: &mut Tree,
    schemas: &[NodeId],
    taken: &mut FastHashSet<QName>,
    anonymous: &mut FastHashSet<NodeId>,
) {
    let mut counters: FastHashMap<String, usize> = FastHashMap::default();
    for &schema in schemas {
        let tns = target_ns(tree, schema).to_string();
        for ty in select(tree, schema, and(is_type(), not(is_top_level()))) {
            let name = match tree.attr(ty, "name") {
                Some(local) => QName::new(tns.as_str(), local.trim()),
                None => {
                    let counter = counters.entry(tns.clone()).or_insert(0);
                    let name = loop {
                        let candidate = QName::new(tns.as_str(), format!("_anon{counter}"));
                        *counter += 1;
                        if taken.insert(candidate.clone()) {
                            break candidate;
                        }
                    };
                    tree[ty].set_attr("name", name.local_name.to_string());
                    name
                }
            };

            let parent = tree[ty].parent;
            if let Some(site) = parent
                && is_xs_node(tree, site)
            {
                let attr = match tree[site].local() {
                    "element" | "attribute" => "type",
                    "restriction" | "extension" => "base",
                    "list" => "itemType",
                    "union" => "memberTypes",
                    _ => "",
                };
                if !attr.is_empty() {
                    let spelled = tree.spell(site, &name, &tns);
                    let value = match tree.attr(site, "memberTypes") {
                        Some(m) if attr == "memberTypes" && !m.trim().is_empty() => {
                            format!("{} {spelled}", m.trim())
                        }
                        _ => spelled,
                    };
                    tree[site].set_attr(attr, value);
                }
            }

            tree.detach(ty);
            tree.append_child(schema, ty);
            anonymous.insert(ty);
            trace!("hoisted inline type as {name}");
        }
    }
}

// ========================================================================
// Pass 4: Choice-Optionalität
// ========================================================================

/// Marks every branch of a `<choice>` (and every child of a `<sequence>`
/// branch) `minOccurs="0"`.
pub(crate) fn choice_optional(tree: &mut Tree, schemas: &[NodeId]) {
    for &schema in schemas {
        for choice in select(tree, schema, is("choice")) {
            for branch in children(tree, choice, not(is("annotation"))) {
                tree[branch].set_attr("minOccurs", "0");
                if tree[branch].is(XS_NS, "sequence") {
                    for child in children(tree, branch, not(is("annotation"))) {
                        tree[child].set_attr("minOccurs", "0");
                    }
                }
            }
        }
    }
}

// ========================================================================
// Pass 5: complexContent-Kurzform
// ========================================================================

/// Rewrites `<complexType>` without a content wrapper as a restriction of
/// `xs:anyType` holding the original children.
pub(crate) fn expand_complex_shorthand(tree: &mut Tree, schemas: &[NodeId]) {
    let shorthand = and(
        is("complexType"),
        not(or(has_child(is("simpleContent")), has_child(is("complexContent")))),
    );
    for &schema in schemas {
        let tns = target_ns(tree, schema).to_string();
        for ct in select(tree, schema, &shorthand) {
            let scope = Rc::clone(&tree[ct].scope);
            let content = tree.alloc(Element::new(QName::xs("complexContent"), Rc::clone(&scope)));
            let restriction = tree.alloc(Element::new(QName::xs("restriction"), scope));
            let base = tree.spell(restriction, &QName::xs("anyType"), &tns);
            tree[restriction].set_attr("base", base);
            for child in children(tree, ct, not(is("annotation"))) {
                tree.detach(child);
                tree.append_child(restriction, child);
            }
            tree.append_child(content, restriction);
            tree.append_child(ct, content);
        }
    }
}

// ========================================================================
// Pass 6: Referenzen auflösen
// ========================================================================

/// Top-level declaration that contains `id` (or `id` itself).
fn owner(tree: &Tree, id: NodeId) -> Option<NodeId> {
    std::iter::once(id)
        .chain(tree.ancestors(id))
        .find(|&n| is_top_level()(tree, n))
}

/// Replaces every `ref=` site by a copy of the declaration it names.
///
/// Declarations are processed leaves-first over the reference graph, so a
/// copied declaration never carries refs of its own. A ref that survives
/// (only possible through a reference cycle) is reported as
/// [`Error::CyclicSchema`].
pub(crate) fn flatten_refs(tree: &mut Tree, schemas: &[NodeId], max_depth: usize) -> Result<()> {
    let index = Index::build(tree, schemas)?;
    let mut graph = Graph::new();
    if !index.is_empty() {
        graph.add_node(index.len() - 1);
    }

    let mut owned: Vec<Vec<(NodeId, usize)>> = vec![Vec::new(); index.len()];
    let mut unowned = Vec::new();
    for &schema in schemas {
        let tns = target_ns(tree, schema).to_string();
        for site in select(tree, schema, is_ref()) {
            let Some(kind) = Kind::from_local(tree[site].local()) else {
                continue;
            };
            let value = tree.attr(site, "ref").unwrap_or_default();
            let name = breadcrumbs(tree, site, tree.resolve(site, value, &tns))?;
            let target = index.id(&name, kind).ok_or_else(|| Error::UnresolvedRef {
                kind: kind.to_string(),
                name: name.to_string(),
            });
            let target = breadcrumbs(tree, site, target)?;
            match owner(tree, site).and_then(|o| index.id_of_node(o)) {
                Some(decl) => {
                    graph.add(decl, target);
                    owned[decl].push((site, target));
                }
                None => unowned.push((site, target)),
            }
        }
    }

    graph.flatten(|decl| {
        let refs = std::mem::take(&mut owned[decl]);
        if !refs.is_empty() {
            let (name, kind) = index.key(decl);
            trace!("{kind} {name}: {} refs", refs.len());
        }
        for (site, target) in refs {
            substitute(tree, site, index.node(target), max_depth)?;
        }
        Ok(())
    })?;
    for (site, target) in unowned {
        substitute(tree, site, index.node(target), max_depth)?;
    }

    for &schema in schemas {
        if let Some(&site) = select(tree, schema, is_ref()).first() {
            let top = owner(tree, site).unwrap_or(site);
            let err = Err(Error::CyclicSchema {
                snippet: emit::to_string(tree, top),
            });
            return breadcrumbs(tree, site, err);
        }
    }
    Ok(())
}

/// Puts a copy of `target` where `site` is.
///
/// QName-valued attributes of the copy are re-spelled so they mean the same
/// thing in the referencing document; the referencing node's own attributes
/// (other than `ref`) override the copy's.
///
/// Declared names keep the namespace of the schema that declared them: the
/// copied top-level declaration is always written qualified, and so is every
/// name inside a copy that crosses into another namespace.
fn substitute(tree: &mut Tree, site: NodeId, target: NodeId, max_depth: usize) -> Result<()> {
    let source_ns = target_ns(tree, site).to_string();
    let decl_ns = target_ns(tree, target).to_string();
    let site_scope = Rc::clone(&tree[site].scope);
    let depth = tree.ancestors(site).count();
    let copy = tree.deep_copy(target, depth, max_depth);
    let copy = breadcrumbs(tree, site, copy)?;

    let mut joined: FastHashMap<*const Scope, Rc<Scope>> = FastHashMap::default();
    for node in tree.descendants(copy) {
        let old = Rc::clone(&tree[node].scope);
        let mut rewrites: Vec<(String, Vec<QName>)> = Vec::new();
        let qualify = node == copy || source_ns != decl_ns;
        let declared = declared_qname(tree, node, &old, &decl_ns, qualify)?;
        for attr in tree[node].attrs.iter().filter(|a| a.name.uri.is_empty()) {
            let local = &*attr.name.local_name;
            if QNAME_ATTRS.contains(&local) {
                let name = old.resolve(&attr.value, &decl_ns)?;
                rewrites.push((local.to_string(), vec![name]));
            } else if QNAME_LIST_ATTRS.contains(&local) {
                let names = attr
                    .value
                    .split_whitespace()
                    .map(|v| old.resolve(v, &decl_ns))
                    .collect::<Result<Vec<_>>>()?;
                rewrites.push((local.to_string(), names));
            }
        }
        let scope = joined
            .entry(Rc::as_ptr(&old))
            .or_insert_with(|| Rc::new(old.join(&site_scope)));
        tree[node].scope = Rc::clone(scope);
        for (local, names) in rewrites {
            let spelled: Vec<String> = names
                .iter()
                .map(|n| tree.spell(node, n, &source_ns))
                .collect();
            tree[node].set_attr(&local, spelled.join(" "));
        }
        if let Some(name) = declared {
            let spelled = tree.spell_qualified(node, &name);
            tree[node].set_attr("name", spelled);
        }
    }

    let overlay: Vec<Attr> = tree[site]
        .attrs
        .iter()
        .filter(|a| !(a.name.uri.is_empty() && &*a.name.local_name == "ref"))
        .cloned()
        .collect();
    for attr in overlay {
        let el = &mut tree[copy];
        match el.attrs.iter_mut().find(|a| a.name == attr.name) {
            Some(existing) => existing.value = attr.value,
            None => el.attrs.push(attr),
        }
    }

    trace!(
        "flattened {} ref to {}",
        tree[site].local(),
        tree.attr(copy, "name").unwrap_or_default()
    );
    tree.replace(site, copy);
    Ok(())
}

/// Namespace-qualified `name` of an `<element>`/`<attribute>` in a copy.
///
/// Schon präfixierte Namen werden immer neu aufgelöst, da der Scope der
/// Kopie gleich mit dem der Referenzstelle vereinigt wird. Unpräfixierte nur,
/// wenn `qualify` gilt; ohne targetNamespace bleiben sie unverändert.
fn declared_qname(
    tree: &Tree,
    node: NodeId,
    scope: &Scope,
    decl_ns: &str,
    qualify: bool,
) -> Result<Option<QName>> {
    if !(tree[node].is(XS_NS, "element") || tree[node].is(XS_NS, "attribute")) {
        return Ok(None);
    }
    let Some(name) = tree.attr(node, "name").map(str::trim) else {
        return Ok(None);
    };
    if name.contains(':') {
        return scope.resolve(name, decl_ns).map(Some);
    }
    if qualify && !decl_ns.is_empty() && !name.is_empty() {
        return Ok(Some(QName::new(decl_ns, name)));
    }
    Ok(None)
}

// ========================================================================
// Pass 7: Groups auspacken
// ========================================================================

/// Splices inlined `<group>`/`<attributeGroup>` wrappers into their parent.
/// Occurrence bounds of the wrapper move to children that have none.
pub(crate) fn unpack_groups(tree: &mut Tree, schemas: &[NodeId]) {
    let wrapper = and(or(is("group"), is("attributeGroup")), not(is_top_level()));
    for &schema in schemas {
        for group in select(tree, schema, &wrapper) {
            let min = tree.attr(group, "minOccurs").map(str::to_string);
            let max = tree.attr(group, "maxOccurs").map(str::to_string);
            for annotation in children(tree, group, is("annotation")) {
                tree.detach(annotation);
            }
            for child in tree[group].children.clone() {
                for (attr, value) in [("minOccurs", &min), ("maxOccurs", &max)] {
                    if let Some(value) = value
                        && tree.attr(child, attr).is_none()
                    {
                        tree[child].set_attr(attr, value.as_str());
                    }
                }
            }
            tree.splice(group);
        }
    }
}

// ========================================================================
// Pass 8: Zyklenprüfung
// ========================================================================

/// Fails if any node is reachable twice from the schema roots.
pub(crate) fn check_acyclic(tree: &Tree, schemas: &[NodeId], max_depth: usize) -> Result<()> {
    let mut seen = FastHashSet::default();
    for &schema in schemas {
        tree.walk(schema, max_depth, |id, _| {
            if !seen.insert(id) {
                return breadcrumbs(
                    tree,
                    id,
                    Err(Error::CyclicSchema {
                        snippet: emit::to_string(tree, id),
                    }),
                );
            }
            Ok(())
        })?;
    }
    Ok(())
}
