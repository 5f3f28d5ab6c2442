//! Subtree → XML text, used for diagnostics (cycle reports, debug logs).

use std::borrow::Cow;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use super::{Element, NodeId, Tree};

/// Serialisiertes Fragment wird nach so vielen Bytes abgeschnitten.
const MAX_SNIPPET_BYTES: usize = 4096;

/// Verschachtelungstiefe, ab der Kinder nur noch als `...` erscheinen.
const MAX_SNIPPET_DEPTH: usize = 32;

type EmitResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Serializes the subtree at `id` as indented XML.
///
/// Element and attribute names are spelled with the prefixes visible at each
/// node. Output longer than 4 KiB is truncated.
pub fn to_string(tree: &Tree, id: NodeId) -> String {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    // Schreiben in einen Vec schlägt nicht fehl.
    let _ = write_node(tree, id, &mut writer, 0);
    let mut out = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    if out.len() > MAX_SNIPPET_BYTES {
        let mut cut = MAX_SNIPPET_BYTES;
        while !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
        out.push_str("...");
    }
    out
}

fn write_node(tree: &Tree, id: NodeId, writer: &mut Writer<Vec<u8>>, depth: usize) -> EmitResult {
    let el = &tree[id];
    let name = display_name(el, &el.name.uri, &el.name.local_name);
    let mut start = BytesStart::new(name.as_ref());
    for attr in &el.attrs {
        let key = display_name(el, &attr.name.uri, &attr.name.local_name);
        start.push_attribute((key.as_ref(), attr.value.as_str()));
    }

    let content = el.content.trim();
    if el.children.is_empty() && content.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if !content.is_empty() {
        writer.write_event(Event::Text(BytesText::new(content)))?;
    }
    if depth >= MAX_SNIPPET_DEPTH {
        writer.write_event(Event::Text(BytesText::new("...")))?;
    } else {
        for &child in &el.children {
            write_node(tree, child, writer, depth + 1)?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new(name.as_ref())))?;
    Ok(())
}

fn display_name<'a>(el: &Element, uri: &str, local: &'a str) -> Cow<'a, str> {
    if uri.is_empty() || el.scope.default_namespace() == Some(uri) {
        return Cow::Borrowed(local);
    }
    match el.scope.prefix_for(uri) {
        Some(prefix) => Cow::Owned(format!("{prefix}:{local}")),
        None => Cow::Borrowed(local),
    }
}
