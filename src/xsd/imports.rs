//! `xs:import` / `xs:include` Hilfen.
//!
//! Die Pipeline selbst folgt keinen Schema-Locations; Aufrufer sammeln alle
//! Dokumente vorab. [`imports`] listet die Verweise eines Dokuments,
//! [`load_with_imports`] folgt relativen Pfaden rekursiv.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use roxmltree::{Document, ParsingOptions};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::qname::{XML_NS, XS_NS};
use crate::FastHashSet;

/// Art des Verweises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Import,
    Include,
    Redefine,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImportKind::Import => "import",
            ImportKind::Include => "include",
            ImportKind::Redefine => "redefine",
        })
    }
}

/// One `<import>`, `<include>` or `<redefine>` of a schema document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub kind: ImportKind,
    /// `namespace` attribute (imports only).
    pub namespace: Option<String>,
    /// `schemaLocation` attribute. Optional for imports.
    pub location: Option<String>,
}

/// Lists the schema references of every `<xs:schema>` in `doc`.
///
/// # Beispiel
///
/// ```
/// use xsdgen::xsd::{imports, ImportKind};
///
/// let xsd = r#"
///     <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
///       <xs:import namespace="urn:other" schemaLocation="other.xsd"/>
///       <xs:include schemaLocation="common.xsd"/>
///     </xs:schema>"#;
/// let found = imports(xsd).unwrap();
/// assert_eq!(found.len(), 2);
/// assert_eq!(found[0].kind, ImportKind::Import);
/// assert_eq!(found[1].location.as_deref(), Some("common.xsd"));
/// ```
pub fn imports(doc: &str) -> Result<Vec<Import>> {
    let xml_opts = ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = Document::parse_with_options(doc, xml_opts)
        .map_err(|e| Error::XmlParseError(e.to_string()))?;

    let mut found = Vec::new();
    let schemas = doc
        .descendants()
        .filter(|n| n.tag_name().namespace() == Some(XS_NS) && n.tag_name().name() == "schema");
    for schema in schemas {
        for node in schema.children().filter(|n| n.tag_name().namespace() == Some(XS_NS)) {
            let kind = match node.tag_name().name() {
                "import" => ImportKind::Import,
                "include" => ImportKind::Include,
                "redefine" => ImportKind::Redefine,
                _ => continue,
            };
            found.push(Import {
                kind,
                namespace: node.attribute("namespace").map(str::to_string),
                location: node.attribute("schemaLocation").map(str::to_string),
            });
        }
    }
    Ok(found)
}

/// Reads `path` and every schema it references through relative
/// `schemaLocation`s, depth first. The returned texts can be passed to
/// [`crate::xsd::parse`] as they are.
///
/// Each file is read once, so import cycles terminate. Remote locations and
/// the XML namespace are skipped.
pub fn load_with_imports(path: &Path, config: &Config) -> Result<Vec<String>> {
    let mut loader = Loader {
        config,
        seen: FastHashSet::default(),
        docs: Vec::new(),
    };
    loader.load(path)?;
    debug!("{}: {} schema documents", path.display(), loader.docs.len());
    Ok(loader.docs)
}

struct Loader<'c> {
    config: &'c Config,
    seen: FastHashSet<PathBuf>,
    docs: Vec<String>,
}

impl Loader<'_> {
    fn load(&mut self, path: &Path) -> Result<()> {
        let canonical = path.canonicalize().map_err(|e| {
            Error::IoError(format!("cannot resolve schema path '{}': {e}", path.display()))
        })?;
        if !self.seen.insert(canonical.clone()) {
            return Ok(());
        }

        let content = std::fs::read_to_string(&canonical)
            .map_err(|e| Error::IoError(format!("cannot read '{}': {e}", path.display())))?;
        if content.len() > self.config.max_document_size {
            return Err(Error::DocumentTooLarge {
                size: content.len(),
                max: self.config.max_document_size,
            });
        }

        let refs = imports(&content)?;
        self.docs.push(content);

        let dir = canonical.parent().unwrap_or(Path::new(".")).to_path_buf();
        for import in refs {
            if import.namespace.as_deref().is_some_and(|ns| ns == XML_NS || ns == XS_NS) {
                continue;
            }
            let Some(location) = import.location else {
                debug!("{} without schemaLocation skipped", import.kind);
                continue;
            };
            if location.starts_with("http://") || location.starts_with("https://") {
                warn!("remote schema location '{location}' not fetched");
                continue;
            }
            let next = dir.join(&location);
            if !next.exists() {
                return Err(Error::IoError(format!(
                    "{} of '{location}' from '{}': file not found",
                    import.kind,
                    path.display()
                )));
            }
            self.load(&next)?;
        }
        Ok(())
    }
}
