//! Kanonische Namen (namespace URI + local-name).
//!
//! Jede Deklaration, jeder Typ und jede Referenz im Schema-Modell wird über
//! einen [`QName`] identifiziert. Prefixe existieren nur im Quelldokument
//! (siehe [`crate::xml::Scope`]) und sind nie Teil der Identität.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use ahash::AHasher;

/// XML Schema namespace.
pub const XS_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// Implicitly bound to the `xml` prefix in every document.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A namespace-qualified name.
///
/// `identity` ist ein vorberechneter 64-Bit-Hash von (uri, local_name).
/// Vermeidet wiederholtes String-Hashing bei HashMap-Operationen, die im
/// Schema-Index und in der globalen Typ-Map dominieren.
#[derive(Clone)]
pub struct QName {
    /// The namespace URI. Empty string means no namespace.
    pub uri: Rc<str>,
    /// The local name.
    pub local_name: Rc<str>,
    identity: u64,
}

impl fmt::Debug for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QName")
            .field("uri", &self.uri)
            .field("local_name", &self.local_name)
            .finish()
    }
}

/// Berechnet den Identity-Hash für ein QName (uri + local_name).
fn compute_identity(uri: &str, local_name: &str) -> u64 {
    let mut hasher = AHasher::default();
    uri.hash(&mut hasher);
    local_name.hash(&mut hasher);
    hasher.finish()
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
            && self.uri == other.uri
            && self.local_name == other.local_name
    }
}

impl Eq for QName {}

/// Sortierung: erst URI, dann local_name (stabile Ausgabe pro Namespace).
impl PartialOrd for QName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.uri
            .cmp(&other.uri)
            .then_with(|| self.local_name.cmp(&other.local_name))
    }
}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

/// Display in Clark-Notation: `{uri}local`, bzw. nur `local` ohne Namespace.
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.uri.is_empty() {
            f.write_str(&self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.uri, self.local_name)
        }
    }
}

impl Default for QName {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl QName {
    /// Creates a new QName with the given URI and local-name.
    pub fn new(uri: impl Into<Rc<str>>, local_name: impl Into<Rc<str>>) -> Self {
        let uri = uri.into();
        let local_name = local_name.into();
        let identity = compute_identity(&uri, &local_name);
        Self {
            uri,
            local_name,
            identity,
        }
    }

    /// Shorthand for a name in the XML Schema namespace.
    pub fn xs(local_name: &str) -> Self {
        Self::new(XS_NS, local_name)
    }

    /// True if this name lives in the XML Schema namespace.
    #[inline]
    pub fn is_xs(&self) -> bool {
        &*self.uri == XS_NS
    }
}
