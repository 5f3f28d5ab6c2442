//! Run-time options for a normalization/resolution run.
//!
//! `Config` ist der einzige langlebige, von außen gelieferte Zustand. Er wird
//! explizit übergeben und während eines Laufs nur gelesen.

use std::fmt;
use std::rc::Rc;

use crate::xsd::types::TypeDefMut;

/// Maximale Größe eines Eingabedokuments (16 MiB).
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Maximale Verschachtelungstiefe beim Laden und Durchlaufen eines Baums.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Post-processing hook applied to every resolved type.
pub type TypeTransform = Rc<dyn Fn(TypeDefMut<'_>)>;

/// Options for [`crate::xsd::parse`] and [`crate::xsd::normalize`].
#[derive(Clone)]
pub struct Config {
    /// Depth ceiling for tree loading and recursive passes.
    pub max_depth: usize,
    /// Size ceiling per input document, in bytes.
    pub max_document_size: usize,
    /// Include the embedded xml/soap-encoding/wsdl/xlink schemas.
    pub standard_schemas: bool,
    transforms: Vec<TypeTransform>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            standard_schemas: true,
            transforms: Vec::new(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("max_depth", &self.max_depth)
            .field("max_document_size", &self.max_document_size)
            .field("standard_schemas", &self.standard_schemas)
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

impl Config {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Konfiguration mit anderer Tiefenbegrenzung.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Konfiguration mit anderer Größenbegrenzung pro Dokument.
    pub fn with_max_document_size(mut self, max_document_size: usize) -> Self {
        self.max_document_size = max_document_size;
        self
    }

    /// Konfiguration ohne eingebettete Standard-Schemas.
    pub fn without_standard_schemas(mut self) -> Self {
        self.standard_schemas = false;
        self
    }

    /// Registers a type transform. Transforms run in registration order.
    ///
    /// ```
    /// use xsdgen::config::Config;
    /// use xsdgen::xsd::types::TypeDefMut;
    ///
    /// let config = Config::new().with_transform(|def| {
    ///     if let TypeDefMut::Complex(c) = def {
    ///         c.doc.push_str(" (generated)");
    ///     }
    /// });
    /// assert_eq!(config.transforms().len(), 1);
    /// ```
    pub fn with_transform(mut self, transform: impl Fn(TypeDefMut<'_>) + 'static) -> Self {
        self.transforms.push(Rc::new(transform));
        self
    }

    /// Registered transforms.
    pub fn transforms(&self) -> &[TypeTransform] {
        &self.transforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(c.max_document_size, DEFAULT_MAX_DOCUMENT_SIZE);
        assert!(c.standard_schemas);
        assert!(c.transforms().is_empty());
    }

    #[test]
    fn builder_methods() {
        let c = Config::new()
            .with_max_depth(12)
            .with_max_document_size(1024)
            .without_standard_schemas();
        assert_eq!(c.max_depth, 12);
        assert_eq!(c.max_document_size, 1024);
        assert!(!c.standard_schemas);
        let dbg = format!("{c:?}");
        assert!(dbg.contains("max_depth: 12"), "{dbg}");
    }
}
