//! xsdgen – XSD/WSDL Normalisierung, Typauflösung und Rust-Codegenerierung
//!
//! # Beispiel
//!
//! ```
//! use xsdgen::{parse, Config, QName};
//! use xsdgen::xsd::{Builtin, TypeDef};
//!
//! let xsd = r#"
//!     <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
//!                xmlns:tns="urn:shop" targetNamespace="urn:shop">
//!       <xs:simpleType name="Sku"><xs:restriction base="xs:token"/></xs:simpleType>
//!       <xs:complexType name="Item">
//!         <xs:sequence><xs:element name="sku" type="tns:Sku"/></xs:sequence>
//!       </xs:complexType>
//!     </xs:schema>"#;
//!
//! let set = parse(&[xsd], &Config::default()).unwrap();
//! let item = set.find_type(&QName::new("urn:shop", "Item")).unwrap();
//! let TypeDef::Complex(item) = set.get(&item) else { unreachable!() };
//! assert_eq!(set.root_builtin(&item.elements[0].ty), Some(Builtin::Token));
//! ```

pub mod codegen;
pub mod config;
pub mod dependency;
pub mod error;
pub mod qname;
pub mod xml;
pub mod xsd;

pub use error::{Error, Result};

/// HashMap mit ahash (schnell, nicht DoS-resistent).
pub type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// HashSet mit ahash.
pub type FastHashSet<K> = hashbrown::HashSet<K, ahash::RandomState>;

/// IndexMap mit ahash (deterministische Iteration + schnelles Hashing).
pub type FastIndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;

// Public API: Pipeline
pub use config::Config;
pub use xsd::{imports, load_with_imports, normalize, parse};

// Public API: Types
pub use qname::QName;
pub use xsd::{SchemaSet, Type};
