//! Central error types for schema loading, normalization and type resolution.
//!
//! Every structural problem is fatal: the pipeline has no partial-success
//! mode. Errors raised deep inside a tree walk collect the chain of enclosing
//! schema components (see [`ErrorContext`]) while they propagate, so the
//! caller can locate the offending declaration without re-deriving it.

use core::fmt;

/// All errors produced by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The input is not well-formed XML.
    XmlParseError(String),
    /// An input document exceeds the configured size ceiling.
    DocumentTooLarge { size: usize, max: usize },
    /// A tree walk exceeded the configured depth ceiling.
    DepthLimitExceeded { limit: usize },
    /// A QName-valued attribute uses a prefix that is not bound in scope.
    UnknownPrefix { prefix: String, value: String },
    /// A schema component lacks an attribute it cannot do without.
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    /// An attribute value could not be interpreted (occurs, booleans).
    InvalidValue { attribute: String, value: String },
    /// Two top-level declarations of the same kind share a name in one document.
    DuplicateDeclaration { kind: String, name: String },
    /// A `ref=` attribute names no declaration of the referencing kind.
    UnresolvedRef { kind: String, name: String },
    /// Two documents for the same target namespace declare the same type.
    DuplicateType { namespace: String, name: String },
    /// A type reference could not be resolved after all schemas were parsed.
    UnresolvedType { name: String, context: String },
    /// The flattened document still contains a cycle.
    CyclicSchema { snippet: String },
    /// A base-type chain does not terminate in a builtin type.
    BaseCycle { name: String },
    /// None of the input documents contains an `<xs:schema>` element.
    NoSchema,
    /// Reading a schema file failed (loader only).
    IoError(String),
    /// An error annotated with the chain of enclosing schema components,
    /// innermost frame first.
    Context {
        frames: Vec<String>,
        source: Box<Error>,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XmlParseError(msg) => write!(f, "XML parse error: {msg}"),
            Self::DocumentTooLarge { size, max } => {
                write!(f, "document too large: {size} bytes (max {max} bytes)")
            }
            Self::DepthLimitExceeded { limit } => {
                write!(f, "nesting depth limit of {limit} exceeded")
            }
            Self::UnknownPrefix { prefix, value } => {
                write!(f, "unknown prefix '{prefix}' in '{value}'")
            }
            Self::MissingAttribute { element, attribute } => {
                write!(f, "<{element}> is missing required attribute '{attribute}'")
            }
            Self::InvalidValue { attribute, value } => {
                write!(f, "invalid value '{value}' for attribute '{attribute}'")
            }
            Self::DuplicateDeclaration { kind, name } => {
                write!(f, "duplicate {kind} declaration '{name}'")
            }
            Self::UnresolvedRef { kind, name } => {
                write!(f, "ref to undeclared {kind} '{name}'")
            }
            Self::DuplicateType { namespace, name } => {
                write!(f, "type '{name}' declared twice in namespace '{namespace}'")
            }
            Self::UnresolvedType { name, context } => {
                write!(f, "could not resolve type '{name}' referenced by {context}")
            }
            Self::CyclicSchema { snippet } => {
                write!(f, "schema contains a reference cycle: {snippet}")
            }
            Self::BaseCycle { name } => {
                write!(f, "base type chain of '{name}' does not end in a builtin type")
            }
            Self::NoSchema => write!(f, "no <schema> element found in input documents"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
            Self::Context { frames, source } => {
                for (i, frame) in frames.iter().rev().enumerate() {
                    if i > 0 {
                        f.write_str(" > ")?;
                    }
                    f.write_str(frame)?;
                }
                write!(f, ": {source}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl Error {
    /// Adds an enclosing frame. Frames accumulate innermost first.
    pub fn with_frame(self, frame: impl Into<String>) -> Self {
        match self {
            Self::Context { mut frames, source } => {
                frames.push(frame.into());
                Self::Context { frames, source }
            }
            other => Self::Context {
                frames: vec![frame.into()],
                source: Box::new(other),
            },
        }
    }

    /// The error without any breadcrumb wrapping.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Breadcrumb frames, outermost first.
    pub fn frames(&self) -> Vec<&str> {
        match self {
            Self::Context { frames, .. } => frames.iter().rev().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn invalid_value(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// Breadcrumb annotation for fallible walks.
///
/// ```
/// use xsdgen::error::{Error, ErrorContext, Result};
///
/// fn inner() -> Result<()> {
///     Err(Error::NoSchema)
/// }
///
/// let err = inner()
///     .frame(|| "element \"Count\"".to_string())
///     .frame(|| "complexType \"Widget\"".to_string())
///     .unwrap_err();
/// assert_eq!(err.frames(), ["complexType \"Widget\"", "element \"Count\""]);
/// ```
pub trait ErrorContext {
    /// Pushes the frame lazily, only on the error path.
    fn frame<F: FnOnce() -> String>(self, frame: F) -> Self;
}

impl<T> ErrorContext for Result<T> {
    fn frame<F: FnOnce() -> String>(self, frame: F) -> Self {
        self.map_err(|e| e.with_frame(frame()))
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
