//! Built-in XSD datatypes (XML Schema Part 2, §3).

use std::fmt;

use crate::qname::{QName, XS_NS};

macro_rules! builtins {
    ($($variant:ident => $local:literal,)*) => {
        /// One of the fixed XSD primitive and derived built-in types.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Builtin {
            $($variant,)*
        }

        impl Builtin {
            /// Every builtin, in declaration order.
            pub const ALL: &'static [Builtin] = &[$(Builtin::$variant,)*];

            /// Local name in the XML Schema namespace.
            pub fn local_name(self) -> &'static str {
                match self {
                    $(Builtin::$variant => $local,)*
                }
            }

            fn from_local(local: &str) -> Option<Builtin> {
                match local {
                    $($local => Some(Builtin::$variant),)*
                    // XSD 1.1 Wurzel der atomaren Typen; hier ohne eigene Semantik.
                    "anyAtomicType" => Some(Builtin::AnySimpleType),
                    _ => None,
                }
            }
        }
    };
}

builtins! {
    AnyType => "anyType",
    AnySimpleType => "anySimpleType",
    Entities => "ENTITIES",
    Entity => "ENTITY",
    Id => "ID",
    IdRef => "IDREF",
    IdRefs => "IDREFS",
    NcName => "NCName",
    NmToken => "NMTOKEN",
    NmTokens => "NMTOKENS",
    Notation => "NOTATION",
    Name => "Name",
    QName => "QName",
    AnyUri => "anyURI",
    Base64Binary => "base64Binary",
    Boolean => "boolean",
    Byte => "byte",
    Date => "date",
    DateTime => "dateTime",
    Decimal => "decimal",
    Double => "double",
    Duration => "duration",
    Float => "float",
    GDay => "gDay",
    GMonth => "gMonth",
    GMonthDay => "gMonthDay",
    GYear => "gYear",
    GYearMonth => "gYearMonth",
    HexBinary => "hexBinary",
    Int => "int",
    Integer => "integer",
    Language => "language",
    Long => "long",
    NegativeInteger => "negativeInteger",
    NonNegativeInteger => "nonNegativeInteger",
    NonPositiveInteger => "nonPositiveInteger",
    NormalizedString => "normalizedString",
    PositiveInteger => "positiveInteger",
    Short => "short",
    String => "string",
    Time => "time",
    Token => "token",
    UnsignedByte => "unsignedByte",
    UnsignedInt => "unsignedInt",
    UnsignedLong => "unsignedLong",
    UnsignedShort => "unsignedShort",
}

impl Builtin {
    /// Looks up a builtin by canonical name.
    pub fn from_name(name: &QName) -> Option<Builtin> {
        if &*name.uri != XS_NS {
            return None;
        }
        Self::from_local(&name.local_name)
    }

    /// Canonical name, `{http://www.w3.org/2001/XMLSchema}local`.
    pub fn name(self) -> QName {
        QName::xs(self.local_name())
    }

    /// True for the list types (`IDREFS`, `ENTITIES`, `NMTOKENS`).
    pub fn is_list(self) -> bool {
        matches!(self, Builtin::IdRefs | Builtin::Entities | Builtin::NmTokens)
    }

    /// True for numeric types (decimal and float families).
    pub fn is_numeric(self) -> bool {
        use Builtin::*;
        matches!(
            self,
            Byte | Decimal
                | Double
                | Float
                | Int
                | Integer
                | Long
                | NegativeInteger
                | NonNegativeInteger
                | NonPositiveInteger
                | PositiveInteger
                | Short
                | UnsignedByte
                | UnsignedInt
                | UnsignedLong
                | UnsignedShort
        )
    }

    /// True for date, time and duration types.
    pub fn is_temporal(self) -> bool {
        use Builtin::*;
        matches!(
            self,
            Date | DateTime | Duration | GDay | GMonth | GMonthDay | GYear | GYearMonth | Time
        )
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xs:{}", self.local_name())
    }
}
