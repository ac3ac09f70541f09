//! Attribute definitions for resources.

use serde_json::Value;
use smol_str::SmolStr;

/// The declared type of a resource attribute.
///
/// This set is open: applications may declare whatever types their data
/// layer supports. The migration generator only handles a closed subset and
/// rejects everything else when a snapshot is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// UTF-8 text.
    String,
    /// Signed integer.
    Integer,
    /// Boolean.
    Boolean,
    /// UUID stored as a binary id.
    BinaryId,
    /// Any other declared type (timestamps, decimals, custom types, ...).
    Other(SmolStr),
}

impl AttributeType {
    /// The declared name of the type.
    pub fn name(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::BinaryId => "binary_id",
            Self::Other(name) => name,
        }
    }
}

/// A recognized default-value generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorFn {
    /// The UUID v4 generator.
    UuidV4,
    /// The current-timestamp generator.
    Now,
    /// Any other generator function.
    Custom,
}

/// The default value declared on an attribute.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DefaultValue {
    /// No default.
    #[default]
    None,
    /// A literal value, encoded with the attribute's type.
    Value(Value),
    /// A generator function invoked by the database or data layer.
    Generator(GeneratorFn),
    /// An opaque expression node carried through from the declaration.
    Expr,
}

/// An attribute declared on a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name.
    pub name: SmolStr,
    /// Declared type.
    pub ty: AttributeType,
    /// Declared default.
    pub default: DefaultValue,
    /// Whether null values are allowed.
    pub allow_nil: bool,
    /// Whether this attribute is part of the primary key.
    pub primary_key: bool,
}

impl Attribute {
    /// Create a new nullable, non-key attribute.
    pub fn new(name: impl Into<SmolStr>, ty: AttributeType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: DefaultValue::None,
            allow_nil: true,
            primary_key: false,
        }
    }

    /// Mark the attribute as part of the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.allow_nil = false;
        self
    }

    /// Set whether null values are allowed.
    pub fn allow_nil(mut self, allow: bool) -> Self {
        self.allow_nil = allow;
        self
    }

    /// Set the declared default.
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = default;
        self
    }
}
