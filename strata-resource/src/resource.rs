//! Resource definitions.

use smol_str::SmolStr;

use crate::attribute::Attribute;
use crate::relationship::Relationship;
use crate::repo::Repo;

/// A named unique constraint declared on a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// Stable identifier for the constraint.
    pub name: SmolStr,
    /// Attributes covered by the constraint.
    pub keys: Vec<SmolStr>,
}

impl Identity {
    /// Create a new identity.
    pub fn new<I, K>(name: impl Into<SmolStr>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<SmolStr>,
    {
        Self {
            name: name.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

/// A database-backed resource definition.
///
/// This is the unit the migration generator consumes: everything it needs
/// to know about one entity, introspected into plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Table the resource is stored in.
    pub table: SmolStr,
    /// Repo the table lives in.
    pub repo: Repo,
    /// Declared attributes.
    pub attributes: Vec<Attribute>,
    /// Declared unique constraints.
    pub identities: Vec<Identity>,
    /// Declared relationships.
    pub relationships: Vec<Relationship>,
}

impl Resource {
    /// Create a new resource with no attributes.
    pub fn new(table: impl Into<SmolStr>, repo: Repo) -> Self {
        Self {
            table: table.into(),
            repo,
            attributes: Vec::new(),
            identities: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add an identity.
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identities.push(identity);
        self
    }

    /// Add a relationship.
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}
