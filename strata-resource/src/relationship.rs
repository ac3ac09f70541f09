//! Relationship definitions for resources.

use smol_str::SmolStr;

use crate::repo::Repo;

/// The kind of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
    /// This resource holds the foreign key.
    BelongsTo,
    /// The related resource holds the foreign key; at most one related row.
    HasOne,
    /// The related resource holds the foreign key; any number of rows.
    HasMany,
    /// Joined through an intermediate table.
    ManyToMany,
}

/// The related resource, when it is visible to the migration generator.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipTarget {
    /// Table of the related resource.
    pub table: SmolStr,
    /// Repo of the related resource.
    pub repo: Repo,
}

/// A relationship declared on a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Relationship kind.
    pub kind: RelationshipKind,
    /// Attribute on this resource that carries the edge.
    pub source_field: SmolStr,
    /// Attribute on the related resource the edge points at.
    pub destination_field: SmolStr,
    /// The related resource. `None` when it lives in a different data layer,
    /// in which case the generator cannot express the edge.
    pub destination: Option<RelationshipTarget>,
}

impl Relationship {
    /// Create a `belongs_to` relationship.
    pub fn belongs_to(
        source_field: impl Into<SmolStr>,
        destination_field: impl Into<SmolStr>,
    ) -> Self {
        Self {
            kind: RelationshipKind::BelongsTo,
            source_field: source_field.into(),
            destination_field: destination_field.into(),
            destination: None,
        }
    }

    /// Set the related resource.
    pub fn with_destination(mut self, table: impl Into<SmolStr>, repo: Repo) -> Self {
        self.destination = Some(RelationshipTarget {
            table: table.into(),
            repo,
        });
        self
    }
}
