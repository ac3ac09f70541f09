//! Snapshot construction from resource definitions.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use smol_str::SmolStr;
use strata_resource::{AttributeType, DefaultValue, GeneratorFn, Relationship, RelationshipKind, Repo, Resource};
use tracing::debug;

use crate::error::{MigrateError, MigrateResult};

/// The closed set of column types migrations can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationType {
    /// UTF-8 text column.
    Text,
    /// Integer column.
    Integer,
    /// Boolean column.
    Boolean,
    /// UUID column.
    BinaryId,
}

impl MigrationType {
    /// The column-type name as it appears in migrations and snapshots.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::BinaryId => "binary_id",
        }
    }
}

impl fmt::Display for MigrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A foreign-key edge from an attribute to a column on another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reference {
    /// The referenced table.
    pub table: SmolStr,
    /// The referenced column.
    pub destination_field: SmolStr,
}

/// One column of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attribute {
    /// Column name.
    pub name: SmolStr,
    /// Column type.
    #[serde(rename = "type")]
    pub ty: MigrationType,
    /// Rendered default expression, if any.
    pub default: Option<String>,
    /// Whether null values are allowed.
    #[serde(rename = "allow_nil?")]
    pub allow_nil: bool,
    /// Whether this column is part of the primary key.
    #[serde(rename = "primary_key?")]
    pub primary_key: bool,
    /// Foreign-key edge, if this column is the source of one.
    pub references: Option<Reference>,
}

impl Attribute {
    /// Copy of this attribute with the reference stripped.
    pub fn without_references(&self) -> Self {
        Self {
            references: None,
            ..self.clone()
        }
    }
}

/// A named unique index, identified for equality by the set of its keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Identity {
    /// Stable identifier for the index.
    pub name: SmolStr,
    /// Columns covered by the index. Order only affects naming.
    pub keys: Vec<SmolStr>,
}

impl Identity {
    /// Sorted copy of the keys.
    pub fn key_set(&self) -> Vec<SmolStr> {
        let mut keys = self.keys.clone();
        keys.sort();
        keys
    }

    /// Whether two identities cover the same set of columns.
    pub fn same_keys(&self, other: &Identity) -> bool {
        self.key_set() == other.key_set()
    }
}

/// Point-in-time canonical description of one table's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Table name.
    pub table: SmolStr,
    /// Repo the table lives in.
    pub repo: SmolStr,
    /// Content hash over the canonical rendering, excluding this field.
    pub hash: String,
    /// Columns, sorted by name.
    pub attributes: Vec<Attribute>,
    /// Unique indexes, sorted by name.
    pub identities: Vec<Identity>,
}

impl Snapshot {
    /// Build a snapshot from a resource definition.
    pub fn build(resource: &Resource) -> MigrateResult<Self> {
        let mut attributes = resource
            .attributes
            .iter()
            .map(|attribute| build_attribute(attribute, resource))
            .collect::<MigrateResult<Vec<_>>>()?;
        attributes.sort_by(|a, b| a.name.cmp(&b.name));

        let mut identities: Vec<Identity> = resource
            .identities
            .iter()
            .filter(|identity| {
                identity
                    .keys
                    .iter()
                    .all(|key| resource.attributes.iter().any(|a| a.name == *key))
            })
            .map(|identity| Identity {
                name: identity.name.clone(),
                keys: identity.keys.clone(),
            })
            .collect();
        identities.sort_by(|a, b| a.name.cmp(&b.name));

        let mut snapshot = Self {
            table: resource.table.clone(),
            repo: resource.repo.name.clone(),
            hash: String::new(),
            attributes,
            identities,
        };
        snapshot.hash = snapshot.content_hash()?;
        Ok(snapshot)
    }

    /// Empty baseline for a table that has no prior snapshot.
    pub(crate) fn baseline(table: &SmolStr, repo: &SmolStr) -> Self {
        Self {
            table: table.clone(),
            repo: repo.clone(),
            hash: String::new(),
            attributes: Vec::new(),
            identities: Vec::new(),
        }
    }

    /// Hex-encoded SHA-256 over the canonical rendering, excluding the hash
    /// field itself.
    pub fn content_hash(&self) -> MigrateResult<String> {
        let mut canonical = self.clone();
        canonical.hash = String::new();
        let rendered = serde_json::to_string_pretty(&canonical)?;

        let mut hasher = Sha256::new();
        hasher.update(rendered.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Sorted names of the primary-key attributes.
    pub fn primary_key(&self) -> Vec<SmolStr> {
        let mut keys: Vec<SmolStr> = self
            .attributes
            .iter()
            .filter(|a| a.primary_key)
            .map(|a| a.name.clone())
            .collect();
        keys.sort();
        keys
    }
}

fn build_attribute(
    attribute: &strata_resource::Attribute,
    resource: &Resource,
) -> MigrateResult<Attribute> {
    let ty = migration_type(&attribute.ty)?;

    Ok(Attribute {
        name: attribute.name.clone(),
        ty,
        default: render_default(&attribute.default, ty, &resource.repo),
        allow_nil: attribute.allow_nil,
        primary_key: attribute.primary_key,
        references: find_reference(attribute, resource),
    })
}

/// Map a declared type onto the closed migration-type set.
fn migration_type(ty: &AttributeType) -> MigrateResult<MigrationType> {
    match ty {
        AttributeType::String => Ok(MigrationType::Text),
        AttributeType::Integer => Ok(MigrationType::Integer),
        AttributeType::Boolean => Ok(MigrationType::Boolean),
        AttributeType::BinaryId => Ok(MigrationType::BinaryId),
        AttributeType::Other(name) => Err(MigrateError::unsupported_type(name.as_str())),
    }
}

/// Render a declared default into a migration expression.
///
/// Only a closed table of generator functions is recognized; everything
/// else degrades to no default so that generated migrations stay
/// deterministic.
fn render_default(default: &DefaultValue, ty: MigrationType, repo: &Repo) -> Option<String> {
    match default {
        DefaultValue::None => None,
        DefaultValue::Generator(GeneratorFn::UuidV4) if repo.has_extension("uuid-ossp") => {
            Some(r#"fragment("uuid_generate_v4()")"#.to_string())
        }
        DefaultValue::Generator(GeneratorFn::Now) => Some(r#"fragment("now()")"#.to_string()),
        DefaultValue::Generator(_) => {
            debug!("dropping unrecognized generator default");
            None
        }
        DefaultValue::Expr => None,
        DefaultValue::Value(value) => render_value(value, ty),
    }
}

/// Render a literal default through the column type's encoder.
fn render_value(value: &Value, ty: MigrationType) -> Option<String> {
    match (ty, value) {
        (MigrationType::Text | MigrationType::BinaryId, Value::String(s)) => {
            Some(format!("{s:?}"))
        }
        (MigrationType::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {
            Some(n.to_string())
        }
        (MigrationType::Boolean, Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

/// Find the `belongs_to` edge this attribute is the source of, if the
/// destination lives in the same data layer and repo.
fn find_reference(attribute: &strata_resource::Attribute, resource: &Resource) -> Option<Reference> {
    resource.relationships.iter().find_map(|relationship| {
        reference_for(relationship, attribute, &resource.repo)
    })
}

fn reference_for(
    relationship: &Relationship,
    attribute: &strata_resource::Attribute,
    repo: &Repo,
) -> Option<Reference> {
    if relationship.kind != RelationshipKind::BelongsTo
        || relationship.source_field != attribute.name
    {
        return None;
    }

    let destination = relationship.destination.as_ref()?;
    if destination.repo != *repo {
        return None;
    }

    Some(Reference {
        table: destination.table.clone(),
        destination_field: relationship.destination_field.clone(),
    })
}
