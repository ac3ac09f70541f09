//! Error types for the migration generator.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for migration generation.
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Errors that can occur while generating migrations.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// An attribute type lies outside the closed migration-type set.
    #[error("No migration_type set up for {ty}")]
    UnsupportedType {
        /// The declared source type.
        ty: String,
    },

    /// Snapshots sharing a table disagree on an attribute's type.
    #[error("conflicting types for `{table}.{attribute}`: {}", .types.join(", "))]
    ConflictingTypes {
        /// Table the attribute belongs to.
        table: String,
        /// The attribute with diverging declarations.
        attribute: String,
        /// Every distinct declared type.
        types: Vec<String>,
    },

    /// Snapshots sharing a table disagree on an attribute's reference.
    #[error("conflicting references for `{table}.{attribute}`")]
    ConflictingReferences {
        /// Table the attribute belongs to.
        table: String,
        /// The attribute with diverging references.
        attribute: String,
    },

    /// Interactive rename resolution did not converge.
    #[error("could not resolve rename of `{table}.{attribute}` within {attempts} attempts")]
    RenameResolutionFailed {
        /// Table being renamed on.
        table: String,
        /// The attribute being removed.
        attribute: String,
        /// How many replies were tried.
        attempts: u32,
    },

    /// A stored snapshot could not be decoded.
    #[error("failed to decode snapshot {}: {source}", .path.display())]
    SnapshotDecode {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A snapshot could not be serialized.
    #[error("failed to encode snapshot: {0}")]
    SnapshotEncode(#[from] serde_json::Error),

    /// An interactive prompt did not produce a usable answer.
    #[error("prompt failed: {0}")]
    Prompt(String),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MigrateError {
    /// Create an unsupported-type error.
    pub fn unsupported_type(ty: impl Into<String>) -> Self {
        Self::UnsupportedType { ty: ty.into() }
    }

    /// Create a prompt error.
    pub fn prompt(message: impl Into<String>) -> Self {
        Self::Prompt(message.into())
    }
}
