//! # strata-resource
//!
//! The declarative resource model consumed by the Strata migration
//! generator.
//!
//! A [`Resource`] describes one database-backed entity: its table, the
//! [`Repo`] it lives in, its [`Attribute`]s, the [`Identity`] unique
//! constraints declared on it, and its [`Relationship`]s to other
//! resources. The migration generator reads this model and nothing else;
//! how an application assembles it (macros, config files, hand-written
//! registration) is outside this crate.

pub mod attribute;
pub mod relationship;
pub mod repo;
pub mod resource;

pub use attribute::{Attribute, AttributeType, DefaultValue, GeneratorFn};
pub use relationship::{Relationship, RelationshipKind, RelationshipTarget};
pub use repo::{Repo, last_segment, underscore};
pub use resource::{Identity, Resource};
