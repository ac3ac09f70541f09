//! # Strata
//!
//! Strata generates database migrations from declarative resource
//! definitions. Instead of diffing a live database, it records a JSON
//! snapshot of every resource's table and diffs the current declarations
//! against the snapshots from the previous run, so migration generation is
//! deterministic and needs no database connection.
//!
//! The workspace splits in two:
//!
//! - [`resource`] — the declarative model: resources, attributes, defaults,
//!   identities, relationships, and repos.
//! - [`migrate`] — the generator: snapshot building and storage, snapshot
//!   merging across resources that share a table, diffing, dependency-aware
//!   ordering, phase grouping, and migration file emission.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use strata::migrate::{EctoRenderer, Generator, GeneratorConfig, TermShell};
//! use strata::resource::{Attribute, AttributeType, Repo, Resource};
//!
//! # fn main() -> Result<(), strata::migrate::MigrateError> {
//! let repo = Repo::new("MyApp.Repo");
//! let posts = Resource::new("posts", repo)
//!     .with_attribute(Attribute::new("id", AttributeType::BinaryId).primary_key())
//!     .with_attribute(Attribute::new("title", AttributeType::String));
//!
//! let mut generator = Generator::new(GeneratorConfig::new(), TermShell, EctoRenderer);
//! generator.generate(&[posts])?;
//! # Ok(())
//! # }
//! ```

pub use strata_migrate as migrate;
pub use strata_resource as resource;

pub use strata_migrate::{Generator, GeneratorConfig, MigrateError, MigrateResult};
pub use strata_resource::{Repo, Resource};
