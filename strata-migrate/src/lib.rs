//! # strata-migrate
//!
//! Migration generation for Strata resources.
//!
//! This crate compares the declared state of a set of resources against the
//! snapshots recorded by the previous run, computes a minimal, correctly
//! ordered list of schema-change operations, groups them into executable
//! phases, and writes a timestamped migration file plus updated snapshots.
//!
//! ```text
//! ┌───────────┐    ┌───────────┐    ┌──────────┐    ┌─────────┐
//! │ Resources │───▶│ Snapshots │───▶│  Merge   │───▶│  Diff   │
//! └───────────┘    └───────────┘    └──────────┘    └─────────┘
//!                                                        │
//!                                                        ▼
//! ┌───────────┐    ┌───────────┐    ┌──────────┐    ┌─────────┐
//! │   Emit    │◀───│  Phases   │◀───│Streamline│◀───│  Order  │
//! └───────────┘    └───────────┘    └──────────┘    └─────────┘
//! ```
//!
//! Snapshots are stored as pretty-printed JSON under the snapshot
//! directory, one file per `(repo, table)` pair. Diffing a resource with no
//! stored snapshot produces a create-table migration; diffing an unchanged
//! resource produces nothing.
//!
//! ## Example
//!
//! ```rust,no_run
//! use strata_migrate::{EctoRenderer, Generator, GeneratorConfig, TermShell};
//! use strata_resource::{Attribute, AttributeType, Repo, Resource};
//!
//! fn main() -> Result<(), strata_migrate::MigrateError> {
//!     let repo = Repo::new("MyApp.Repo");
//!     let posts = Resource::new("posts", repo)
//!         .with_attribute(Attribute::new("id", AttributeType::BinaryId).primary_key())
//!         .with_attribute(Attribute::new("title", AttributeType::String));
//!
//!     let mut generator =
//!         Generator::new(GeneratorConfig::new(), TermShell, EctoRenderer);
//!     let written = generator.generate(&[posts])?;
//!     for path in written {
//!         println!("wrote {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Ambiguous situations, such as a removed attribute that might be a rename
//! or resources that disagree on a table's primary key, are resolved
//! through the [`Shell`] so callers can script them.

pub mod diff;
mod emit;
pub mod error;
pub mod generator;
pub mod merge;
pub mod order;
pub mod phase;
pub mod render;
mod rename;
pub mod shell;
pub mod snapshot;
pub mod store;
pub mod streamline;

// Re-exports
pub use diff::{Operation, compute_operations};
pub use error::{MigrateError, MigrateResult};
pub use generator::{Generator, GeneratorConfig};
pub use merge::merge_snapshots;
pub use order::sort_operations;
pub use phase::{Phase, group_into_phases};
pub use render::{EctoRenderer, Formatter, MigrationRenderer};
pub use shell::{ScriptedShell, Shell, TermShell};
pub use snapshot::{Attribute, Identity, MigrationType, Reference, Snapshot};
pub use store::SnapshotStore;
pub use streamline::streamline;
