//! The migration generator pipeline.

use std::path::PathBuf;

use indexmap::IndexMap;
use smol_str::SmolStr;
use strata_resource::Resource;
use tracing::debug;

use crate::diff::compute_operations;
use crate::emit::emit;
use crate::error::MigrateResult;
use crate::merge::merge_snapshots;
use crate::order::sort_operations;
use crate::phase::group_into_phases;
use crate::render::{Formatter, MigrationRenderer};
use crate::shell::Shell;
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;
use crate::streamline::streamline;

/// Options controlling the generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Directory where snapshots are stored.
    pub snapshot_path: PathBuf,
    /// Directory migrations are written under; `priv/` when unset.
    pub migration_path: Option<PathBuf>,
    /// Suppress informational output.
    pub quiet: bool,
    /// Run the formatter over the generated source.
    pub format: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("priv/resource_snapshots"),
            migration_path: None,
            quiet: false,
            format: true,
        }
    }
}

impl GeneratorConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snapshot directory.
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = path.into();
        self
    }

    /// Set the migration directory.
    pub fn migration_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.migration_path = Some(path.into());
        self
    }

    /// Suppress informational output.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Enable or disable the formatter hook.
    pub fn format(mut self, format: bool) -> Self {
        self.format = format;
        self
    }

    pub(crate) fn migration_root(&self) -> PathBuf {
        self.migration_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("priv"))
    }
}

/// Drives the snapshot, merge, diff, order, streamline, phase, and emit
/// pipeline over a set of resources.
pub struct Generator<S, R> {
    config: GeneratorConfig,
    shell: S,
    renderer: R,
    formatter: Option<Box<dyn Formatter>>,
}

impl<S: Shell, R: MigrationRenderer> Generator<S, R> {
    /// Create a generator.
    pub fn new(config: GeneratorConfig, shell: S, renderer: R) -> Self {
        Self {
            config,
            shell,
            renderer,
            formatter: None,
        }
    }

    /// Install a formatter for the rendered migration source.
    pub fn with_formatter(mut self, formatter: Box<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// The shell, for inspecting scripted transcripts.
    pub fn shell(&self) -> &S {
        &self.shell
    }

    /// Generate one migration per repo that has pending changes.
    ///
    /// Repos without changes print an informational line (unless quiet) and
    /// leave the filesystem untouched. Returns the paths of the written
    /// migration files.
    pub fn generate(&mut self, resources: &[Resource]) -> MigrateResult<Vec<PathBuf>> {
        let store = SnapshotStore::new(&self.config.snapshot_path);

        let mut by_repo: IndexMap<SmolStr, Vec<Snapshot>> = IndexMap::new();
        for resource in resources {
            let snapshot = Snapshot::build(resource)?;
            by_repo
                .entry(snapshot.repo.clone())
                .or_default()
                .push(snapshot);
        }

        let mut written = Vec::new();
        for (repo, snapshots) in by_repo {
            let pairs = merge_snapshots(&store, &mut self.shell, snapshots)?;
            let operations = compute_operations(&pairs, &mut self.shell)?;
            if operations.is_empty() {
                if !self.config.quiet {
                    self.shell
                        .info(&format!("No changes detected for {repo}"));
                }
                continue;
            }

            let operations = streamline(sort_operations(operations));
            let phases = group_into_phases(operations);
            debug!(repo = %repo, phases = phases.len(), "grouped into phases");

            let merged: Vec<Snapshot> = pairs.into_iter().map(|(new, _)| new).collect();
            let path = emit(
                &self.config,
                &store,
                &self.renderer,
                self.formatter.as_deref(),
                &repo,
                &phases,
                &merged,
            )?;
            written.push(path);
        }

        Ok(written)
    }
}
