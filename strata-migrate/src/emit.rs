//! Migration artifact emission.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use strata_resource::{last_segment, underscore};
use tracing::{debug, info};

use crate::error::MigrateResult;
use crate::generator::GeneratorConfig;
use crate::phase::Phase;
use crate::render::{Formatter, MigrationRenderer};
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;

/// Render the phases into a migration file and persist the snapshots that
/// produced them.
///
/// The up body concatenates the phases in order; the down body concatenates
/// them in reverse so the migration unwinds back to the previous state.
pub(crate) fn emit<R: MigrationRenderer>(
    config: &GeneratorConfig,
    store: &SnapshotStore,
    renderer: &R,
    formatter: Option<&dyn Formatter>,
    repo: &str,
    phases: &[Phase],
    snapshots: &[Snapshot],
) -> MigrateResult<PathBuf> {
    let up = phases
        .iter()
        .map(|phase| renderer.up(phase))
        .collect::<Vec<_>>()
        .join("\n\n");
    let down = phases
        .iter()
        .rev()
        .map(|phase| renderer.down(phase))
        .collect::<Vec<_>>()
        .join("\n\n");

    let migrations_dir = config
        .migration_root()
        .join(underscore(last_segment(repo)))
        .join("migrations");
    fs::create_dir_all(&migrations_dir)?;

    let number = next_migration_number(&migrations_dir)?;
    let module_name = format!("{repo}.Migrations.MigrateResources{number}");
    let mut source = renderer.module(&module_name, &up, &down);
    if config.format
        && let Some(formatter) = formatter
    {
        source = formatter.format(&source)?;
    }

    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let file_name = format!(
        "{timestamp}_migrate_resources{number}.{}",
        renderer.extension()
    );
    let path = migrations_dir.join(file_name);
    fs::write(&path, source)?;
    info!(path = %path.display(), "wrote migration");

    for snapshot in snapshots {
        store.save(snapshot)?;
    }

    Ok(path)
}

/// One more than the number of migrations this tool already wrote for the
/// repo.
fn next_migration_number(dir: &Path) -> MigrateResult<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry
            .file_name()
            .to_string_lossy()
            .contains("_migrate_resources")
        {
            count += 1;
        }
    }
    debug!(dir = %dir.display(), existing = count, "numbered migration");
    Ok(count + 1)
}
