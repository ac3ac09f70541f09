//! On-disk snapshot persistence.

use std::fs;
use std::path::{Path, PathBuf};

use strata_resource::{last_segment, underscore};
use tracing::debug;

use crate::error::{MigrateError, MigrateResult};
use crate::snapshot::Snapshot;

/// Reads and writes snapshot files, keyed by `(repo, table)`.
///
/// Snapshots live at `<root>/<underscored repo>/<table>.json`, pretty
/// printed. A missing file means "no prior snapshot"; a file that cannot be
/// decoded is an error.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the snapshot file for a `(repo, table)` pair.
    pub fn path_for(&self, repo: &str, table: &str) -> PathBuf {
        self.root
            .join(underscore(last_segment(repo)))
            .join(format!("{table}.json"))
    }

    /// Load the stored snapshot, if any.
    pub fn load(&self, repo: &str, table: &str) -> MigrateResult<Option<Snapshot>> {
        let path = self.path_for(repo, table);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let snapshot = serde_json::from_str(&content)
            .map_err(|source| MigrateError::SnapshotDecode { path, source })?;
        Ok(Some(snapshot))
    }

    /// Persist a snapshot, skipping the write when the stored file already
    /// carries the same content hash.
    pub fn save(&self, snapshot: &Snapshot) -> MigrateResult<()> {
        let path = self.path_for(&snapshot.repo, &snapshot.table);

        if let Ok(Some(existing)) = self.load(&snapshot.repo, &snapshot.table)
            && existing.hash == snapshot.hash
        {
            debug!(path = %path.display(), "snapshot unchanged, skipping write");
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, content)?;
        debug!(path = %path.display(), "wrote snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smol_str::SmolStr;
    use strata_resource::{Attribute, AttributeType, Repo, Resource};
    use tempfile::TempDir;

    fn snapshot(table: &str) -> Snapshot {
        let resource = Resource::new(SmolStr::from(table), Repo::new("MyApp.Repo"))
            .with_attribute(Attribute::new("id", AttributeType::BinaryId).primary_key());
        Snapshot::build(&resource).unwrap()
    }

    #[test]
    fn test_path_layout() {
        let store = SnapshotStore::new("priv/resource_snapshots");
        assert_eq!(
            store.path_for("MyApp.BlogRepo", "posts"),
            PathBuf::from("priv/resource_snapshots/blog_repo/posts.json")
        );
    }

    #[test]
    fn test_missing_file_is_no_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(store.load("MyApp.Repo", "posts").unwrap().is_none());
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let snapshot = snapshot("posts");

        store.save(&snapshot).unwrap();
        let loaded = store.load("MyApp.Repo", "posts").unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_strict_decode() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let path = store.path_for("MyApp.Repo", "posts");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"table":"posts","unknown_key":1}"#).unwrap();

        let err = store.load("MyApp.Repo", "posts").unwrap_err();
        assert!(matches!(err, MigrateError::SnapshotDecode { .. }));
    }

    #[test]
    fn test_save_skips_unchanged_content() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let original = snapshot("posts");
        store.save(&original).unwrap();

        // Same hash but different attribute list: the gate only looks at
        // the hash, so the stored file must keep the original content.
        let mut stale = snapshot("posts");
        stale.attributes.clear();
        stale.hash = original.hash.clone();
        store.save(&stale).unwrap();

        let loaded = store.load("MyApp.Repo", "posts").unwrap().unwrap();
        assert_eq!(loaded.attributes.len(), 1);
    }
}
