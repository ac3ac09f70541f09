//! Snapshot deduplication and merging.
//!
//! Several resources may declare attributes on the same table. Before
//! diffing, their fresh snapshots are merged into one snapshot per table,
//! paired with whatever snapshot is already on disk.

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::error::{MigrateError, MigrateResult};
use crate::shell::Shell;
use crate::snapshot::{Attribute, Identity, Snapshot};
use crate::store::SnapshotStore;

const SELECT_ATTEMPTS: u32 = 3;

/// Merge freshly built snapshots for one repo into one snapshot per table,
/// each paired with the stored snapshot for that table, if any.
pub fn merge_snapshots<S: Shell>(
    store: &SnapshotStore,
    shell: &mut S,
    snapshots: Vec<Snapshot>,
) -> MigrateResult<Vec<(Snapshot, Option<Snapshot>)>> {
    let mut groups: IndexMap<SmolStr, Vec<Snapshot>> = IndexMap::new();
    for snapshot in snapshots {
        groups.entry(snapshot.table.clone()).or_default().push(snapshot);
    }

    let mut pairs = Vec::with_capacity(groups.len());
    for (table, group) in groups {
        let Some(first) = group.first() else { continue };
        let existing = store.load(&first.repo, &table)?;
        let merged = merge_group(shell, &table, &group, existing.as_ref())?;
        pairs.push((merged, existing));
    }
    Ok(pairs)
}

fn merge_group<S: Shell>(
    shell: &mut S,
    table: &SmolStr,
    group: &[Snapshot],
    existing: Option<&Snapshot>,
) -> MigrateResult<Snapshot> {
    let repo = group
        .first()
        .map(|snapshot| snapshot.repo.clone())
        .unwrap_or_default();

    let (primary_key, synthetic) = reconcile_primary_key(shell, table, group, existing)?;

    let mut contributors: IndexMap<SmolStr, Vec<&Attribute>> = IndexMap::new();
    for snapshot in group {
        for attribute in &snapshot.attributes {
            contributors
                .entry(attribute.name.clone())
                .or_default()
                .push(attribute);
        }
    }
    contributors.sort_keys();

    let mut attributes = Vec::with_capacity(contributors.len());
    for (name, contributors) in &contributors {
        let mut attribute = merge_attribute(table, name, contributors)?;
        attribute.primary_key = primary_key.contains(&attribute.name);
        attributes.push(attribute);
    }

    let mut identities: Vec<Identity> = Vec::new();
    for snapshot in group {
        for identity in &snapshot.identities {
            if !identities.contains(identity) {
                identities.push(identity.clone());
            }
        }
    }
    identities.extend(synthetic);
    identities.sort_by(|a, b| a.name.cmp(&b.name));

    let mut seen_keys: Vec<Vec<SmolStr>> = Vec::new();
    identities.retain(|identity| {
        let keys = identity.key_set();
        if seen_keys.contains(&keys) {
            false
        } else {
            seen_keys.push(keys);
            true
        }
    });

    let mut merged = Snapshot {
        table: table.clone(),
        repo,
        hash: String::new(),
        attributes,
        identities,
    };
    merged.hash = merged.content_hash()?;
    Ok(merged)
}

/// Combine every declaration of one attribute into a single column.
fn merge_attribute(
    table: &SmolStr,
    name: &SmolStr,
    contributors: &[&Attribute],
) -> MigrateResult<Attribute> {
    if let [single] = contributors {
        return Ok((*single).clone());
    }

    let mut types = Vec::new();
    for contributor in contributors {
        if !types.contains(&contributor.ty) {
            types.push(contributor.ty);
        }
    }
    let &[ty] = types.as_slice() else {
        return Err(MigrateError::ConflictingTypes {
            table: table.to_string(),
            attribute: name.to_string(),
            types: types.iter().map(|ty| ty.to_string()).collect(),
        });
    };

    let mut defaults = Vec::new();
    for contributor in contributors {
        if !defaults.contains(&contributor.default) {
            defaults.push(contributor.default.clone());
        }
    }
    let default = match &defaults[..] {
        [unique] => unique.clone(),
        _ => None,
    };

    let mut references = Vec::new();
    for contributor in contributors {
        if let Some(reference) = &contributor.references
            && !references.contains(&reference)
        {
            references.push(reference);
        }
    }
    if references.len() > 1 {
        return Err(MigrateError::ConflictingReferences {
            table: table.to_string(),
            attribute: name.to_string(),
        });
    }

    Ok(Attribute {
        name: name.clone(),
        ty,
        default,
        allow_nil: contributors.iter().any(|c| c.allow_nil),
        primary_key: false,
        references: references.first().map(|r| (*r).clone()),
    })
}

/// Decide the merged table's primary key.
///
/// Returns the chosen key names plus a synthetic identity for every
/// rejected candidate, so no declared uniqueness is silently lost.
fn reconcile_primary_key<S: Shell>(
    shell: &mut S,
    table: &SmolStr,
    group: &[Snapshot],
    existing: Option<&Snapshot>,
) -> MigrateResult<(Vec<SmolStr>, Vec<Identity>)> {
    let mut candidates: Vec<Vec<SmolStr>> = Vec::new();
    for snapshot in group {
        let keys = snapshot.primary_key();
        if !candidates.contains(&keys) {
            candidates.push(keys);
        }
    }

    let chosen = match existing.map(Snapshot::primary_key) {
        Some(existing_pk) if candidates.contains(&existing_pk) => {
            debug!(table = %table, "keeping existing primary key");
            existing_pk
        }
        _ if candidates.len() <= 1 => candidates.first().cloned().unwrap_or_default(),
        _ => choose_primary_key(shell, table, &candidates)?,
    };

    let synthetic = candidates
        .iter()
        .filter(|candidate| **candidate != chosen)
        .map(|keys| Identity {
            name: synthetic_identity_name(table, keys),
            keys: keys.clone(),
        })
        .collect();

    Ok((chosen, synthetic))
}

fn synthetic_identity_name(table: &SmolStr, keys: &[SmolStr]) -> SmolStr {
    let joined = keys
        .iter()
        .map(SmolStr::as_str)
        .collect::<Vec<_>>()
        .join("_");
    SmolStr::from(format!("{table}_{joined}"))
}

fn choose_primary_key<S: Shell>(
    shell: &mut S,
    table: &SmolStr,
    candidates: &[Vec<SmolStr>],
) -> MigrateResult<Vec<SmolStr>> {
    let mut message = format!("Conflicting primary keys declared for {table}:\n");
    for (index, candidate) in candidates.iter().enumerate() {
        let keys = candidate
            .iter()
            .map(SmolStr::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        message.push_str(&format!("  {}) {}\n", index + 1, keys));
    }
    message.push_str("Which primary key should be used?");

    for _ in 0..SELECT_ATTEMPTS {
        let answer = shell.prompt(&message);
        if let Ok(choice) = answer.trim().parse::<usize>()
            && (1..=candidates.len()).contains(&choice)
        {
            return Ok(candidates[choice - 1].clone());
        }
        shell.info("Please answer with one of the listed numbers");
    }

    Err(MigrateError::prompt(format!(
        "no primary key selected for {table}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::ScriptedShell;
    use strata_resource::{
        Attribute as ResourceAttribute, AttributeType, Identity as ResourceIdentity, Repo,
        Resource,
    };
    use tempfile::TempDir;

    fn repo() -> Repo {
        Repo::new("MyApp.Repo")
    }

    fn build(resource: &Resource) -> Snapshot {
        Snapshot::build(resource).unwrap()
    }

    fn users(attrs: &[(&str, AttributeType, bool)]) -> Snapshot {
        let mut resource = Resource::new("users", repo());
        for (name, ty, pk) in attrs {
            let mut attribute = ResourceAttribute::new(*name, ty.clone());
            if *pk {
                attribute = attribute.primary_key();
            }
            resource = resource.with_attribute(attribute);
        }
        build(&resource)
    }

    #[test]
    fn test_merges_attributes_across_contributors() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut shell = ScriptedShell::default();

        let a = users(&[("id", AttributeType::BinaryId, true), ("email", AttributeType::String, false)]);
        let b = users(&[("id", AttributeType::BinaryId, true), ("name", AttributeType::String, false)]);

        let pairs = merge_snapshots(&store, &mut shell, vec![a, b]).unwrap();
        assert_eq!(pairs.len(), 1);

        let (merged, existing) = &pairs[0];
        assert!(existing.is_none());
        let names: Vec<&str> = merged.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["email", "id", "name"]);
        assert_eq!(merged.primary_key(), vec![SmolStr::from("id")]);
    }

    #[test]
    fn test_conflicting_types_fail() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut shell = ScriptedShell::default();

        let a = users(&[("id", AttributeType::BinaryId, true), ("age", AttributeType::Integer, false)]);
        let b = users(&[("id", AttributeType::BinaryId, true), ("age", AttributeType::String, false)]);

        let err = merge_snapshots(&store, &mut shell, vec![a, b]).unwrap_err();
        assert!(matches!(err, MigrateError::ConflictingTypes { .. }));
        assert!(err.to_string().contains("users.age"));
    }

    #[test]
    fn test_allow_nil_is_or_of_contributors() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut shell = ScriptedShell::default();

        let a = build(
            &Resource::new("users", repo())
                .with_attribute(ResourceAttribute::new("id", AttributeType::BinaryId).primary_key())
                .with_attribute(ResourceAttribute::new("email", AttributeType::String).allow_nil(false)),
        );
        let b = build(
            &Resource::new("users", repo())
                .with_attribute(ResourceAttribute::new("id", AttributeType::BinaryId).primary_key())
                .with_attribute(ResourceAttribute::new("email", AttributeType::String)),
        );

        let pairs = merge_snapshots(&store, &mut shell, vec![a, b]).unwrap();
        let merged = &pairs[0].0;
        assert!(merged.attribute("email").unwrap().allow_nil);
    }

    #[test]
    fn test_pk_disagreement_prompts_and_creates_synthetic_identity() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut shell = ScriptedShell::new(["2"]);

        let a = users(&[("id", AttributeType::BinaryId, true), ("email", AttributeType::String, false)]);
        let b = users(&[("id", AttributeType::BinaryId, false), ("email", AttributeType::String, true)]);

        let pairs = merge_snapshots(&store, &mut shell, vec![a, b]).unwrap();
        let merged = &pairs[0].0;

        assert_eq!(merged.primary_key(), vec![SmolStr::from("email")]);
        let synthetic = merged.identities.iter().find(|i| i.name == "users_id").unwrap();
        assert_eq!(synthetic.keys, vec![SmolStr::from("id")]);
        assert!(shell.transcript[0].contains("Conflicting primary keys declared for users"));
    }

    #[test]
    fn test_pk_prompt_retries_then_fails() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut shell = ScriptedShell::new(["x", "99", "0"]);

        let a = users(&[("id", AttributeType::BinaryId, true)]);
        let b = users(&[("email", AttributeType::String, true), ("id", AttributeType::BinaryId, false)]);

        let err = merge_snapshots(&store, &mut shell, vec![a, b]).unwrap_err();
        assert!(matches!(err, MigrateError::Prompt(_)));
    }

    #[test]
    fn test_existing_primary_key_wins_when_any_contributor_agrees() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut shell = ScriptedShell::default();

        let existing = users(&[("id", AttributeType::BinaryId, true), ("email", AttributeType::String, false)]);
        store.save(&existing).unwrap();

        let a = users(&[("id", AttributeType::BinaryId, true), ("email", AttributeType::String, false)]);
        let b = users(&[("id", AttributeType::BinaryId, false), ("email", AttributeType::String, true)]);

        let pairs = merge_snapshots(&store, &mut shell, vec![a, b]).unwrap();
        let merged = &pairs[0].0;

        // No prompt: one contributor agrees with the stored key.
        assert!(shell.transcript.is_empty());
        assert_eq!(merged.primary_key(), vec![SmolStr::from("id")]);
        assert!(merged.identities.iter().any(|i| i.name == "users_email"));
    }

    #[test]
    fn test_identities_deduplicated_by_key_set() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut shell = ScriptedShell::default();

        let a = build(
            &Resource::new("users", repo())
                .with_attribute(ResourceAttribute::new("id", AttributeType::BinaryId).primary_key())
                .with_attribute(ResourceAttribute::new("email", AttributeType::String))
                .with_identity(ResourceIdentity::new("unique_email", ["email"])),
        );
        let b = build(
            &Resource::new("users", repo())
                .with_attribute(ResourceAttribute::new("id", AttributeType::BinaryId).primary_key())
                .with_attribute(ResourceAttribute::new("email", AttributeType::String))
                .with_identity(ResourceIdentity::new("email_unique", ["email"])),
        );

        let pairs = merge_snapshots(&store, &mut shell, vec![a, b]).unwrap();
        let merged = &pairs[0].0;
        assert_eq!(merged.identities.len(), 1);
    }
}
