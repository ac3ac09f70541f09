//! Operation computation between snapshots.

use smol_str::SmolStr;
use tracing::debug;

use crate::error::MigrateResult;
use crate::rename::resolve_renames;
use crate::shell::Shell;
use crate::snapshot::{Attribute, Identity, Snapshot};

/// One primitive schema-change action.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create a table.
    CreateTable {
        /// The table to create.
        table: SmolStr,
    },
    /// Add a column.
    AddAttribute {
        /// Table the column is added to.
        table: SmolStr,
        /// The column to add.
        attribute: Attribute,
    },
    /// Change a column in place.
    AlterAttribute {
        /// Table the column lives in.
        table: SmolStr,
        /// The column as it is.
        old: Attribute,
        /// The column as it should be.
        new: Attribute,
    },
    /// Rename a column.
    RenameAttribute {
        /// Table the column lives in.
        table: SmolStr,
        /// The column under its old name.
        old: Attribute,
        /// The column under its new name.
        new: Attribute,
    },
    /// Drop a column.
    RemoveAttribute {
        /// Table the column lives in.
        table: SmolStr,
        /// The column to drop.
        attribute: Attribute,
    },
    /// Create a unique index.
    AddUniqueIndex {
        /// Table the index covers.
        table: SmolStr,
        /// The identity backing the index.
        identity: Identity,
    },
    /// Drop a unique index.
    RemoveUniqueIndex {
        /// Table the index covers.
        table: SmolStr,
        /// The identity backing the index.
        identity: Identity,
    },
}

impl Operation {
    /// The table this operation targets.
    pub fn table(&self) -> &SmolStr {
        match self {
            Self::CreateTable { table }
            | Self::AddAttribute { table, .. }
            | Self::AlterAttribute { table, .. }
            | Self::RenameAttribute { table, .. }
            | Self::RemoveAttribute { table, .. }
            | Self::AddUniqueIndex { table, .. }
            | Self::RemoveUniqueIndex { table, .. } => table,
        }
    }

    /// Whether this is a per-column operation.
    pub fn is_attribute_op(&self) -> bool {
        matches!(
            self,
            Self::AddAttribute { .. }
                | Self::AlterAttribute { .. }
                | Self::RenameAttribute { .. }
                | Self::RemoveAttribute { .. }
        )
    }
}

/// Compute operations for every `(new, existing)` snapshot pair.
///
/// Pairs with no differences contribute nothing; an entirely unchanged
/// schema yields the empty list.
pub fn compute_operations<S: Shell>(
    pairs: &[(Snapshot, Option<Snapshot>)],
    shell: &mut S,
) -> MigrateResult<Vec<Operation>> {
    let mut operations = Vec::new();
    for (snapshot, existing) in pairs {
        operations.extend(diff_snapshot(snapshot, existing.as_ref(), shell)?);
    }
    debug!(operations = operations.len(), "computed operations");
    Ok(operations)
}

fn diff_snapshot<S: Shell>(
    snapshot: &Snapshot,
    existing: Option<&Snapshot>,
    shell: &mut S,
) -> MigrateResult<Vec<Operation>> {
    let baseline;
    let (old, mut operations) = match existing {
        Some(old) => (old, Vec::new()),
        None => {
            baseline = Snapshot::baseline(&snapshot.table, &snapshot.repo);
            let create = Operation::CreateTable {
                table: snapshot.table.clone(),
            };
            (&baseline, vec![create])
        }
    };

    operations.extend(attribute_operations(snapshot, old, shell)?);
    operations.extend(identity_operations(snapshot, old));
    Ok(operations)
}

fn attribute_operations<S: Shell>(
    new: &Snapshot,
    old: &Snapshot,
    shell: &mut S,
) -> MigrateResult<Vec<Operation>> {
    let table = &new.table;

    let to_add: Vec<Attribute> = new
        .attributes
        .iter()
        .filter(|attribute| old.attribute(&attribute.name).is_none())
        .cloned()
        .collect();
    let to_remove: Vec<Attribute> = old
        .attributes
        .iter()
        .filter(|attribute| new.attribute(&attribute.name).is_none())
        .cloned()
        .collect();

    let (to_add, to_remove, renames) = resolve_renames(shell, table, to_add, to_remove)?;

    let to_alter: Vec<(Attribute, Attribute)> = new
        .attributes
        .iter()
        .filter_map(|attribute| {
            old.attribute(&attribute.name)
                .filter(|old_attribute| *old_attribute != attribute)
                .map(|old_attribute| (attribute.clone(), old_attribute.clone()))
        })
        .collect();

    let mut operations = Vec::new();

    for (new_attribute, old_attribute) in renames {
        operations.push(Operation::RenameAttribute {
            table: table.clone(),
            old: old_attribute,
            new: new_attribute,
        });
    }

    for attribute in to_add {
        if attribute.references.is_none() {
            operations.push(Operation::AddAttribute {
                table: table.clone(),
                attribute,
            });
        } else {
            // Add the bare column first; the reference is restored by a
            // follow-up alter that the orderer can push past the creation
            // of the referenced column.
            let stripped = attribute.without_references();
            operations.push(Operation::AddAttribute {
                table: table.clone(),
                attribute: stripped.clone(),
            });
            operations.push(Operation::AlterAttribute {
                table: table.clone(),
                old: stripped,
                new: attribute,
            });
        }
    }

    for (new_attribute, old_attribute) in to_alter {
        if new_attribute.references.is_none() {
            operations.push(Operation::AlterAttribute {
                table: table.clone(),
                old: old_attribute,
                new: new_attribute,
            });
        } else {
            let stripped = new_attribute.without_references();
            operations.push(Operation::AlterAttribute {
                table: table.clone(),
                old: old_attribute,
                new: stripped.clone(),
            });
            operations.push(Operation::AlterAttribute {
                table: table.clone(),
                old: stripped,
                new: new_attribute,
            });
        }
    }

    for attribute in to_remove {
        operations.push(Operation::RemoveAttribute {
            table: table.clone(),
            attribute,
        });
    }

    Ok(operations)
}

fn identity_operations(new: &Snapshot, old: &Snapshot) -> Vec<Operation> {
    let table = &new.table;
    let mut operations = Vec::new();

    for identity in &new.identities {
        if !old.identities.iter().any(|o| o.same_keys(identity)) {
            operations.push(Operation::AddUniqueIndex {
                table: table.clone(),
                identity: identity.clone(),
            });
        }
    }

    for identity in &old.identities {
        if !new.identities.iter().any(|n| n.same_keys(identity)) {
            operations.push(Operation::RemoveUniqueIndex {
                table: table.clone(),
                identity: identity.clone(),
            });
        }
    }

    operations
}
