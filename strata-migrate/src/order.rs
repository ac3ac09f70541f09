//! Dependency-aware ordering of operations.

use smol_str::SmolStr;

use crate::diff::Operation;
use crate::snapshot::Attribute;

/// Stable insertion sort that moves every operation ahead of the operations
/// that depend on it.
///
/// Each incoming operation is inserted just before the first already-placed
/// operation that must run after it, and appended when no such operation
/// exists. Operations with no ordering constraint between them keep their
/// input order.
pub fn sort_operations(operations: Vec<Operation>) -> Vec<Operation> {
    let mut acc: Vec<Operation> = Vec::with_capacity(operations.len());

    for operation in operations {
        match acc.iter().position(|placed| after(placed, &operation)) {
            Some(index) => acc.insert(index, operation),
            None => acc.push(operation),
        }
    }

    acc
}

/// Whether `op` must run after `earlier`.
fn after(op: &Operation, earlier: &Operation) -> bool {
    use Operation::*;

    match (op, earlier) {
        // A unique index waits for its columns and its table.
        (AddUniqueIndex { table, identity }, AddAttribute { table: earlier_table, attribute }) => {
            table == earlier_table && identity.keys.contains(&attribute.name)
        }
        (AddUniqueIndex { table, identity }, AlterAttribute { table: earlier_table, new, .. }) => {
            table == earlier_table && identity.keys.contains(&new.name)
        }
        (AddUniqueIndex { table, identity }, RenameAttribute { table: earlier_table, new, .. }) => {
            table == earlier_table && identity.keys.contains(&new.name)
        }
        (AddUniqueIndex { table, .. }, CreateTable { table: earlier_table }) => {
            table == earlier_table
        }

        // A column is only dropped or renamed once the unique indexes that
        // cover it are gone.
        (RemoveAttribute { table, attribute }, RemoveUniqueIndex { table: earlier_table, identity }) => {
            table == earlier_table && identity.keys.contains(&attribute.name)
        }
        (RenameAttribute { table, old, .. }, RemoveUniqueIndex { table: earlier_table, identity }) => {
            table == earlier_table && identity.keys.contains(&old.name)
        }

        // Columns wait for their table; a foreign key waits for its target
        // column; primary-key columns land before the rest of the table.
        (AddAttribute { table, .. }, CreateTable { table: earlier_table }) => table == earlier_table,
        (AddAttribute { table, attribute }, AddAttribute { table: earlier_table, attribute: earlier_attribute }) => {
            references_column(attribute, earlier_table, earlier_attribute)
                || (table == earlier_table
                    && !attribute.primary_key
                    && earlier_attribute.primary_key)
        }
        (AddAttribute { table, attribute }, RemoveAttribute { table: earlier_table, attribute: earlier_attribute }) => {
            table == earlier_table && attribute.primary_key && earlier_attribute.primary_key
        }

        // Dropping a referenced column waits for the alter that let go of
        // the reference.
        (RemoveAttribute { table, attribute }, AlterAttribute { old, .. }) => {
            references_column(old, table, attribute)
        }

        (AlterAttribute { table, old, new }, earlier) => {
            // Reference-carrying alters sink to the end so every column
            // they can point at exists by the time they run.
            if new.references.is_some() {
                return true;
            }
            match earlier {
                AddAttribute { table: earlier_table, attribute: earlier_attribute } => {
                    table == earlier_table
                        && old.primary_key
                        && !new.primary_key
                        && earlier_attribute.primary_key
                }
                _ => false,
            }
        }

        _ => false,
    }
}

fn references_column(attribute: &Attribute, table: &SmolStr, target: &Attribute) -> bool {
    attribute.references.as_ref().is_some_and(|reference| {
        reference.table == *table && reference.destination_field == target.name
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Identity, MigrationType, Reference};

    fn attribute(name: &str) -> Attribute {
        Attribute {
            name: name.into(),
            ty: MigrationType::Text,
            default: None,
            allow_nil: true,
            primary_key: false,
            references: None,
        }
    }

    fn pk(name: &str) -> Attribute {
        Attribute {
            primary_key: true,
            allow_nil: false,
            ..attribute(name)
        }
    }

    fn referencing(name: &str, table: &str, field: &str) -> Attribute {
        Attribute {
            references: Some(Reference {
                table: table.into(),
                destination_field: field.into(),
            }),
            ..attribute(name)
        }
    }

    fn table() -> SmolStr {
        "posts".into()
    }

    #[test]
    fn test_create_table_comes_first() {
        let sorted = sort_operations(vec![
            Operation::AddAttribute { table: table(), attribute: pk("id") },
            Operation::CreateTable { table: table() },
        ]);

        assert!(matches!(&sorted[0], Operation::CreateTable { .. }));
        assert!(matches!(&sorted[1], Operation::AddAttribute { .. }));
    }

    #[test]
    fn test_primary_key_column_precedes_others() {
        let sorted = sort_operations(vec![
            Operation::CreateTable { table: table() },
            Operation::AddAttribute { table: table(), attribute: attribute("title") },
            Operation::AddAttribute { table: table(), attribute: pk("id") },
        ]);

        let names: Vec<&str> = sorted
            .iter()
            .filter_map(|op| match op {
                Operation::AddAttribute { attribute, .. } => Some(attribute.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["id", "title"]);
    }

    #[test]
    fn test_unique_index_follows_its_columns() {
        let identity = Identity { name: "unique_email".into(), keys: vec!["email".into()] };
        let sorted = sort_operations(vec![
            Operation::AddUniqueIndex { table: table(), identity },
            Operation::CreateTable { table: table() },
            Operation::AddAttribute { table: table(), attribute: attribute("email") },
        ]);

        assert!(matches!(&sorted[0], Operation::CreateTable { .. }));
        assert!(matches!(sorted.last(), Some(Operation::AddUniqueIndex { .. })));
    }

    #[test]
    fn test_index_removed_before_its_column() {
        let identity = Identity { name: "unique_email".into(), keys: vec!["email".into()] };
        let sorted = sort_operations(vec![
            Operation::RemoveAttribute { table: table(), attribute: attribute("email") },
            Operation::RemoveUniqueIndex { table: table(), identity },
        ]);

        assert!(matches!(&sorted[0], Operation::RemoveUniqueIndex { .. }));
        assert!(matches!(&sorted[1], Operation::RemoveAttribute { .. }));
    }

    #[test]
    fn test_index_removed_before_key_column_renamed() {
        let identity = Identity { name: "unique_email".into(), keys: vec!["email".into()] };
        let sorted = sort_operations(vec![
            Operation::RenameAttribute {
                table: table(),
                old: attribute("email"),
                new: attribute("contact_email"),
            },
            Operation::RemoveUniqueIndex { table: table(), identity },
        ]);

        assert!(matches!(&sorted[0], Operation::RemoveUniqueIndex { .. }));
        assert!(matches!(&sorted[1], Operation::RenameAttribute { .. }));
    }

    #[test]
    fn test_referencing_alter_sinks_past_target_column() {
        let sorted = sort_operations(vec![
            Operation::AlterAttribute {
                table: "comments".into(),
                old: attribute("post_id"),
                new: referencing("post_id", "posts", "id"),
            },
            Operation::CreateTable { table: table() },
            Operation::AddAttribute { table: table(), attribute: pk("id") },
        ]);

        assert!(matches!(&sorted[0], Operation::CreateTable { .. }));
        assert!(matches!(&sorted[1], Operation::AddAttribute { .. }));
        assert!(matches!(&sorted[2], Operation::AlterAttribute { .. }));
    }

    #[test]
    fn test_new_pk_added_before_old_pk_demoted() {
        let sorted = sort_operations(vec![
            Operation::AlterAttribute {
                table: table(),
                old: pk("a"),
                new: attribute("a"),
            },
            Operation::AddAttribute { table: table(), attribute: pk("b") },
        ]);

        assert!(matches!(&sorted[0], Operation::AddAttribute { .. }));
        assert!(matches!(&sorted[1], Operation::AlterAttribute { .. }));
    }

    #[test]
    fn test_pk_add_waits_for_pk_removal() {
        let sorted = sort_operations(vec![
            Operation::AddAttribute { table: table(), attribute: pk("b") },
            Operation::RemoveAttribute { table: table(), attribute: pk("a") },
        ]);

        assert!(matches!(&sorted[0], Operation::RemoveAttribute { .. }));
        assert!(matches!(&sorted[1], Operation::AddAttribute { .. }));
    }

    #[test]
    fn test_referenced_column_removed_after_reference_released() {
        let sorted = sort_operations(vec![
            Operation::RemoveAttribute { table: table(), attribute: attribute("id") },
            Operation::AlterAttribute {
                table: "comments".into(),
                old: referencing("post_id", "posts", "id"),
                new: attribute("post_id"),
            },
        ]);

        assert!(matches!(&sorted[0], Operation::AlterAttribute { .. }));
        assert!(matches!(&sorted[1], Operation::RemoveAttribute { .. }));
    }

    #[test]
    fn test_unconstrained_operations_keep_input_order() {
        let sorted = sort_operations(vec![
            Operation::AddAttribute { table: table(), attribute: attribute("a") },
            Operation::AddAttribute { table: table(), attribute: attribute("b") },
            Operation::AddAttribute { table: table(), attribute: attribute("c") },
        ]);

        let names: Vec<&str> = sorted
            .iter()
            .filter_map(|op| match op {
                Operation::AddAttribute { attribute, .. } => Some(attribute.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_foreign_key_add_waits_for_target_column() {
        let sorted = sort_operations(vec![
            Operation::AddAttribute {
                table: "comments".into(),
                attribute: referencing("post_id", "posts", "id"),
            },
            Operation::AddAttribute { table: table(), attribute: pk("id") },
        ]);

        assert!(matches!(
            &sorted[0],
            Operation::AddAttribute { table, .. } if table == "posts"
        ));
        assert!(matches!(
            &sorted[1],
            Operation::AddAttribute { table, .. } if table == "comments"
        ));
    }

    #[test]
    fn test_table_created_before_reference_to_it() {
        // Diffing the referencing table first must not leave its foreign
        // key ahead of the referenced table's creation.
        let sorted = sort_operations(vec![
            Operation::CreateTable { table: "comments".into() },
            Operation::AddAttribute { table: "comments".into(), attribute: pk("id") },
            Operation::AddAttribute { table: "comments".into(), attribute: attribute("post_id") },
            Operation::AlterAttribute {
                table: "comments".into(),
                old: attribute("post_id"),
                new: referencing("post_id", "posts", "id"),
            },
            Operation::CreateTable { table: "posts".into() },
            Operation::AddAttribute { table: "posts".into(), attribute: pk("id") },
        ]);

        let position = |predicate: &dyn Fn(&Operation) -> bool| {
            sorted.iter().position(|op| predicate(op)).unwrap()
        };
        let target_column = position(&|op| {
            matches!(op, Operation::AddAttribute { table, attribute } if table == "posts" && attribute.name == "id")
        });
        let reference = position(&|op| matches!(op, Operation::AlterAttribute { .. }));
        assert!(target_column < reference);
    }
}
