//! Peephole fusion of adjacent operations.

use crate::diff::Operation;

/// Fuse each `AddAttribute` that is immediately followed by the
/// `AlterAttribute` restoring its reference into a single
/// reference-carrying `AddAttribute`.
///
/// The differ splits referenced additions in two so the orderer has an edge
/// to work with; once ordering proves nothing had to run in between, the
/// split is redundant.
pub fn streamline(operations: Vec<Operation>) -> Vec<Operation> {
    let mut out = Vec::with_capacity(operations.len());
    let mut iter = operations.into_iter().peekable();

    while let Some(operation) = iter.next() {
        let fused = match (&operation, iter.peek()) {
            (
                Operation::AddAttribute { table, attribute },
                Some(Operation::AlterAttribute { table: alter_table, old, new }),
            ) if table == alter_table
                && new.references.is_some()
                && old.name == attribute.name
                && new.name == attribute.name =>
            {
                Some(Operation::AddAttribute {
                    table: table.clone(),
                    attribute: new.clone(),
                })
            }
            _ => None,
        };

        match fused {
            Some(add) => {
                out.push(add);
                iter.next();
            }
            None => out.push(operation),
        }
    }

    out
}
