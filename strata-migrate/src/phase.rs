//! Grouping of ordered operations into executable phases.

use smol_str::SmolStr;

use crate::diff::Operation;

/// A grouping of operations that render as one code block.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Column additions that belong to a just-created table.
    Create {
        /// The table being created.
        table: SmolStr,
        /// Operations to run inside the create block.
        operations: Vec<Operation>,
    },
    /// Changes against an existing table.
    Alter {
        /// The table being altered.
        table: SmolStr,
        /// Operations to run inside the alter block.
        operations: Vec<Operation>,
    },
}

impl Phase {
    /// The table this phase targets.
    pub fn table(&self) -> &SmolStr {
        match self {
            Self::Create { table, .. } | Self::Alter { table, .. } => table,
        }
    }

    /// The operations grouped into this phase.
    pub fn operations(&self) -> &[Operation] {
        match self {
            Self::Create { operations, .. } | Self::Alter { operations, .. } => operations,
        }
    }

    fn push(&mut self, operation: Operation) {
        match self {
            Self::Create { operations, .. } | Self::Alter { operations, .. } => {
                operations.push(operation);
            }
        }
    }
}

/// Group consecutive same-table operations into phases.
///
/// A `CreateTable` opens a create phase that swallows the attribute
/// operations following it on the same table; loose attribute operations
/// group into alter phases; anything else becomes a phase of its own.
pub fn group_into_phases(operations: Vec<Operation>) -> Vec<Phase> {
    let mut phases = Vec::new();
    let mut open: Option<Phase> = None;

    for operation in operations {
        match operation {
            Operation::CreateTable { table } => {
                if let Some(phase) = open.take() {
                    phases.push(phase);
                }
                open = Some(Phase::Create {
                    table,
                    operations: Vec::new(),
                });
            }
            operation if operation.is_attribute_op() => match open.take() {
                Some(mut phase) if phase.table() == operation.table() => {
                    phase.push(operation);
                    open = Some(phase);
                }
                previous => {
                    if let Some(phase) = previous {
                        phases.push(phase);
                    }
                    open = Some(Phase::Alter {
                        table: operation.table().clone(),
                        operations: vec![operation],
                    });
                }
            },
            operation => {
                if let Some(phase) = open.take() {
                    phases.push(phase);
                }
                phases.push(Phase::Alter {
                    table: operation.table().clone(),
                    operations: vec![operation],
                });
            }
        }
    }

    if let Some(phase) = open {
        phases.push(phase);
    }

    phases
}
