//! Migration source rendering.

use crate::diff::Operation;
use crate::error::MigrateResult;
use crate::phase::Phase;
use crate::snapshot::{Attribute, Identity};

/// Serializes phases into migration source text.
pub trait MigrationRenderer {
    /// Render the up body of a phase.
    fn up(&self, phase: &Phase) -> String;

    /// Render the down body of a phase.
    fn down(&self, phase: &Phase) -> String;

    /// Wrap rendered up and down bodies into the final migration artifact.
    fn module(&self, name: &str, up: &str, down: &str) -> String;

    /// File extension of the artifact.
    fn extension(&self) -> &str;
}

/// Post-processing hook applied to the rendered artifact.
pub trait Formatter {
    /// Reformat the migration source.
    fn format(&self, source: &str) -> MigrateResult<String>;
}

/// Renders Ecto migration modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct EctoRenderer;

impl MigrationRenderer for EctoRenderer {
    fn up(&self, phase: &Phase) -> String {
        match phase {
            Phase::Create { table, operations } => {
                let lines: Vec<String> =
                    operations.iter().map(|op| self.up_line(op)).collect();
                format!(
                    "create table(:{table}, primary_key: false) do\n{}\nend",
                    indent(&lines.join("\n"), 2)
                )
            }
            Phase::Alter { table, operations } => match operations.as_slice() {
                [op @ (Operation::AddUniqueIndex { .. } | Operation::RemoveUniqueIndex { .. })] => {
                    self.up_line(op)
                }
                operations => {
                    let lines: Vec<String> =
                        operations.iter().map(|op| self.up_line(op)).collect();
                    format!(
                        "alter table(:{table}) do\n{}\nend",
                        indent(&lines.join("\n"), 2)
                    )
                }
            },
        }
    }

    fn down(&self, phase: &Phase) -> String {
        match phase {
            Phase::Create { table, .. } => format!("drop table(:{table})"),
            Phase::Alter { table, operations } => match operations.as_slice() {
                [op @ (Operation::AddUniqueIndex { .. } | Operation::RemoveUniqueIndex { .. })] => {
                    self.down_line(op)
                }
                operations => {
                    let lines: Vec<String> = operations
                        .iter()
                        .rev()
                        .map(|op| self.down_line(op))
                        .collect();
                    format!(
                        "alter table(:{table}) do\n{}\nend",
                        indent(&lines.join("\n"), 2)
                    )
                }
            },
        }
    }

    fn module(&self, name: &str, up: &str, down: &str) -> String {
        format!(
            "defmodule {name} do\n  \
             @moduledoc \"\"\"\n  \
             Updates resources based on their most recent snapshots.\n  \
             \"\"\"\n\n  \
             use Ecto.Migration\n\n  \
             def up do\n{}\n  end\n\n  \
             def down do\n{}\n  end\nend\n",
            indent(up, 4),
            indent(down, 4),
        )
    }

    fn extension(&self) -> &str {
        "exs"
    }
}

impl EctoRenderer {
    fn up_line(&self, operation: &Operation) -> String {
        match operation {
            Operation::CreateTable { table } => format!("create table(:{table})"),
            Operation::AddAttribute { attribute, .. } => self.add_line(attribute),
            Operation::AlterAttribute { new, .. } => self.modify_line(new),
            Operation::RenameAttribute { old, new, .. } => {
                format!("rename :{}, to: :{}", old.name, new.name)
            }
            Operation::RemoveAttribute { attribute, .. } => format!("remove :{}", attribute.name),
            Operation::AddUniqueIndex { table, identity } => {
                self.create_index_line(table, identity)
            }
            Operation::RemoveUniqueIndex { table, identity } => {
                self.drop_index_line(table, identity)
            }
        }
    }

    /// Inverse of [`Self::up_line`], used inside reversed alter blocks.
    fn down_line(&self, operation: &Operation) -> String {
        match operation {
            Operation::CreateTable { table } => format!("drop table(:{table})"),
            Operation::AddAttribute { attribute, .. } => format!("remove :{}", attribute.name),
            Operation::AlterAttribute { old, .. } => self.modify_line(old),
            Operation::RenameAttribute { old, new, .. } => {
                format!("rename :{}, to: :{}", new.name, old.name)
            }
            Operation::RemoveAttribute { attribute, .. } => self.add_line(attribute),
            Operation::AddUniqueIndex { table, identity } => {
                self.drop_index_line(table, identity)
            }
            Operation::RemoveUniqueIndex { table, identity } => {
                self.create_index_line(table, identity)
            }
        }
    }

    fn add_line(&self, attribute: &Attribute) -> String {
        format!(
            "add :{}, {}{}",
            attribute.name,
            self.type_expr(attribute),
            self.attribute_opts(attribute)
        )
    }

    fn modify_line(&self, attribute: &Attribute) -> String {
        format!(
            "modify :{}, {}{}",
            attribute.name,
            self.type_expr(attribute),
            self.attribute_opts(attribute)
        )
    }

    fn type_expr(&self, attribute: &Attribute) -> String {
        match &attribute.references {
            Some(reference) => format!(
                "references(:{}, column: :{}, type: :{})",
                reference.table, reference.destination_field, attribute.ty
            ),
            None => format!(":{}", attribute.ty),
        }
    }

    fn attribute_opts(&self, attribute: &Attribute) -> String {
        let mut opts = Vec::new();
        if !attribute.allow_nil {
            opts.push("null: false".to_string());
        }
        if let Some(default) = &attribute.default {
            opts.push(format!("default: {default}"));
        }
        if attribute.primary_key {
            opts.push("primary_key: true".to_string());
        }

        if opts.is_empty() {
            String::new()
        } else {
            format!(", {}", opts.join(", "))
        }
    }

    fn create_index_line(&self, table: &str, identity: &Identity) -> String {
        format!(
            "create unique_index(:{table}, [{}], name: \"{}\")",
            self.key_list(identity),
            index_name(table, identity)
        )
    }

    fn drop_index_line(&self, table: &str, identity: &Identity) -> String {
        format!(
            "drop_if_exists unique_index(:{table}, [{}], name: \"{}\")",
            self.key_list(identity),
            index_name(table, identity)
        )
    }

    fn key_list(&self, identity: &Identity) -> String {
        identity
            .keys
            .iter()
            .map(|key| format!(":{key}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn index_name(table: &str, identity: &Identity) -> String {
    format!("{table}_{}_index", identity.name)
}

fn indent(text: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
