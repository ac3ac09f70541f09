//! Interactive rename resolution.
//!
//! A column that disappears while another appears may be a rename. Only the
//! user can tell, so the differ routes every (add, remove) pairing through
//! the shell before emitting operations.

use smol_str::SmolStr;

use crate::error::{MigrateError, MigrateResult};
use crate::shell::Shell;
use crate::snapshot::Attribute;

const RENAME_ATTEMPTS: u32 = 3;

/// Resolved rename pairs as `(new, old)`, plus whatever remains to add and
/// remove.
type Resolution = (Vec<Attribute>, Vec<Attribute>, Vec<(Attribute, Attribute)>);

/// Ask the user which removed attributes are really renames of added ones.
pub(crate) fn resolve_renames<S: Shell>(
    shell: &mut S,
    table: &SmolStr,
    mut adding: Vec<Attribute>,
    removing: Vec<Attribute>,
) -> MigrateResult<Resolution> {
    if removing.is_empty() {
        return Ok((adding, removing, Vec::new()));
    }

    if adding.len() == 1 && removing.len() == 1 {
        let question = format!(
            "Are you renaming :{} to :{}?",
            removing[0].name, adding[0].name
        );
        if shell.confirm(&question) {
            let new = adding.remove(0);
            let old = removing.into_iter().next().ok_or_else(|| {
                MigrateError::prompt("rename candidate disappeared")
            })?;
            return Ok((adding, Vec::new(), vec![(new, old)]));
        }
        return Ok((adding, removing, Vec::new()));
    }

    let mut renames = Vec::new();
    let mut still_removing = Vec::new();

    for old in removing {
        if adding.is_empty() || !shell.confirm(&format!("Are you renaming :{}?", old.name)) {
            still_removing.push(old);
            continue;
        }
        let new = match_new_name(shell, table, &old, &mut adding)?;
        renames.push((new, old));
    }

    Ok((adding, still_removing, renames))
}

/// Ask for the new name until it matches an attribute being added.
fn match_new_name<S: Shell>(
    shell: &mut S,
    table: &SmolStr,
    old: &Attribute,
    adding: &mut Vec<Attribute>,
) -> MigrateResult<Attribute> {
    for _ in 0..RENAME_ATTEMPTS {
        let answer = shell.prompt("What are you renaming it to?");
        let answer = answer.trim().trim_start_matches(':');
        if let Some(index) = adding.iter().position(|a| a.name == answer) {
            return Ok(adding.remove(index));
        }
        shell.info(&format!("No attribute :{answer} is being added to {table}"));
    }

    Err(MigrateError::RenameResolutionFailed {
        table: table.to_string(),
        attribute: old.name.to_string(),
        attempts: RENAME_ATTEMPTS,
    })
}
