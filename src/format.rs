//! Tab-delimited tableau files (OTSoft layout) and constraint-type files.
//!
//! Tableau layout:
//! ```text
//! \t\t\tFull name 1\tFull name 2
//! \t\t\tC1\tC2
//! input\tcandidate\tfrequency\tv1\tv2
//! \tcandidate\tfrequency\tv1\tv2
//! ```
//! A non-empty first column opens a new input; an empty one adds another
//! candidate to the previous input. Blank frequency and violation cells
//! read as 0.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{FormatError, TableauError};
use crate::tableau::{Candidate, Constraint, ConstraintTypeEntry, Input, Tableau, WinnerPolicy};

/// Parse a tableau from text.
pub fn parse_tableau(text: &str, policy: WinnerPolicy) -> Result<Tableau, TableauError> {
    let mut lines = text.lines().enumerate();

    let (_, header) = lines.next().ok_or(FormatError::MissingHeader)?;
    let names = split_header(header);
    if names.is_empty() {
        return Err(FormatError::MissingHeader.into());
    }
    let short_names = lines.next().map(|(_, l)| split_header(l)).unwrap_or_default();
    if short_names.len() != names.len() {
        warn!(
            full = names.len(),
            short = short_names.len(),
            "unequal number of full and short constraint names"
        );
    }
    let constraints: Vec<Constraint> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let short = short_names.get(i).unwrap_or(name);
            Constraint::new(name.clone(), short.clone())
        })
        .collect();

    let n = constraints.len();
    let mut inputs: Vec<Input> = Vec::new();
    for (idx, raw) in lines {
        let line = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let cols: Vec<&str> = raw.split('\t').collect();
        if cols.len() != n + 3 {
            return Err(FormatError::Line {
                line,
                message: format!("expected {} columns, found {}", n + 3, cols.len()),
            }
            .into());
        }

        let frequency = parse_count(cols[2], line, 3)?;
        let violations = cols[3..]
            .iter()
            .enumerate()
            .map(|(k, cell)| parse_count(cell, line, k + 4))
            .collect::<Result<Vec<u32>, FormatError>>()?;
        let candidate = Candidate::new(cols[1].trim(), frequency, violations);

        let input_form = cols[0].trim();
        if input_form.is_empty() {
            let current = inputs.last_mut().ok_or_else(|| FormatError::Line {
                line,
                message: "candidate row before any input".to_string(),
            })?;
            current.candidates.push(candidate);
        } else {
            inputs.push(Input::new(input_form, vec![candidate]));
        }
    }

    Tableau::new(constraints, inputs, policy)
}

pub fn load_tableau(path: impl AsRef<Path>, policy: WinnerPolicy) -> Result<Tableau, TableauError> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    parse_tableau(&raw, policy)
}

/// Parse `name \t type [\t ...]` lines. Extra columns are ignored.
pub fn parse_constraint_types(text: &str) -> Result<Vec<ConstraintTypeEntry>, FormatError> {
    let mut entries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let mut cols = raw.split('\t');
        let name = cols.next().unwrap_or_default().trim();
        let token = cols.next().map(str::trim).ok_or_else(|| FormatError::Line {
            line: idx + 1,
            message: format!("no constraint type given for {name:?}"),
        })?;
        entries.push(ConstraintTypeEntry {
            name: name.to_string(),
            token: token.to_string(),
        });
    }
    Ok(entries)
}

pub fn load_constraint_types(
    path: impl AsRef<Path>,
) -> Result<Vec<ConstraintTypeEntry>, TableauError> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    Ok(parse_constraint_types(&raw)?)
}

/// `dir/name.txt` -> `dir/name.constraints`.
pub fn sibling_constraints_path(tableau_path: &Path) -> PathBuf {
    tableau_path.with_extension("constraints")
}

fn split_header(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('\t').map(|s| s.trim().to_string()).collect()
}

fn parse_count(cell: &str, line: usize, column: usize) -> Result<u32, FormatError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(0);
    }
    cell.parse::<u32>().map_err(|_| FormatError::NotACount {
        line,
        column,
        token: cell.to_string(),
    })
}
