//! Writes generated code into the target artifacts without clobbering
//! hand-written content.
//!
//! The source artifact is merged around a marker comment: everything
//! before the marker (includes, globals, helper functions) belongs to
//! the user, everything after it belongs to the generator. The
//! declarations header is written once and then never touched again.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::Error;

/// Separates hand-written code from the generated region. Everything
/// after this line is owned by the generator and replaced on every run.
pub const MARKER: &str = "// Code generated from statemachine";

/// What [`merge_generated`] did to the source artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The artifact did not exist; it was created as marker + body.
    Created,
    /// The marker was found; the region after it was replaced.
    Replaced,
    /// The artifact existed without a marker; marker + body were
    /// appended after the existing content.
    Appended,
}

/// Write `body` into the generated region of `path`.
pub fn merge_generated(path: &Path, body: &str) -> Result<MergeOutcome, Error> {
    let (merged, outcome) = match read_if_exists(path)? {
        None => (format!("{MARKER}\n{body}"), MergeOutcome::Created),
        Some(existing) => match existing.find(MARKER) {
            Some(at) => (
                format!("{}{MARKER}\n{body}", &existing[..at]),
                MergeOutcome::Replaced,
            ),
            None => {
                let mut merged = existing;
                if !merged.is_empty() && !merged.ends_with('\n') {
                    merged.push('\n');
                }
                merged.push_str(MARKER);
                merged.push('\n');
                merged.push_str(body);
                (merged, MergeOutcome::Appended)
            }
        },
    };
    fs::write(path, merged)?;
    Ok(outcome)
}

/// Create the declarations artifact unless it already exists.
///
/// Returns whether the file was created. An existing header is left
/// byte-identical: it is expected to accumulate hand edits (real
/// variable types, function signatures) that a regeneration must not
/// clobber. Intermediate directories are created as needed.
pub fn write_header_if_absent(path: &Path, content: &str) -> Result<bool, Error> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(true)
}

fn read_if_exists(path: &Path) -> Result<Option<String>, Error> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error.into()),
    }
}
