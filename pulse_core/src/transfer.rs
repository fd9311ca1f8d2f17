//! Whole-state export and import.
//!
//! The export document is the full progress state as pretty-printed JSON.
//! The same document is the import format: importing replaces the state
//! wholesale, never merging fields.

use crate::{Catalog, Error, ProgressState, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// `celestial-pulse-<username>-<YYYY-MM-DD>.json`
///
/// Characters that are unsafe in file names are replaced with `_`.
pub fn export_filename(username: &str, date: NaiveDate) -> String {
    let safe: String = username
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("celestial-pulse-{}-{}.json", safe, date.format("%Y-%m-%d"))
}

/// Parse and check an import document
///
/// Syntax or shape errors are `Error::Parse`. A well-formed document whose
/// step indices or XP total disagree with the catalog is rejected with
/// `Error::Validation` listing every problem.
pub fn parse_document(document: &str, catalog: &Catalog) -> Result<ProgressState> {
    let state: ProgressState =
        serde_json::from_str(document).map_err(|e| Error::Parse(e.to_string()))?;

    let problems = state.validate(catalog);
    if !problems.is_empty() {
        return Err(Error::Validation(format!(
            "Import rejected: {}",
            problems.join("; ")
        )));
    }

    Ok(state)
}

impl ProgressState {
    /// Serialize the full state as a human-readable document
    pub fn export_state(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replace this state with an imported document
    ///
    /// On any error the current state is left untouched.
    pub fn import_state(&mut self, document: &str, catalog: &Catalog) -> Result<()> {
        let imported = parse_document(document, catalog)?;
        tracing::info!(
            "Imported state with {} logs and {} xp (replacing {} logs, {} xp)",
            imported.logs.len(),
            imported.xp,
            self.logs.len(),
            self.xp
        );
        *self = imported;
        Ok(())
    }
}

/// Write an export document for `username` into `dir`
///
/// Returns the path written.
pub fn write_export(
    state: &ProgressState,
    username: &str,
    dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(username, date));
    std::fs::write(&path, state.export_state()?)?;
    tracing::info!("Exported progress for {} to {:?}", username, path);
    Ok(path)
}

/// Read an import document from disk
pub fn read_import(path: &Path, catalog: &Catalog) -> Result<ProgressState> {
    let contents = std::fs::read_to_string(path)?;
    parse_document(&contents, catalog)
}
