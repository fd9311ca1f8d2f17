//! CSV export of a user's workout history.
//!
//! One row per log, oldest first, for use in spreadsheets. This is an
//! outbound copy only; the JSON export remains the import format.

use crate::{Catalog, ProgressState, ProgressionKey, Result, WorkoutLog};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    date: String,
    #[serde(rename = "type")]
    kind: &'static str,
    key: Option<&'static str>,
    step_index: Option<usize>,
    step_label: Option<&'a str>,
    sets: Option<u32>,
    reps: Option<u32>,
    minutes: Option<u32>,
    xp_awarded: u64,
    notes: Option<&'a str>,
}

impl<'a> CsvRow<'a> {
    fn new(log: &'a WorkoutLog, catalog: &'a Catalog) -> Self {
        let (key, step_index, sets, reps, minutes) = match log {
            WorkoutLog::Movement {
                key,
                step_index,
                sets,
                reps,
                ..
            } => (
                Some(ProgressionKey::Movement(*key)),
                Some(*step_index),
                Some(*sets),
                Some(*reps),
                None,
            ),
            WorkoutLog::Skill {
                key, step_index, ..
            } => (
                Some(ProgressionKey::Skill(*key)),
                Some(*step_index),
                None,
                None,
                None,
            ),
            WorkoutLog::Cardio { minutes, .. } => (None, None, None, None, Some(*minutes)),
        };

        let step_label = key
            .zip(step_index)
            .and_then(|(k, i)| catalog.step_at(k, i))
            .map(|s| s.label.as_str());

        CsvRow {
            id: log.id(),
            date: log.date().to_rfc3339(),
            kind: log.kind(),
            key: key.map(|k| match k {
                ProgressionKey::Movement(m) => m.as_str(),
                ProgressionKey::Skill(s) => s.as_str(),
            }),
            step_index,
            step_label,
            sets,
            reps,
            minutes,
            xp_awarded: log.xp_awarded(),
            notes: log.notes(),
        }
    }
}

/// Write every log in `state` to a CSV file at `path`
///
/// Any existing file is replaced. Returns the number of rows written.
pub fn export_logs_csv(state: &ProgressState, catalog: &Catalog, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    // Logs are stored newest first
    for log in state.logs.iter().rev() {
        writer.serialize(CsvRow::new(log, catalog))?;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} logs to {:?}", state.logs.len(), path);
    Ok(state.logs.len())
}
