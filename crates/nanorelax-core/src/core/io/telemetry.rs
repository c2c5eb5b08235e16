use serde::Serialize;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("CSV writing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
}

#[derive(Debug, Serialize)]
struct StepRecord {
    step: usize,
    total_force: f64,
}

/// Writes one `step,total_force` row per simulated step, with steps numbered
/// from 1.
pub fn write_step_csv<W: Write>(writer: W, force_history: &[f64]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (index, &total_force) in force_history.iter().enumerate() {
        csv_writer.serialize(StepRecord {
            step: index + 1,
            total_force,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Same as [`write_step_csv`], writing to a new file at `path`.
pub fn write_step_csv_to_path(path: &Path, force_history: &[f64]) -> Result<(), TelemetryError> {
    let to_error = |source| TelemetryError::Csv {
        path: path.to_string_lossy().to_string(),
        source,
    };
    let file = std::fs::File::create(path).map_err(|e| to_error(csv::Error::from(e)))?;
    write_step_csv(file, force_history).map_err(to_error)
}
