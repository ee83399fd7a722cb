use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Summary writer related errors
#[derive(Debug, Error)]
pub enum SummaryWriterError {
    #[error("CSV write failed: {path}: {source}")]
    CsvFailed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// One row of `processing_summary_<timestamp>.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub env_name: String,
    pub env_path: String,
    pub last_modified: String,
    pub creation_conda_version: String,
    pub current_conda_version: String,
    pub status: String,
    pub method: String,
    pub kept: usize,
    pub filtered: usize,
    pub notes: String,
    pub filtered_list: String,
}

pub fn summary_file_name(started: DateTime<Local>) -> String {
    format!("processing_summary_{}.csv", started.format("%Y%m%d_%H%M%S"))
}

/// Write the batch summary; the header is written even with no rows.
pub fn write_summary(path: &Path, rows: &[SummaryRow]) -> Result<(), SummaryWriterError> {
    let csv_error = |source: csv::Error| SummaryWriterError::CsvFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_error)?;

    writer
        .write_record([
            "env_name",
            "env_path",
            "last_modified",
            "creation_conda_version",
            "current_conda_version",
            "status",
            "method",
            "kept",
            "filtered",
            "notes",
            "filtered_list",
        ])
        .map_err(csv_error)?;

    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}
