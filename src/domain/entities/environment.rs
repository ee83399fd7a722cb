use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder used when a value could not be determined.
pub const UNKNOWN: &str = "Unknown";

/// A discovered conda environment prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondaEnvironment {
    /// Absolute prefix path
    pub path: PathBuf,

    /// Final path component, or the whole path when it has none
    pub name: String,

    /// Latest modification time found under `conda-meta/`
    pub last_modified: Option<DateTime<Local>>,

    /// Conda version recorded in `conda-meta/history` when the prefix was created
    pub creation_conda_version: String,
}

impl CondaEnvironment {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            path,
            name,
            last_modified: None,
            creation_conda_version: UNKNOWN.to_string(),
        }
    }

    pub fn with_last_modified(mut self, last_modified: Option<DateTime<Local>>) -> Self {
        self.last_modified = last_modified;
        self
    }

    pub fn with_creation_conda_version(mut self, version: impl Into<String>) -> Self {
        self.creation_conda_version = version.into();
        self
    }

    /// Path of the `conda-meta` directory.
    pub fn meta_dir(&self) -> PathBuf {
        self.path.join("conda-meta")
    }

    /// Deterministic file stem derived from the full prefix path.
    ///
    /// `/opt/envs/ml` becomes `opt_envs_ml`.
    pub fn safe_file_stem(&self) -> String {
        safe_file_stem(&self.path)
    }

    /// Manifest name: `<prefix><env>` unless the original name is requested.
    pub fn manifest_name(&self, prefix: &str, use_original_name: bool) -> String {
        if use_original_name {
            self.name.clone()
        } else {
            format!("{prefix}{}", self.name)
        }
    }

    pub fn last_modified_label(&self) -> String {
        self.last_modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }
}

pub fn safe_file_stem(path: &Path) -> String {
    let text = path.to_string_lossy();
    let replaced: String = text
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            other => other,
        })
        .collect();
    let trimmed = replaced.trim_matches('_');
    if trimmed.is_empty() {
        "root".to_string()
    } else {
        trimmed.to_string()
    }
}
