use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::domain::entities::environment::{CondaEnvironment, UNKNOWN};

const CONDA_META: &str = "conda-meta";
const HISTORY_FILE: &str = "history";
const PACKAGE_CACHE: &str = "pkgs";
const CONDA_VERSION_MARKER: &str = "# conda version:";

/// Which prefixes count as environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Has `conda-meta/history` and is not a base install (no `pkgs/`).
    Reconcilable,
    /// Any directory holding `conda-meta/`, base installs included.
    Any,
}

/// Walks search roots looking for conda prefixes.
#[derive(Debug, Clone)]
pub struct EnvDiscovery {
    skip_dirs: Vec<String>,
    mode: DiscoveryMode,
}

impl EnvDiscovery {
    pub fn new(skip_dirs: Vec<String>, mode: DiscoveryMode) -> Self {
        Self { skip_dirs, mode }
    }

    /// Discover environments below every root, sorted oldest-modified first
    /// with unknown times last.
    ///
    /// Missing roots and unreadable directories are logged and skipped.
    pub fn discover(&self, roots: &[PathBuf]) -> Vec<CondaEnvironment> {
        let mut found: Vec<PathBuf> = Vec::new();
        for root in roots {
            if !root.is_dir() {
                tracing::warn!("Search path does not exist, skipping: {}", root.display());
                continue;
            }
            tracing::info!("Scanning {}", root.display());
            self.walk(root, &mut found);
        }
        found.sort();
        found.dedup();

        let mut environments: Vec<CondaEnvironment> =
            found.into_iter().map(describe_environment).collect();
        sort_oldest_first(&mut environments);

        tracing::info!("Found {} environment(s)", environments.len());
        environments
    }

    fn walk(&self, root: &Path, found: &mut Vec<PathBuf>) {
        let mut entries = WalkDir::new(root).follow_links(false).into_iter();

        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable path: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if entry.depth() > 0 && (name == CONDA_META || self.skip_dirs.iter().any(|s| *s == name)) {
                entries.skip_current_dir();
                continue;
            }

            let path = entry.path();
            let is_base = path.join(PACKAGE_CACHE).is_dir();
            let matches = match self.mode {
                DiscoveryMode::Reconcilable => {
                    !is_base && path.join(CONDA_META).join(HISTORY_FILE).is_file()
                }
                DiscoveryMode::Any => path.join(CONDA_META).is_dir(),
            };

            if matches {
                tracing::debug!("Found environment {}", path.display());
                found.push(path.to_path_buf());
            }

            // A base install keeps its named environments under envs/.
            if matches && !is_base {
                entries.skip_current_dir();
            }
        }
    }
}

/// Collect modification time and creation conda version for a prefix.
pub fn describe_environment(path: PathBuf) -> CondaEnvironment {
    let meta_dir = path.join(CONDA_META);
    let last_modified = latest_modification(&meta_dir);
    let version = read_creation_version(&meta_dir.join(HISTORY_FILE));

    CondaEnvironment::new(path)
        .with_last_modified(last_modified)
        .with_creation_conda_version(version.unwrap_or_else(|| UNKNOWN.to_string()))
}

fn latest_modification(dir: &Path) -> Option<DateTime<Local>> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok()?.modified().ok())
        .max()
        .map(|t: SystemTime| DateTime::<Local>::from(t))
}

/// First `# conda version: X` line of a history file. Invalid UTF-8 is
/// replaced rather than rejected.
pub fn read_creation_version(history: &Path) -> Option<String> {
    let bytes = fs::read(history).ok()?;
    String::from_utf8_lossy(&bytes).lines().find_map(|line| {
        line.trim()
            .strip_prefix(CONDA_VERSION_MARKER)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

fn sort_oldest_first(environments: &mut [CondaEnvironment]) {
    environments.sort_by(|a, b| match (a.last_modified, b.last_modified) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.path.cmp(&b.path)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.path.cmp(&b.path),
    });
}
