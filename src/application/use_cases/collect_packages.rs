use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;
use thiserror::Error;

use crate::application::services::export_parser::parse_environment_export;

static PYTHON_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^python\s*=\s*(\d+\.\d+)").expect("python version pattern is valid")
});

/// Names never written to the per-version package lists.
pub const COLLECT_IGNORED: &[&str] = &[
    "python",
    "pip",
    "setuptools",
    "wheel",
    "certifi",
    "ca-certificates",
];

/// パッケージ収集関連のエラー
#[derive(Debug, Error)]
pub enum CollectPackagesError {
    #[error("Cannot read {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Package names grouped by `X.Y` Python version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackagesByPython {
    pub groups: BTreeMap<String, BTreeSet<String>>,
    pub skipped_documents: usize,
}

/// 複数の環境YAMLからPythonバージョンごとにパッケージ名を集めるユースケース
pub struct CollectPackagesUseCase {
    input: PathBuf,
    output_prefix: String,
}

impl CollectPackagesUseCase {
    pub fn new(input: impl Into<PathBuf>, output_prefix: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output_prefix: output_prefix.into(),
        }
    }

    /// Read, group and write one file per Python version. Returns the
    /// written paths alongside the grouping.
    pub fn execute(&self) -> Result<(PackagesByPython, Vec<PathBuf>), CollectPackagesError> {
        let content =
            fs::read_to_string(&self.input).map_err(|source| CollectPackagesError::ReadFailed {
                path: self.input.clone(),
                source,
            })?;

        let collected = collect_packages(&content);
        let mut written = Vec::new();

        for (version, names) in &collected.groups {
            let path = output_path(&self.output_prefix, version);
            let mut body = names.iter().cloned().collect::<Vec<_>>().join("\n");
            body.push('\n');

            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| CollectPackagesError::WriteFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&path, body).map_err(|source| CollectPackagesError::WriteFailed {
                path: path.clone(),
                source,
            })?;
            tracing::info!(
                "Wrote {} package(s) for Python {} to {}",
                names.len(),
                version,
                path.display()
            );
            written.push(path);
        }

        Ok((collected, written))
    }
}

/// `<prefix>_py<XY>.txt`, e.g. `pkgs_py310.txt` for Python 3.10.
pub fn output_path(prefix: &str, version: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}_py{}.txt", version.replace('.', "")))
}

/// Split concatenated environment files before each top-level `name:` line.
pub fn split_documents(content: &str) -> Vec<String> {
    let mut documents = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        if line.starts_with("name:") && !current.trim().is_empty() {
            documents.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.trim().is_empty() {
        documents.push(current);
    }
    documents
}

pub fn collect_packages(content: &str) -> PackagesByPython {
    let mut collected = PackagesByPython::default();

    for (index, document) in split_documents(content).iter().enumerate() {
        let export = match parse_environment_export(document.trim_start_matches("---")) {
            Ok(export) => export,
            Err(e) => {
                tracing::warn!("Skipping document {}: {}", index + 1, e);
                collected.skipped_documents += 1;
                continue;
            }
        };

        let version = export.specs().find_map(|spec| {
            PYTHON_VERSION_RE
                .captures(spec.as_str())
                .map(|caps| caps[1].to_string())
        });
        let Some(version) = version else {
            tracing::warn!(
                "Skipping document {} ({}): no python version",
                index + 1,
                export.name.as_deref().unwrap_or("unnamed")
            );
            collected.skipped_documents += 1;
            continue;
        };

        let names = collected.groups.entry(version).or_default();
        names.extend(
            export
                .specs()
                .map(|spec| spec.name().to_string())
                .filter(|name| !name.is_empty() && !is_collect_ignored(name)),
        );
    }

    collected
}

fn is_collect_ignored(name: &str) -> bool {
    COLLECT_IGNORED.iter().any(|n| n.eq_ignore_ascii_case(name))
}
