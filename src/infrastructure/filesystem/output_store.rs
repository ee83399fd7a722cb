use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs as async_fs;

use crate::domain::entities::environment::CondaEnvironment;
use crate::domain::entities::manifest::EnvironmentFile;
use crate::domain::value_objects::reconcile_method::ReconcileMethod;

pub const HISTORY_MANIFEST_DIR: &str = "from_history";
pub const FALLBACK_MANIFEST_DIR: &str = "from_fallback";
pub const RAW_HISTORY_DIR: &str = "raw_history_outputs";
pub const RAW_LISTING_DIR: &str = "raw_list_export_outputs";

/// Output store related errors
#[derive(Debug, Error)]
pub enum OutputStoreError {
    #[error("Directory creation failed: {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File write failed: {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML serialization failed: {0}")]
    YamlSerializationFailed(#[from] serde_yaml::Error),
}

impl OutputStoreError {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::DirectoryCreationFailed { path, .. } | Self::WriteFailed { path, .. } => {
                Some(path)
            }
            Self::YamlSerializationFailed(_) => None,
        }
    }
}

/// Directory layout of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_dir(&self, method: ReconcileMethod) -> PathBuf {
        match method {
            ReconcileMethod::History => self.root.join(HISTORY_MANIFEST_DIR),
            ReconcileMethod::Fallback => self.root.join(FALLBACK_MANIFEST_DIR),
        }
    }

    pub fn manifest_path(&self, env: &CondaEnvironment, method: ReconcileMethod) -> PathBuf {
        self.manifest_dir(method)
            .join(format!("{}.yml", env.safe_file_stem()))
    }

    pub fn history_archive_path(&self, env: &CondaEnvironment) -> PathBuf {
        self.root
            .join(RAW_HISTORY_DIR)
            .join(format!("{}_history.yml", env.safe_file_stem()))
    }

    pub fn listing_archive_path(&self, env: &CondaEnvironment) -> PathBuf {
        self.root
            .join(RAW_LISTING_DIR)
            .join(format!("{}_list_export.txt", env.safe_file_stem()))
    }

    fn all_dirs(&self) -> [PathBuf; 5] {
        [
            self.root.clone(),
            self.root.join(HISTORY_MANIFEST_DIR),
            self.root.join(FALLBACK_MANIFEST_DIR),
            self.root.join(RAW_HISTORY_DIR),
            self.root.join(RAW_LISTING_DIR),
        ]
    }
}

/// Writes archives and manifests below an [`OutputLayout`].
#[derive(Debug, Clone)]
pub struct OutputStore {
    layout: OutputLayout,
}

impl OutputStore {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Create every output directory; succeeds if they already exist.
    pub async fn ensure_directories(&self) -> Result<(), OutputStoreError> {
        for dir in self.layout.all_dirs() {
            async_fs::create_dir_all(&dir)
                .await
                .map_err(|source| OutputStoreError::DirectoryCreationFailed {
                    path: dir.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Save the raw history export verbatim.
    pub async fn archive_history(
        &self,
        env: &CondaEnvironment,
        text: &str,
    ) -> Result<PathBuf, OutputStoreError> {
        let path = self.layout.history_archive_path(env);
        write_file(&path, text).await?;
        Ok(path)
    }

    /// Save the raw flat listing verbatim.
    pub async fn archive_flat_listing(
        &self,
        env: &CondaEnvironment,
        text: &str,
    ) -> Result<PathBuf, OutputStoreError> {
        let path = self.layout.listing_archive_path(env);
        write_file(&path, text).await?;
        Ok(path)
    }

    /// Serialize and write a manifest. The file appears complete or not at
    /// all: content goes to a sibling temporary file that is then renamed.
    pub async fn write_manifest(
        &self,
        env: &CondaEnvironment,
        method: ReconcileMethod,
        file: &EnvironmentFile,
    ) -> Result<PathBuf, OutputStoreError> {
        let yaml = file.to_yaml()?;
        let path = self.layout.manifest_path(env, method);
        let tmp_path = path.with_extension("yml.tmp");

        write_file(&tmp_path, &yaml).await?;
        if let Err(source) = async_fs::rename(&tmp_path, &path).await {
            let _ = async_fs::remove_file(&tmp_path).await;
            return Err(OutputStoreError::WriteFailed { path, source });
        }

        Ok(path)
    }
}

async fn write_file(path: &Path, content: &str) -> Result<(), OutputStoreError> {
    async_fs::write(path, content)
        .await
        .map_err(|source| OutputStoreError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
}
