use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use validator::Validate;

use crate::common::context::{
    ReconSettings, DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_HISTORY_THRESHOLD, DEFAULT_SKIP_DIRS,
};
use crate::domain::value_objects::{
    channel_policy::{
        ChannelPolicy, DEFAULT_ALLOWED_CHANNELS, DEFAULT_DENIED_CHANNELS, DEFAULT_PASS_CHANNELS,
    },
    ignore_set::IgnoreSet,
};

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "envrecon.yml";

/// Configuration store related errors
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("Configuration file not found at path: {0}")]
    ConfigFileNotFound(String),

    #[error("Configuration file read failed: {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parsing failed: {0}")]
    YamlParsingFailed(#[from] serde_yaml::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(#[from] validator::ValidationErrors),
}

/// Channel rules for the compliance audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AuditConfig {
    #[validate(length(min = 1))]
    pub allowed_channels: Vec<String>,

    pub denied_channels: Vec<String>,

    pub pass_channels: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            allowed_channels: owned(DEFAULT_ALLOWED_CHANNELS),
            denied_channels: owned(DEFAULT_DENIED_CHANNELS),
            pass_channels: owned(DEFAULT_PASS_CHANNELS),
        }
    }
}

/// Contents of `envrecon.yml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EnvReconConfig {
    #[validate(range(min = 1, max = 10000))]
    pub history_threshold: usize,

    #[validate(range(min = 1, max = 3600))]
    pub command_timeout_secs: u64,

    #[validate(length(min = 1))]
    pub channels: Vec<String>,

    /// Replaces the default ignore set when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_packages: Option<Vec<String>>,

    /// Added to whichever ignore set is in effect
    pub extra_ignore_packages: Vec<String>,

    pub skip_dirs: Vec<String>,

    #[validate(nested)]
    pub audit: AuditConfig,
}

impl Default for EnvReconConfig {
    fn default() -> Self {
        Self {
            history_threshold: DEFAULT_HISTORY_THRESHOLD,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            channels: vec!["conda-forge".to_string()],
            ignore_packages: None,
            extra_ignore_packages: Vec::new(),
            skip_dirs: owned(DEFAULT_SKIP_DIRS),
            audit: AuditConfig::default(),
        }
    }
}

impl EnvReconConfig {
    pub fn into_settings(self) -> ReconSettings {
        let mut ignore_set = match self.ignore_packages {
            Some(names) => IgnoreSet::from_names(names),
            None => IgnoreSet::default(),
        };
        ignore_set.extend(self.extra_ignore_packages);

        ReconSettings {
            history_threshold: self.history_threshold,
            command_timeout_secs: self.command_timeout_secs,
            channels: self.channels,
            ignore_set,
            skip_dirs: self.skip_dirs,
            channel_policy: ChannelPolicy::new(
                self.audit.allowed_channels,
                self.audit.denied_channels,
                self.audit.pass_channels,
            ),
        }
    }
}

/// Loads and validates the YAML configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    working_dir: Option<PathBuf>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for the default file in `dir` instead of the current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Load an explicit file, or the default file if present, or defaults.
    pub fn load(&self, explicit: Option<&Path>) -> Result<EnvReconConfig, ConfigStoreError> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigStoreError::ConfigFileNotFound(
                        path.display().to_string(),
                    ));
                }
                self.read_config(path)
            }
            None => {
                let candidate = self.default_path();
                if candidate.is_file() {
                    tracing::debug!("Using configuration file {}", candidate.display());
                    self.read_config(&candidate)
                } else {
                    Ok(EnvReconConfig::default())
                }
            }
        }
    }

    pub fn read_config(&self, config_path: &Path) -> Result<EnvReconConfig, ConfigStoreError> {
        let contents =
            fs::read_to_string(config_path).map_err(|source| ConfigStoreError::ReadFailed {
                path: config_path.display().to_string(),
                source,
            })?;
        Self::parse(&contents)
    }

    /// Parse and validate YAML text. An empty document yields the defaults.
    pub fn parse(contents: &str) -> Result<EnvReconConfig, ConfigStoreError> {
        let config: EnvReconConfig = if contents.trim().is_empty() {
            EnvReconConfig::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    fn default_path(&self) -> PathBuf {
        match &self.working_dir {
            Some(dir) => dir.join(DEFAULT_CONFIG_FILE),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
