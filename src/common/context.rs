use std::path::PathBuf;
use std::time::Duration;

use crate::domain::value_objects::channel_policy::ChannelPolicy;
use crate::domain::value_objects::ignore_set::IgnoreSet;

/// Default upper bound on the number of history entries for a "clean" history.
pub const DEFAULT_HISTORY_THRESHOLD: usize = 50;

/// Default timeout applied to every conda invocation.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 180;

/// Directories the environment walker never descends into.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    ".git",
    ".svn",
    "node_modules",
    "__pycache__",
    "pkgs",
    "pkgs_dirs",
    ".cache",
];

/// Tunables shared by every subcommand, resolved from the config file and
/// CLI overrides.
#[derive(Debug, Clone)]
pub struct ReconSettings {
    pub history_threshold: usize,
    pub command_timeout_secs: u64,
    pub channels: Vec<String>,
    pub ignore_set: IgnoreSet,
    pub skip_dirs: Vec<String>,
    pub channel_policy: ChannelPolicy,
}

impl Default for ReconSettings {
    fn default() -> Self {
        Self {
            history_threshold: DEFAULT_HISTORY_THRESHOLD,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            channels: vec!["conda-forge".to_string()],
            ignore_set: IgnoreSet::default(),
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
            channel_policy: ChannelPolicy::default(),
        }
    }
}

impl ReconSettings {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn with_history_threshold(mut self, threshold: usize) -> Self {
        self.history_threshold = threshold;
        self
    }

    pub fn with_command_timeout_secs(mut self, secs: u64) -> Self {
        self.command_timeout_secs = secs;
        self
    }

    pub fn with_ignore_set(mut self, ignore_set: IgnoreSet) -> Self {
        self.ignore_set = ignore_set;
        self
    }
}

/// Per-invocation context handed to use cases.
///
/// Built once by the CLI layer after the conda executable has been located
/// and the logger installed; nothing in the crate reads configuration from
/// globals.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub settings: ReconSettings,

    /// Resolved path of the conda executable.
    pub conda_exe: PathBuf,

    /// Keep the environment's own name in generated manifests instead of the
    /// `cf_hist_` / `cf_filt_` prefixed one.
    pub use_original_name: bool,

    /// Per-run log file, when file logging is active.
    pub log_file: Option<PathBuf>,
}

impl RunContext {
    pub fn new(settings: ReconSettings, conda_exe: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            conda_exe: conda_exe.into(),
            use_original_name: false,
            log_file: None,
        }
    }

    pub fn with_original_names(mut self, use_original_name: bool) -> Self {
        self.use_original_name = use_original_name;
        self
    }

    pub fn with_log_file(mut self, log_file: Option<PathBuf>) -> Self {
        self.log_file = log_file;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ReconSettings::default();
        assert_eq!(settings.history_threshold, 50);
        assert_eq!(settings.command_timeout(), Duration::from_secs(180));
        assert_eq!(settings.channels, vec!["conda-forge".to_string()]);
        assert!(settings.skip_dirs.iter().any(|d| d == "node_modules"));
    }

    #[test]
    fn test_run_context_builders() {
        let context = RunContext::new(ReconSettings::default(), "/opt/conda/bin/conda")
            .with_original_names(true)
            .with_log_file(Some(PathBuf::from("/tmp/run.log")));

        assert!(context.use_original_name);
        assert_eq!(context.conda_exe, PathBuf::from("/opt/conda/bin/conda"));
        assert_eq!(context.log_file, Some(PathBuf::from("/tmp/run.log")));
    }
}
