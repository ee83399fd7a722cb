//! Tracing subscriber setup.
//!
//! Installed once by the top-level invocation. Console output goes to stderr
//! without timestamps; when a log directory is given, every event is also
//! appended to a timestamped per-run log file.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::common::error::EnvReconError;
use crate::common::result::{EnvReconResult, ResultExt};

/// Options for [`init_logging`].
#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Raise the default level from `info` to `debug`.
    pub verbose: bool,

    /// Directory for the per-run log file. `None` disables file logging.
    pub log_dir: Option<PathBuf>,

    /// File name prefix, e.g. `envrecon` gives `envrecon_20240101_120000.log`.
    pub file_prefix: String,
}

impl LoggingOptions {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            log_dir: None,
            file_prefix: "envrecon".to_string(),
        }
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    fn default_directive(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

/// Build the path of the per-run log file inside `dir`.
pub fn log_file_path(dir: &Path, prefix: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{prefix}_{stamp}.log"))
}

/// Install the global subscriber. Returns the log file path when file
/// logging is active.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn init_logging(options: &LoggingOptions) -> EnvReconResult<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.default_directive()));

    let console_layer = fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);

    let (file_layer, log_path) = match &options.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| {
                EnvReconError::filesystem_error_with_source(
                    "Failed to create log directory",
                    Some(dir.clone()),
                    e,
                )
            })?;
            let path = log_file_path(dir, &options.file_prefix);
            let file = File::create(&path).map_err(|e| {
                EnvReconError::filesystem_error_with_source(
                    "Failed to create log file",
                    Some(path.clone()),
                    e,
                )
            })?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .with_internal_context("Failed to install logger")?;

    Ok(log_path)
}
