pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::env;
use std::path::{Path, PathBuf};
use std::process::exit;

use crate::application::services::history_classifier::HistoryClassifier;
use crate::application::use_cases::{
    batch_generate::BatchGenerateConfig, channel_audit::ChannelAuditConfig,
};
use crate::common::context::{ReconSettings, RunContext};
use crate::common::error::EnvReconError;
use crate::common::logging::{init_logging, LoggingOptions};
use crate::infrastructure::filesystem::{audit_report::host_name, config_store::ConfigStore};
use crate::infrastructure::process::resolve_executable;
use crate::presentation::ui::DisplayHelper;

use self::commands::{AuditCommand, ClassifyCommand, CollectCommand, GenerateCommand};

/// Default output directory of `generate`.
pub const DEFAULT_OUTPUT_DIR: &str = "conda_forge_yamls_conditional";

/// Default file prefix of `collect`.
pub const DEFAULT_COLLECT_PREFIX: &str = "packages";

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    " ",
    env!("BUILD_DATE"),
    ", ",
    env!("BUILD_TARGET"),
    ")"
);

/// envrecon - Reconcile conda environments into portable manifests
#[derive(Parser)]
#[command(name = "envrecon")]
#[command(about = "Reconcile conda environments into portable, minimal environment manifests")]
#[command(version, long_version = LONG_VERSION)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Working directory (defaults to current directory)
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<String>,

    /// Configuration file (defaults to ./envrecon.yml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate manifests for every environment found under the search paths
    Generate {
        /// Directories to search for conda environments
        #[arg(required = true)]
        search_paths: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// conda executable (defaults to $CONDA_EXE, then conda on PATH)
        #[arg(long, env = "CONDA_EXE")]
        conda_exe: Option<PathBuf>,

        /// Keep the environment's own name in the manifests
        #[arg(long)]
        use_original_name: bool,

        /// Maximum number of history entries for a clean history
        #[arg(long)]
        threshold: Option<usize>,

        /// Timeout for each conda invocation, in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Do not write the CSV summary
        #[arg(long)]
        no_summary: bool,
    },

    /// Check the quality of a saved `conda env export --from-history` file
    Classify {
        /// Path to the history export
        history_file: PathBuf,

        /// Maximum number of history entries for a clean history
        #[arg(long)]
        threshold: Option<usize>,
    },

    /// Audit installed packages for channel compliance
    Audit {
        /// Directories to scan (defaults to /home, /opt and /usr/local)
        scan_roots: Vec<PathBuf>,

        /// Directory for the report files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// conda executable (defaults to $CONDA_EXE, then conda on PATH)
        #[arg(long, env = "CONDA_EXE")]
        conda_exe: Option<PathBuf>,
    },

    /// Collect package names from concatenated environment files, grouped by python version
    Collect {
        /// Concatenated environment YAML file
        input: PathBuf,

        /// Prefix of the per-version output files
        #[arg(short, long, default_value = DEFAULT_COLLECT_PREFIX)]
        output_prefix: String,
    },
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
}

impl Default for CliApp {
    fn default() -> Self {
        Self::new()
    }
}

impl CliApp {
    pub fn new() -> Self {
        Self { cli: Cli::parse() }
    }

    pub fn from_cli(cli: Cli) -> Self {
        Self { cli }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        colored::control::set_override(!self.cli.no_color);

        if let Some(ref dir) = self.cli.directory {
            env::set_current_dir(dir)?;
        }

        match self.handle_command().await {
            Ok(0) => Ok(()),
            Ok(code) => exit(code),
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                exit(1);
            }
        }
    }

    async fn handle_command(&self) -> anyhow::Result<i32> {
        let display = DisplayHelper::auto(self.cli.no_color);

        match &self.cli.command {
            Commands::Generate {
                search_paths,
                output_dir,
                conda_exe,
                use_original_name,
                threshold,
                timeout,
                no_summary,
            } => {
                let mut settings = self.load_settings()?;
                if let Some(threshold) = threshold {
                    settings = settings.with_history_threshold(*threshold);
                }
                if let Some(timeout) = timeout {
                    settings = settings.with_command_timeout_secs(*timeout);
                }

                let log_file = init_logging(
                    &LoggingOptions::new(self.cli.verbose).with_log_dir(output_dir.clone()),
                )?;
                let context = RunContext::new(settings, self.conda_exe(conda_exe.as_deref())?)
                    .with_original_names(*use_original_name)
                    .with_log_file(log_file);

                let config = BatchGenerateConfig::new(search_paths.clone(), output_dir.clone())
                    .with_summary(!no_summary);
                GenerateCommand::new(config, context, self.cli.verbose)
                    .execute(&display)
                    .await
            }

            Commands::Classify {
                history_file,
                threshold,
            } => {
                init_logging(&LoggingOptions::new(self.cli.verbose))?;
                let settings = self.load_settings()?;
                let classifier = HistoryClassifier::new(
                    threshold.unwrap_or(settings.history_threshold),
                    settings.ignore_set,
                );
                ClassifyCommand::new(history_file.clone(), classifier).execute(&display)
            }

            Commands::Audit {
                scan_roots,
                output_dir,
                conda_exe,
            } => {
                init_logging(&LoggingOptions::new(self.cli.verbose))?;
                let settings = self.load_settings()?;
                let context = RunContext::new(settings, self.conda_exe(conda_exe.as_deref())?);

                let scan_roots = if scan_roots.is_empty() {
                    commands::DEFAULT_SCAN_ROOTS.iter().map(PathBuf::from).collect()
                } else {
                    scan_roots.clone()
                };
                let config = ChannelAuditConfig {
                    scan_roots,
                    output_dir: output_dir.clone(),
                    host: host_name(),
                };
                AuditCommand::new(config, context).execute(&display).await
            }

            Commands::Collect {
                input,
                output_prefix,
            } => {
                init_logging(&LoggingOptions::new(self.cli.verbose))?;
                CollectCommand::new(input.clone(), output_prefix.clone()).execute(&display)
            }
        }
    }

    fn load_settings(&self) -> Result<ReconSettings> {
        let config = ConfigStore::new()
            .load(self.cli.config.as_deref())
            .map_err(EnvReconError::from)?;
        Ok(config.into_settings())
    }

    fn conda_exe(&self, requested: Option<&Path>) -> Result<PathBuf> {
        let exe = resolve_executable(requested).map_err(EnvReconError::from)?;
        tracing::debug!("Using conda executable {}", exe.display());
        Ok(exe)
    }
}
