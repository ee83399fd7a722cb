use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::common::context::DEFAULT_COMMAND_TIMEOUT_SECS;

/// Command executor errors
#[derive(Debug, Error)]
pub enum CommandExecutorError {
    #[error("Executable not found: {executable}")]
    NotFound { executable: String },

    #[error("'{command}' failed with exit code {}: {stderr}", display_code(.exit_code))]
    NonZeroExit {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("'{command}' timed out after {timeout_seconds} seconds")]
    Timeout {
        command: String,
        timeout_seconds: u64,
    },

    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "none (terminated by signal)".to_string())
}

/// Configuration for command execution
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Timeout per invocation in seconds
    pub timeout_seconds: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_COMMAND_TIMEOUT_SECS,
        }
    }
}

impl ExecutionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }
}

/// Runs an external package-manager executable and returns its stdout.
///
/// When `env_path` is given, `-p <env_path>` is appended to the arguments.
/// A successful run may still have written to stderr.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        executable: &Path,
        args: &[&str],
        env_path: Option<&Path>,
    ) -> Result<String, CommandExecutorError>;
}

/// Tokio-backed runner for conda commands.
#[derive(Debug, Clone, Default)]
pub struct CondaCommandExecutor {
    config: ExecutionConfig,
}

impl CondaCommandExecutor {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CommandRunner for CondaCommandExecutor {
    async fn run(
        &self,
        executable: &Path,
        args: &[&str],
        env_path: Option<&Path>,
    ) -> Result<String, CommandExecutorError> {
        let start_time = Instant::now();

        let mut cmd = TokioCommand::new(executable);
        cmd.args(args);
        if let Some(env_path) = env_path {
            cmd.arg("-p").arg(env_path);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let command_line = describe_command(executable, args, env_path);
        tracing::debug!("Running: {}", command_line);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CommandExecutorError::NotFound {
                    executable: executable.display().to_string(),
                }
            } else {
                CommandExecutorError::SpawnFailed {
                    command: command_line.clone(),
                    source: e,
                }
            }
        })?;

        let timeout_duration = Duration::from_secs(self.config.timeout_seconds);
        let output = match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                return Err(CommandExecutorError::Timeout {
                    command: command_line,
                    timeout_seconds: self.config.timeout_seconds,
                })
            }
        };

        tracing::debug!(
            "Finished in {} ms: {}",
            start_time.elapsed().as_millis(),
            command_line
        );

        if !output.status.success() {
            return Err(CommandExecutorError::NonZeroExit {
                command: command_line,
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Human-readable command line, used in errors and logs.
pub fn describe_command(executable: &Path, args: &[&str], env_path: Option<&Path>) -> String {
    let mut parts = vec![executable.display().to_string()];
    parts.extend(args.iter().map(|a| a.to_string()));
    if let Some(env_path) = env_path {
        parts.push("-p".to_string());
        parts.push(env_path.display().to_string());
    }
    parts.join(" ")
}

/// Resolve the conda executable: an explicit path or name, then `CONDA_EXE`,
/// then `conda` on `PATH`.
pub fn resolve_executable(requested: Option<&Path>) -> Result<PathBuf, CommandExecutorError> {
    if let Some(requested) = requested {
        if requested.is_file() {
            return Ok(requested.to_path_buf());
        }
        return which::which(requested).map_err(|_| CommandExecutorError::NotFound {
            executable: requested.display().to_string(),
        });
    }

    if let Some(from_env) = std::env::var_os("CONDA_EXE").map(PathBuf::from) {
        if from_env.is_file() {
            return Ok(from_env);
        }
    }

    which::which("conda").map_err(|_| CommandExecutorError::NotFound {
        executable: "conda".to_string(),
    })
}
