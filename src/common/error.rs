use std::path::PathBuf;
use thiserror::Error;

use crate::application::use_cases::batch_generate::BatchGenerateError;
use crate::application::use_cases::channel_audit::ChannelAuditError;
use crate::application::use_cases::collect_packages::CollectPackagesError;
use crate::application::use_cases::reconcile_environment::ReconcileError;
use crate::infrastructure::filesystem::config_store::ConfigStoreError;
use crate::infrastructure::process::CommandExecutorError;

#[derive(Error, Debug)]
pub enum EnvReconError {
    #[error("File system operation failed: {message}")]
    FileSystemError {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Environment '{environment}' failed: {message}")]
    EnvironmentError {
        message: String,
        environment: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Command execution failed: {message}")]
    CommandError {
        message: String,
        command: String,
        exit_code: Option<i32>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    SerializationError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Operation timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl EnvReconError {
    pub fn filesystem_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: Some(source),
        }
    }

    pub fn config_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn environment_error_with_source(
        message: impl Into<String>,
        environment: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::EnvironmentError {
            message: message.into(),
            environment: environment.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn serialization_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn timeout(timeout_secs: u64) -> Self {
        Self::Timeout { timeout_secs }
    }

    pub fn internal_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InternalError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<std::io::Error> for EnvReconError {
    fn from(error: std::io::Error) -> Self {
        Self::filesystem_error_with_source("File system operation failed", None, error)
    }
}

impl From<serde_yaml::Error> for EnvReconError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::serialization_error_with_source("YAML serialization failed", error)
    }
}

impl From<serde_json::Error> for EnvReconError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization_error_with_source("JSON serialization failed", error)
    }
}

impl From<CommandExecutorError> for EnvReconError {
    fn from(error: CommandExecutorError) -> Self {
        if let CommandExecutorError::Timeout {
            timeout_seconds, ..
        } = error
        {
            return Self::timeout(timeout_seconds);
        }

        let (command, exit_code) = match &error {
            CommandExecutorError::NonZeroExit {
                command, exit_code, ..
            } => (command.clone(), *exit_code),
            CommandExecutorError::SpawnFailed { command, .. } => (command.clone(), None),
            _ => (String::new(), None),
        };

        Self::CommandError {
            message: error.to_string(),
            command,
            exit_code,
            source: Some(Box::new(error)),
        }
    }
}

impl From<ConfigStoreError> for EnvReconError {
    fn from(error: ConfigStoreError) -> Self {
        Self::config_error_with_source("Failed to load configuration", error)
    }
}

impl From<ReconcileError> for EnvReconError {
    fn from(error: ReconcileError) -> Self {
        let environment = error.environment().to_string();
        Self::environment_error_with_source("Reconciliation failed", environment, error)
    }
}

impl From<BatchGenerateError> for EnvReconError {
    fn from(error: BatchGenerateError) -> Self {
        let BatchGenerateError::OutputDirectory { path, .. } = &error;
        Self::FileSystemError {
            message: error.to_string(),
            path: Some(path.clone()),
            source: None,
        }
    }
}

impl From<ChannelAuditError> for EnvReconError {
    fn from(error: ChannelAuditError) -> Self {
        Self::internal_error_with_source("Channel audit failed", error)
    }
}

impl From<CollectPackagesError> for EnvReconError {
    fn from(error: CollectPackagesError) -> Self {
        Self::internal_error_with_source("Package collection failed", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filesystem_error_with_path() {
        let path = PathBuf::from("/test/path");
        let error = EnvReconError::filesystem_error_with_source(
            "test message",
            Some(path.clone()),
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        if let EnvReconError::FileSystemError {
            path: Some(p),
            source: Some(_),
            ..
        } = error
        {
            assert_eq!(p, path);
        } else {
            panic!("Expected FileSystemError with path");
        }
    }

    #[test]
    fn test_timeout_from_command_executor() {
        let error: EnvReconError = CommandExecutorError::Timeout {
            command: "conda list --export".to_string(),
            timeout_seconds: 180,
        }
        .into();
        assert_eq!(error.to_string(), "Operation timed out after 180 seconds");
    }

    #[test]
    fn test_non_zero_exit_keeps_exit_code() {
        let error: EnvReconError = CommandExecutorError::NonZeroExit {
            command: "conda env export".to_string(),
            exit_code: Some(1),
            stderr: "EnvironmentLocationNotFound".to_string(),
        }
        .into();
        match error {
            EnvReconError::CommandError {
                command, exit_code, ..
            } => {
                assert_eq!(command, "conda env export");
                assert_eq!(exit_code, Some(1));
            }
            other => panic!("Expected CommandError, got {other:?}"),
        }
    }

    #[test]
    fn test_error_conversion_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: EnvReconError = io_error.into();
        assert!(matches!(error, EnvReconError::FileSystemError { .. }));
    }
}
