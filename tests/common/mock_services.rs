//! Mock services for testing
//!
//! A scripted [`CommandRunner`] that answers conda invocations from a table
//! instead of spawning processes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use envrecon::infrastructure::process::{CommandExecutorError, CommandRunner};

/// Scripted reply for one invocation
#[derive(Debug, Clone)]
enum Reply {
    Output(String),
    Failure { exit_code: i32, stderr: String },
    Timeout,
}

/// Mock conda runner keyed by environment path and arguments
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    /// Call history for verification
    call_history: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(env_path: Option<&Path>, args: &[&str]) -> String {
        match env_path {
            Some(path) => format!("{} :: {}", path.display(), args.join(" ")),
            None => format!("- :: {}", args.join(" ")),
        }
    }

    /// Reply with `output` to `args` run against `env_path`
    pub fn respond(&self, env_path: Option<&Path>, args: &[&str], output: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .insert(Self::key(env_path, args), Reply::Output(output.to_string()));
        self
    }

    /// Fail `args` run against `env_path` with a non-zero exit
    pub fn fail(&self, env_path: Option<&Path>, args: &[&str], stderr: &str) -> &Self {
        self.replies.lock().unwrap().insert(
            Self::key(env_path, args),
            Reply::Failure {
                exit_code: 1,
                stderr: stderr.to_string(),
            },
        );
        self
    }

    /// Make `args` run against `env_path` time out
    pub fn time_out(&self, env_path: Option<&Path>, args: &[&str]) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .insert(Self::key(env_path, args), Reply::Timeout);
        self
    }

    /// Get call history for verification
    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }

    pub fn was_called(&self, env_path: Option<&Path>, args: &[&str]) -> bool {
        let key = Self::key(env_path, args);
        self.get_call_history().iter().any(|call| *call == key)
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        executable: &Path,
        args: &[&str],
        env_path: Option<&Path>,
    ) -> Result<String, CommandExecutorError> {
        let key = Self::key(env_path, args);
        self.call_history.lock().unwrap().push(key.clone());

        let command = format!("{} {}", executable.display(), args.join(" "));
        let reply = self.replies.lock().unwrap().get(&key).cloned();
        match reply {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::Failure { exit_code, stderr }) => Err(CommandExecutorError::NonZeroExit {
                command,
                exit_code: Some(exit_code),
                stderr,
            }),
            Some(Reply::Timeout) => Err(CommandExecutorError::Timeout {
                command,
                timeout_seconds: 1,
            }),
            None => Err(CommandExecutorError::NonZeroExit {
                command,
                exit_code: Some(127),
                stderr: "unscripted command".to_string(),
            }),
        }
    }
}
