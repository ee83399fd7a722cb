pub mod command_executor;

pub use command_executor::{
    describe_command, resolve_executable, CommandExecutorError, CommandRunner,
    CondaCommandExecutor, ExecutionConfig,
};
