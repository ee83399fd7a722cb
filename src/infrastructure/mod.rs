/// Infrastructure layer modules
///
/// Concrete implementations for external system interactions:
/// - Process execution (conda invocations with timeouts)
/// - File system operations (discovery, configuration, outputs, reports)
pub mod filesystem;
pub mod process;

pub use filesystem::{ConfigStore, EnvDiscovery, OutputStore};
pub use process::{CommandRunner, CondaCommandExecutor};
