pub mod environment;
pub mod export;
pub mod installed_package;
pub mod manifest;

pub use environment::CondaEnvironment;
pub use export::{DependencyEntry, DependencySection, EnvironmentExport, ExportShapeError, PipRequirements};
pub use installed_package::InstalledPackage;
pub use manifest::{CondaEntry, DependencyManifest, EnvironmentFile, ManifestDependency};
