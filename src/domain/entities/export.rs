use serde_yaml::Value;
use thiserror::Error;

use crate::domain::value_objects::package_spec::PackageSpec;

/// Key of the nested pip sub-list inside `dependencies`.
pub const PIP_MARKER: &str = "pip";

/// Which required part of an export document is missing or mistyped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportShapeError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("document is not a mapping (found {found})")]
    NotAMapping { found: String },

    #[error("missing field '{field}'")]
    MissingField { field: String },

    #[error("field '{field}' must be a {expected} (found {found})")]
    WrongType {
        field: String,
        expected: String,
        found: String,
    },
}

/// Contents of the nested `{pip: [...]}` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum PipRequirements {
    /// The value is a sequence; items are kept raw so that non-string
    /// entries can be reported individually.
    Listed(Vec<Value>),
    /// `pip` key present but the value is not a sequence.
    Malformed(Value),
}

/// One element of an export's `dependencies` sequence, classified once at
/// the parse boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum DependencyEntry {
    Spec(PackageSpec),
    Pip(PipRequirements),
    /// Anything else: numbers, nulls, mappings without a `pip` key.
    Unrecognized(Value),
}

impl DependencyEntry {
    pub fn as_spec(&self) -> Option<&PackageSpec> {
        match self {
            DependencyEntry::Spec(spec) => Some(spec),
            _ => None,
        }
    }
}

/// Shape of the `dependencies` field.
#[derive(Debug, Clone, PartialEq)]
pub enum DependencySection {
    Entries(Vec<DependencyEntry>),
    Invalid(ExportShapeError),
}

/// A parsed `conda env export` document.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentExport {
    pub name: Option<String>,
    pub channels: Vec<String>,
    pub dependencies: DependencySection,
}

impl EnvironmentExport {
    /// An export whose required shape could not be established.
    pub fn invalid(error: ExportShapeError) -> Self {
        Self {
            name: None,
            channels: Vec::new(),
            dependencies: DependencySection::Invalid(error),
        }
    }

    pub fn from_entries(entries: Vec<DependencyEntry>) -> Self {
        Self {
            name: None,
            channels: Vec::new(),
            dependencies: DependencySection::Entries(entries),
        }
    }

    pub fn entries(&self) -> Result<&[DependencyEntry], &ExportShapeError> {
        match &self.dependencies {
            DependencySection::Entries(entries) => Ok(entries),
            DependencySection::Invalid(error) => Err(error),
        }
    }

    /// First nested pip entry, if any.
    pub fn pip_requirements(&self) -> Option<&PipRequirements> {
        self.entries().ok()?.iter().find_map(|entry| match entry {
            DependencyEntry::Pip(pip) => Some(pip),
            _ => None,
        })
    }

    pub fn specs(&self) -> impl Iterator<Item = &PackageSpec> + Clone {
        self.entries()
            .unwrap_or(&[])
            .iter()
            .filter_map(DependencyEntry::as_spec)
    }
}
