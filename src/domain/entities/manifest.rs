use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::domain::value_objects::package_spec::PackageSpec;

/// A conda-level entry of a reconciled manifest.
#[derive(Debug, Clone, PartialEq)]
pub enum CondaEntry {
    Spec(PackageSpec),
    /// Unrecognized history entry kept verbatim.
    Passthrough(Value),
}

/// Reconciled dependency list of one environment.
///
/// Conda entries keep their order; the runtime spec, when known, is always
/// the first entry. Pip requirements live in their own trailing group and
/// are never interleaved with conda entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DependencyManifest {
    entries: Vec<CondaEntry>,
    pip: Option<Vec<String>>,
}

impl DependencyManifest {
    /// Start a manifest, placing the runtime spec first when present.
    pub fn with_runtime(runtime: Option<PackageSpec>) -> Self {
        Self {
            entries: runtime.into_iter().map(CondaEntry::Spec).collect(),
            pip: None,
        }
    }

    pub fn push_spec(&mut self, spec: PackageSpec) {
        self.entries.push(CondaEntry::Spec(spec));
    }

    pub fn push_passthrough(&mut self, value: Value) {
        self.entries.push(CondaEntry::Passthrough(value));
    }

    pub fn set_pip(&mut self, pip: Option<Vec<String>>) {
        self.pip = pip.filter(|p| !p.is_empty());
    }

    pub fn entries(&self) -> &[CondaEntry] {
        &self.entries
    }

    pub fn pip(&self) -> Option<&[String]> {
        self.pip.as_deref()
    }

    pub fn runtime(&self) -> Option<&PackageSpec> {
        match self.entries.first() {
            Some(CondaEntry::Spec(spec)) if spec.is_runtime() => Some(spec),
            _ => None,
        }
    }

    pub fn specs(&self) -> impl Iterator<Item = &PackageSpec> {
        self.entries.iter().filter_map(|e| match e {
            CondaEntry::Spec(spec) => Some(spec),
            CondaEntry::Passthrough(_) => None,
        })
    }

    /// Spec strings in order, without the pip group.
    pub fn spec_strings(&self) -> Vec<String> {
        self.specs().map(|s| s.to_string()).collect()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.specs().any(|s| s.has_name(name))
    }

    pub fn to_environment_file(
        &self,
        name: impl Into<String>,
        channels: Vec<String>,
    ) -> EnvironmentFile {
        let mut dependencies: Vec<ManifestDependency> = self
            .entries
            .iter()
            .map(|entry| match entry {
                CondaEntry::Spec(spec) => ManifestDependency::Spec(spec.to_string()),
                CondaEntry::Passthrough(value) => ManifestDependency::Other(value.clone()),
            })
            .collect();

        if let Some(pip) = &self.pip {
            dependencies.push(ManifestDependency::Pip { pip: pip.clone() });
        }

        EnvironmentFile {
            name: name.into(),
            channels,
            dependencies,
        }
    }
}

/// Serialized form of a dependency in an environment file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestDependency {
    Spec(String),
    Pip { pip: Vec<String> },
    Other(Value),
}

/// An `environment.yml` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentFile {
    pub name: String,
    pub channels: Vec<String>,
    pub dependencies: Vec<ManifestDependency>,
}

impl EnvironmentFile {
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}
