use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the runtime-language package placed first in every manifest.
pub const RUNTIME_PACKAGE: &str = "python";

/// Installer, build backend and wheel builder, in manifest order.
pub const INSTALLER_TRIO: [&str; 3] = ["pip", "setuptools", "wheel"];

/// Characters that terminate the package name in a conda match spec.
const NAME_TERMINATORS: &[char] = &['=', '<', '>', '!', '~', ' ', '\t'];

/// A conda-style package spec such as `numpy=1.24` or `python>=3.9`.
///
/// The raw text is kept verbatim so that entries pass through reconciliation
/// unchanged; identity for filtering purposes is the name alone, compared
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PackageSpec {
    raw: String,
    name_len: usize,
}

impl PackageSpec {
    /// Parse a spec string. Never fails; a string without a qualifier is a
    /// bare name.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into().trim().to_string();
        let name_len = raw.find(NAME_TERMINATORS).unwrap_or(raw.len());
        Self { raw, name_len }
    }

    /// A spec with no version qualifier.
    pub fn bare(name: impl Into<String>) -> Self {
        Self::parse(name)
    }

    /// Build `name=version`, or a bare name when the version is empty.
    pub fn pinned(name: &str, version: &str) -> Self {
        if version.is_empty() {
            Self::bare(name)
        } else {
            Self::parse(format!("{name}={version}"))
        }
    }

    pub fn name(&self) -> &str {
        &self.raw[..self.name_len]
    }

    /// Everything after the name, e.g. `=1.24` or `>=3.9`.
    pub fn qualifier(&self) -> Option<&str> {
        let rest = self.raw[self.name_len..].trim();
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_bare(&self) -> bool {
        self.qualifier().is_none()
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }

    /// True when the name is `python`, whatever the case or qualifier.
    pub fn is_runtime(&self) -> bool {
        self.has_name(RUNTIME_PACKAGE)
    }

    /// True for any of the runtime or installer trio names.
    pub fn is_reserved(&self) -> bool {
        self.has_name(RUNTIME_PACKAGE) || INSTALLER_TRIO.iter().any(|n| self.has_name(n))
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<String> for PackageSpec {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

impl From<&str> for PackageSpec {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<PackageSpec> for String {
    fn from(spec: PackageSpec) -> Self {
        spec.raw
    }
}
