use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;
use thiserror::Error;

use crate::domain::entities::export::{
    DependencyEntry, DependencySection, EnvironmentExport, ExportShapeError, PipRequirements,
    PIP_MARKER,
};
use crate::domain::value_objects::package_spec::PackageSpec;

static PIP_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*#.*").expect("comment pattern is valid"));

static PIP_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(==|>=|<=|!=|~=|<|>)\s*[\w.\-+]+.*").expect("version pattern is valid")
});

/// エクスポート解析関連のエラー
#[derive(Debug, Error)]
pub enum ExportParseError {
    #[error("Export is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Pip requirements pulled out of a full export.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipExtraction {
    /// Cleaned names, `None` when there is no pip section or it is empty
    pub packages: Option<Vec<String>>,
    pub warnings: Vec<String>,
}

impl PipExtraction {
    fn skipped(warning: String) -> Self {
        Self {
            packages: None,
            warnings: vec![warning],
        }
    }
}

/// Parse the text of `conda env export` into a typed export.
///
/// Only YAML syntax errors are reported as `Err`; a document with the wrong
/// shape parses into an export whose dependency section is
/// [`DependencySection::Invalid`].
pub fn parse_environment_export(text: &str) -> Result<EnvironmentExport, ExportParseError> {
    let value: Value = serde_yaml::from_str(text)?;
    Ok(export_from_value(value))
}

/// Validate an already-loaded YAML value.
pub fn export_from_value(value: Value) -> EnvironmentExport {
    let mapping = match value {
        Value::Null => return EnvironmentExport::invalid(ExportShapeError::EmptyDocument),
        Value::Mapping(mapping) => mapping,
        other => {
            return EnvironmentExport::invalid(ExportShapeError::NotAMapping {
                found: value_kind(&other).to_string(),
            })
        }
    };

    let name = mapping
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string);

    let channels = mapping
        .get("channels")
        .and_then(Value::as_sequence)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let dependencies = match mapping.get("dependencies") {
        None => DependencySection::Invalid(ExportShapeError::MissingField {
            field: "dependencies".to_string(),
        }),
        Some(Value::Sequence(items)) => {
            DependencySection::Entries(items.iter().map(classify_entry).collect())
        }
        Some(other) => DependencySection::Invalid(ExportShapeError::WrongType {
            field: "dependencies".to_string(),
            expected: "sequence".to_string(),
            found: value_kind(other).to_string(),
        }),
    };

    EnvironmentExport {
        name,
        channels,
        dependencies,
    }
}

fn classify_entry(value: &Value) -> DependencyEntry {
    match value {
        Value::String(text) if !text.trim().is_empty() => {
            DependencyEntry::Spec(PackageSpec::parse(text.as_str()))
        }
        Value::Mapping(mapping) => match mapping.get(PIP_MARKER) {
            Some(Value::Sequence(items)) => {
                DependencyEntry::Pip(PipRequirements::Listed(items.clone()))
            }
            Some(other) => DependencyEntry::Pip(PipRequirements::Malformed(other.clone())),
            None => DependencyEntry::Unrecognized(value.clone()),
        },
        other => DependencyEntry::Unrecognized(other.clone()),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Reduce a pip requirement to its bare package name.
///
/// `requests==2.31.0  # comment` becomes `requests`.
pub fn clean_pip_requirement(requirement: &str) -> String {
    let without_comment = PIP_COMMENT_RE.replace(requirement, "");
    let without_version = PIP_VERSION_RE.replace(&without_comment, "");
    without_version.trim().to_string()
}

/// Pull the nested pip sub-list out of a full export.
pub fn extract_pip_section(export: &EnvironmentExport) -> PipExtraction {
    let requirements = match export.pip_requirements() {
        None => return PipExtraction::default(),
        Some(PipRequirements::Malformed(value)) => {
            return PipExtraction::skipped(format!(
                "pip section is a {} instead of a list; ignored",
                value_kind(value)
            ))
        }
        Some(PipRequirements::Listed(items)) => items,
    };

    let mut warnings = Vec::new();
    let mut packages = Vec::new();

    for item in requirements {
        match item.as_str() {
            Some(text) => {
                let cleaned = clean_pip_requirement(text);
                if !cleaned.is_empty() {
                    packages.push(cleaned);
                }
            }
            None => warnings.push(format!(
                "skipped non-string pip entry ({})",
                value_kind(item)
            )),
        }
    }

    PipExtraction {
        packages: if packages.is_empty() {
            None
        } else {
            Some(packages)
        },
        warnings,
    }
}

/// Best-effort pip extraction from raw export text; a parse failure becomes a
/// warning.
pub fn extract_pip_section_from_text(text: &str) -> PipExtraction {
    match parse_environment_export(text) {
        Ok(export) => extract_pip_section(&export),
        Err(e) => PipExtraction::skipped(format!("full export could not be parsed: {e}")),
    }
}

/// Parse `conda list --export` output into `name=version` specs.
///
/// The build segment is dropped. Blank lines and lines starting with `#` or
/// `@` are ignored.
pub fn parse_flat_listing(text: &str) -> Vec<PackageSpec> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('@'))
        .map(parse_flat_line)
        .collect()
}

fn parse_flat_line(line: &str) -> PackageSpec {
    let parts: Vec<&str> = line.split('=').collect();
    match parts.len() {
        1 => PackageSpec::bare(parts[0]),
        2 => PackageSpec::pinned(parts[0], parts[1]),
        n => PackageSpec::pinned(&parts[..n - 2].join("="), parts[n - 2]),
    }
}
