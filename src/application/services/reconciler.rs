use thiserror::Error;

use crate::domain::entities::export::{DependencyEntry, EnvironmentExport};
use crate::domain::entities::manifest::DependencyManifest;
use crate::domain::value_objects::{
    ignore_set::IgnoreSet,
    package_spec::{PackageSpec, INSTALLER_TRIO},
    reconcile_method::ReconcileMethod,
};

/// Fallback source had no package lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("flat package listing is empty")]
pub struct EmptyListingError;

/// A reconciled manifest together with what it took to build it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub manifest: DependencyManifest,
    pub method: ReconcileMethod,
    pub kept: usize,
    pub filtered: usize,
    /// Names dropped because they are in the ignore set
    pub filtered_packages: Vec<String>,
    pub warnings: Vec<String>,
}

/// Builds manifests from either source. Pure: no I/O, no logging.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    ignore_set: IgnoreSet,
}

impl Reconciler {
    pub fn new(ignore_set: IgnoreSet) -> Self {
        Self { ignore_set }
    }

    /// Build from a history export already classified as clean.
    pub fn build_from_history(
        &self,
        history: &EnvironmentExport,
        pip: Option<Vec<String>>,
    ) -> ReconcileOutcome {
        let entries = history.entries().unwrap_or(&[]);
        let mut warnings = Vec::new();

        let runtime = history.specs().find(|s| s.is_runtime()).cloned();
        if runtime.is_none() {
            warnings.push("no python spec found in history".to_string());
        }

        let mut manifest = DependencyManifest::with_runtime(runtime);
        push_installer_trio(&mut manifest, history.specs());

        let mut kept = 0;
        for entry in entries {
            match entry {
                DependencyEntry::Spec(spec) if spec.is_reserved() => {}
                DependencyEntry::Spec(spec) => {
                    manifest.push_spec(spec.clone());
                    kept += 1;
                }
                DependencyEntry::Pip(_) => {}
                DependencyEntry::Unrecognized(value) => {
                    warnings.push(format!(
                        "passing through unrecognized history entry: {}",
                        describe(value)
                    ));
                    manifest.push_passthrough(value.clone());
                }
            }
        }

        manifest.set_pip(pip);

        ReconcileOutcome {
            manifest,
            method: ReconcileMethod::History,
            kept,
            filtered: 0,
            filtered_packages: Vec::new(),
            warnings,
        }
    }

    /// Build from the flat package listing, dropping ignore-set members.
    pub fn build_from_listing(
        &self,
        listing: &[PackageSpec],
        pip: Option<Vec<String>>,
    ) -> Result<ReconcileOutcome, EmptyListingError> {
        if listing.is_empty() {
            return Err(EmptyListingError);
        }

        let mut warnings = Vec::new();
        let runtime = listing.iter().find(|s| s.is_runtime()).cloned();
        if runtime.is_none() {
            warnings.push("no python spec found in package listing".to_string());
        }

        let mut manifest = DependencyManifest::with_runtime(runtime);
        push_installer_trio(&mut manifest, listing.iter());

        let mut kept = 0;
        let mut filtered_packages = Vec::new();
        for spec in listing {
            if spec.is_reserved() {
                continue;
            }
            if self.ignore_set.contains(spec.name()) {
                filtered_packages.push(spec.name().to_string());
                continue;
            }
            manifest.push_spec(spec.clone());
            kept += 1;
        }

        manifest.set_pip(pip);

        Ok(ReconcileOutcome {
            manifest,
            method: ReconcileMethod::Fallback,
            kept,
            filtered: filtered_packages.len(),
            filtered_packages,
            warnings,
        })
    }
}

/// Append pip, setuptools and wheel once each, reusing the source's entry
/// when it names one.
fn push_installer_trio<'a>(
    manifest: &mut DependencyManifest,
    source: impl Iterator<Item = &'a PackageSpec> + Clone,
) {
    for name in INSTALLER_TRIO {
        let spec = source
            .clone()
            .find(|s| s.has_name(name))
            .cloned()
            .unwrap_or_else(|| PackageSpec::bare(name));
        manifest.push_spec(spec);
    }
}

fn describe(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().replace('\n', " "))
        .unwrap_or_else(|_| format!("{value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::export_parser::{parse_environment_export, parse_flat_listing};
    use crate::domain::entities::manifest::CondaEntry;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_history_path_orders_runtime_then_trio() {
        let history =
            parse_environment_export("dependencies:\n  - python=3.10\n  - numpy=1.24\n").unwrap();

        let outcome = Reconciler::default().build_from_history(&history, None);

        assert_eq!(
            outcome.manifest.spec_strings(),
            vec!["python=3.10", "pip", "setuptools", "wheel", "numpy=1.24"]
        );
        assert_eq!(outcome.method, ReconcileMethod::History);
        assert_eq!(outcome.kept, 1);
        assert_eq!(outcome.filtered, 0);
        assert!(outcome.warnings.is_empty());
        assert!(outcome.manifest.pip().is_none());
    }

    #[test]
    fn test_history_path_places_any_python_spelling_first() {
        for runtime in ["Python=3.10", "python 3.10"] {
            let history = parse_environment_export(&format!(
                "dependencies:\n  - {runtime}\n  - numpy=1.24\n"
            ))
            .unwrap();

            let outcome = Reconciler::default().build_from_history(&history, None);

            assert_eq!(
                outcome.manifest.spec_strings(),
                vec![runtime, "pip", "setuptools", "wheel", "numpy=1.24"]
            );
            assert!(outcome.warnings.is_empty());
        }
    }

    #[test]
    fn test_history_path_keeps_existing_trio_entries_once() {
        let history = parse_environment_export(
            "dependencies:\n  - numpy\n  - Pip=23.1\n  - python>=3.9\n  - pip\n",
        )
        .unwrap();

        let outcome = Reconciler::new(IgnoreSet::empty()).build_from_history(&history, None);

        assert_eq!(
            outcome.manifest.spec_strings(),
            vec!["python>=3.9", "Pip=23.1", "setuptools", "wheel", "numpy"]
        );
    }

    #[test]
    fn test_history_path_without_runtime_warns() {
        let history = parse_environment_export("dependencies:\n  - numpy\n").unwrap();
        let outcome = Reconciler::default().build_from_history(&history, None);

        assert!(outcome.manifest.runtime().is_none());
        assert_eq!(
            outcome.manifest.spec_strings(),
            vec!["pip", "setuptools", "wheel", "numpy"]
        );
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_history_path_drops_nested_pip_and_passes_unknown_entries() {
        let history = parse_environment_export(
            "dependencies:\n  - python=3.11\n  - 7\n  - pip:\n      - stale\n",
        )
        .unwrap();

        let outcome = Reconciler::default()
            .build_from_history(&history, Some(vec!["requests".to_string()]));

        let entries = outcome.manifest.entries();
        assert_eq!(entries.len(), 5);
        assert_eq!(
            entries[4],
            CondaEntry::Passthrough(serde_yaml::from_str("7").unwrap())
        );
        assert_eq!(outcome.manifest.pip(), Some(&["requests".to_string()][..]));
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_fallback_path_filters_ignore_set() {
        let listing = parse_flat_listing("python=3.9=0\nnumpy=1.24=py39h1234567_0\nsix=1.16=0\n");

        let outcome = Reconciler::default()
            .build_from_listing(&listing, None)
            .unwrap();

        assert_eq!(
            outcome.manifest.spec_strings(),
            vec!["python=3.9", "pip", "setuptools", "wheel", "numpy=1.24"]
        );
        assert_eq!(outcome.method, ReconcileMethod::Fallback);
        assert_eq!(outcome.kept, 1);
        assert_eq!(outcome.filtered, 1);
        assert_eq!(outcome.filtered_packages, vec!["six"]);
    }

    #[test]
    fn test_fallback_path_reuses_listed_installer() {
        let listing = parse_flat_listing("pip=23.1=pyhd8ed1ab_0\npython=3.10=h12345678_0\nPIP=1\n");

        let outcome = Reconciler::default()
            .build_from_listing(&listing, None)
            .unwrap();

        assert_eq!(
            outcome.manifest.spec_strings(),
            vec!["python=3.10", "pip=23.1", "setuptools", "wheel"]
        );
        assert_eq!(outcome.kept, 0);
        assert_eq!(outcome.filtered, 0);
    }

    #[test]
    fn test_fallback_path_empty_listing() {
        let listing = parse_flat_listing("# platform: linux-64\n");
        assert_eq!(
            Reconciler::default().build_from_listing(&listing, None),
            Err(EmptyListingError)
        );
    }
}
