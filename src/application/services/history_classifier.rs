use std::sync::LazyLock;

use regex::Regex;

use crate::common::context::{ReconSettings, DEFAULT_HISTORY_THRESHOLD};
use crate::domain::entities::export::{DependencyEntry, EnvironmentExport};
use crate::domain::value_objects::{history_verdict::HistoryVerdict, ignore_set::IgnoreSet};

/// Build hash (`=h3c5361c`), trailing build number (`=py39_0`) or `=main`.
static BUILD_STRING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"=\w*h[0-9a-f]{7,}|=\w+_\d+$|=main$").expect("build string pattern is valid")
});

/// Decides whether a history export is trustworthy as the list of packages
/// the user actually asked for.
#[derive(Debug, Clone)]
pub struct HistoryClassifier {
    threshold: usize,
    ignore_set: IgnoreSet,
}

impl Default for HistoryClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_THRESHOLD, IgnoreSet::default())
    }
}

impl HistoryClassifier {
    pub fn new(threshold: usize, ignore_set: IgnoreSet) -> Self {
        Self {
            threshold,
            ignore_set,
        }
    }

    pub fn from_settings(settings: &ReconSettings) -> Self {
        Self::new(settings.history_threshold, settings.ignore_set.clone())
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Classify a history export. `None` stands for a missing history.
    pub fn classify(&self, history: Option<&EnvironmentExport>) -> HistoryVerdict {
        let Some(history) = history else {
            return HistoryVerdict::InvalidFormat {
                detail: "no history".to_string(),
            };
        };

        let entries = match history.entries() {
            Ok(entries) => entries,
            Err(shape) => {
                return HistoryVerdict::InvalidFormat {
                    detail: shape.to_string(),
                }
            }
        };

        if entries.len() > self.threshold {
            return HistoryVerdict::TooManyDependencies {
                count: entries.len(),
                threshold: self.threshold,
            };
        }

        for entry in entries {
            let DependencyEntry::Spec(spec) = entry else {
                continue;
            };

            if BUILD_STRING_RE.is_match(spec.as_str()) {
                return HistoryVerdict::BuildString {
                    entry: spec.to_string(),
                };
            }

            if self.ignore_set.contains(spec.name()) {
                return HistoryVerdict::IgnoredPackage {
                    name: spec.name().to_string(),
                };
            }
        }

        HistoryVerdict::Clean
    }
}

/// True when the spec string carries a build tag.
pub fn has_build_string(spec: &str) -> bool {
    BUILD_STRING_RE.is_match(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::package_spec::PackageSpec;

    fn history(specs: &[&str]) -> EnvironmentExport {
        EnvironmentExport::from_entries(
            specs
                .iter()
                .map(|s| DependencyEntry::Spec(PackageSpec::parse(*s)))
                .collect(),
        )
    }

    #[test]
    fn test_clean_history() {
        let classifier = HistoryClassifier::default();
        let verdict = classifier.classify(Some(&history(&["python=3.10", "numpy=1.24"])));
        assert_eq!(verdict, HistoryVerdict::Clean);
        assert_eq!(verdict.reason(), "clean");
    }

    #[test]
    fn test_missing_history_is_invalid() {
        let verdict = HistoryClassifier::default().classify(None);
        assert!(matches!(verdict, HistoryVerdict::InvalidFormat { .. }));
    }

    #[test]
    fn test_count_over_threshold() {
        let names: Vec<String> = (0..60).map(|i| format!("pkg{i}=1.0")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();

        let verdict = HistoryClassifier::default().classify(Some(&history(&refs)));
        assert_eq!(
            verdict,
            HistoryVerdict::TooManyDependencies {
                count: 60,
                threshold: 50
            }
        );
    }

    #[test]
    fn test_count_at_threshold_is_allowed() {
        let names: Vec<String> = (0..50).map(|i| format!("pkg{i}=1.0")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();

        assert!(HistoryClassifier::default()
            .classify(Some(&history(&refs)))
            .is_clean());
    }

    #[test]
    fn test_build_string_names_entry() {
        let verdict = HistoryClassifier::default()
            .classify(Some(&history(&["python=3.10", "numpy=1.24.0=h3c5361c_0"])));
        assert_eq!(
            verdict,
            HistoryVerdict::BuildString {
                entry: "numpy=1.24.0=h3c5361c_0".to_string()
            }
        );
        assert!(verdict.reason().contains("numpy=1.24.0=h3c5361c_0"));
    }

    #[test]
    fn test_build_string_patterns() {
        assert!(has_build_string("openssl=3.1.0=hd590300_0"));
        assert!(has_build_string("scipy=1.11=py311_0"));
        assert!(has_build_string("tqdm=main"));
        assert!(!has_build_string("python=3.10"));
        assert!(!has_build_string("numpy>=1.24"));
    }

    #[test]
    fn test_ignored_package_pollutes_history() {
        let verdict =
            HistoryClassifier::default().classify(Some(&history(&["python=3.10", "OpenSSL"])));
        assert_eq!(
            verdict,
            HistoryVerdict::IgnoredPackage {
                name: "OpenSSL".to_string()
            }
        );
    }

    #[test]
    fn test_custom_threshold_and_ignore_set() {
        let classifier = HistoryClassifier::new(1, IgnoreSet::empty());
        assert!(!classifier
            .classify(Some(&history(&["a", "b"])))
            .is_clean());
        assert!(classifier.classify(Some(&history(&["openssl"]))).is_clean());
    }
}
