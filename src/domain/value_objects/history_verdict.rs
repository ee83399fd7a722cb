use std::fmt;

/// Outcome of the history quality check.
///
/// Not an error: every history gets a verdict, and anything other than
/// [`HistoryVerdict::Clean`] routes the environment to the fallback path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryVerdict {
    Clean,
    /// No history, no `dependencies` key, or `dependencies` is not a sequence.
    InvalidFormat { detail: String },
    TooManyDependencies { count: usize, threshold: usize },
    BuildString { entry: String },
    IgnoredPackage { name: String },
}

impl HistoryVerdict {
    pub fn is_clean(&self) -> bool {
        matches!(self, HistoryVerdict::Clean)
    }

    /// Human-readable reason, "clean" for a clean history.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HistoryVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryVerdict::Clean => write!(f, "clean"),
            HistoryVerdict::InvalidFormat { detail } => write!(f, "invalid format ({detail})"),
            HistoryVerdict::TooManyDependencies { count, threshold } => write!(
                f,
                "dependency count ({count}) exceeds threshold ({threshold})"
            ),
            HistoryVerdict::BuildString { entry } => write!(f, "found build string in '{entry}'"),
            HistoryVerdict::IgnoredPackage { name } => {
                write!(f, "found low-level package '{name}'")
            }
        }
    }
}
