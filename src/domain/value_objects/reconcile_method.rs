use serde::{Deserialize, Serialize};
use std::fmt;

/// Which source a manifest was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileMethod {
    /// The `--from-history` export passed the quality check.
    History,
    /// Filtered `conda list --export` listing.
    Fallback,
}

impl ReconcileMethod {
    /// Prefix applied to the environment name in generated manifests.
    pub fn name_prefix(&self) -> &'static str {
        match self {
            ReconcileMethod::History => "cf_hist_",
            ReconcileMethod::Fallback => "cf_filt_",
        }
    }

    /// Label used in the batch summary.
    pub fn label(&self) -> &'static str {
        match self {
            ReconcileMethod::History => "History",
            ReconcileMethod::Fallback => "Fallback",
        }
    }
}

impl fmt::Display for ReconcileMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileMethod::History => write!(f, "history"),
            ReconcileMethod::Fallback => write!(f, "fallback"),
        }
    }
}
