use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::application::services::{
    export_parser::parse_environment_export, history_classifier::HistoryClassifier,
};
use crate::common::error::EnvReconError;
use crate::domain::value_objects::history_verdict::HistoryVerdict;
use crate::presentation::ui::DisplayHelper;

/// Exit code when the history is not clean.
pub const NOT_CLEAN_EXIT_CODE: i32 = 2;

/// Check a saved `--from-history` export offline
pub struct ClassifyCommand {
    pub history_file: PathBuf,
    pub classifier: HistoryClassifier,
}

impl ClassifyCommand {
    pub fn new(history_file: PathBuf, classifier: HistoryClassifier) -> Self {
        Self {
            history_file,
            classifier,
        }
    }

    pub fn verdict(&self) -> Result<HistoryVerdict> {
        let content = fs::read_to_string(&self.history_file).map_err(|e| {
            EnvReconError::filesystem_error_with_source(
                "Failed to read history export",
                Some(self.history_file.clone()),
                e,
            )
        })?;

        Ok(match parse_environment_export(&content) {
            Ok(export) => self.classifier.classify(Some(&export)),
            Err(e) => HistoryVerdict::InvalidFormat {
                detail: e.to_string(),
            },
        })
    }

    pub fn execute(&self, display: &DisplayHelper) -> Result<i32> {
        let verdict = self.verdict()?;
        display.print_verdict(&verdict);
        Ok(if verdict.is_clean() {
            0
        } else {
            NOT_CLEAN_EXIT_CODE
        })
    }
}
