use anyhow::Result;
use std::path::PathBuf;

use crate::application::use_cases::collect_packages::CollectPackagesUseCase;
use crate::common::error::EnvReconError;
use crate::presentation::ui::DisplayHelper;

/// Group package names of concatenated environment files by Python version
pub struct CollectCommand {
    pub input: PathBuf,
    pub output_prefix: String,
}

impl CollectCommand {
    pub fn new(input: PathBuf, output_prefix: String) -> Self {
        Self {
            input,
            output_prefix,
        }
    }

    pub fn execute(&self, display: &DisplayHelper) -> Result<i32> {
        let (collected, written) = CollectPackagesUseCase::new(&self.input, &self.output_prefix)
            .execute()
            .map_err(EnvReconError::from)?;

        if written.is_empty() {
            display.warning("No environment with a python version was found");
            return Ok(0);
        }

        for ((version, names), path) in collected.groups.iter().zip(&written) {
            display.success(&format!(
                "Python {}: {} package(s) -> {}",
                version,
                names.len(),
                display.format_path(&path.display().to_string())
            ));
        }
        if collected.skipped_documents > 0 {
            display.warning(&format!(
                "Skipped {} document(s) without a usable python spec",
                collected.skipped_documents
            ));
        }
        Ok(0)
    }
}
