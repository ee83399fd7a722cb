use anyhow::Result;

use crate::application::use_cases::channel_audit::{ChannelAuditConfig, ChannelAuditUseCase};
use crate::common::context::RunContext;
use crate::common::error::EnvReconError;
use crate::infrastructure::process::{CondaCommandExecutor, ExecutionConfig};
use crate::presentation::ui::DisplayHelper;

/// Roots scanned when none are given on the command line.
pub const DEFAULT_SCAN_ROOTS: &[&str] = &["/home", "/opt", "/usr/local"];

/// Channel compliance audit of installed packages
pub struct AuditCommand {
    pub config: ChannelAuditConfig,
    pub context: RunContext,
}

impl AuditCommand {
    pub fn new(config: ChannelAuditConfig, context: RunContext) -> Self {
        Self { config, context }
    }

    pub async fn execute(&self, display: &DisplayHelper) -> Result<i32> {
        display.info(&format!(
            "Scanning {} for conda environments",
            self.config
                .scan_roots
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        let executor = CondaCommandExecutor::new(
            ExecutionConfig::new().with_timeout(self.context.settings.command_timeout_secs),
        );
        let result = ChannelAuditUseCase::new(self.config.clone(), &self.context)
            .execute(&executor)
            .await
            .map_err(EnvReconError::from)?;

        display.print_summary(
            "Audit Summary",
            &[
                ("Environments scanned".to_string(), result.audits.len().to_string()),
                ("Dirty".to_string(), result.dirty_count().to_string()),
                ("Anaconda default violations".to_string(), result.violation_count().to_string()),
                ("Scan errors".to_string(), result.scan_error_count().to_string()),
            ],
        );

        for path in [
            &result.report_paths.detailed_csv,
            &result.report_paths.all_dirty,
            &result.report_paths.violations_only,
        ] {
            display.success(&format!(
                "Wrote {}",
                display.format_path(&path.display().to_string())
            ));
        }

        if result.violation_count() > 0 {
            display.warning("Packages from Anaconda default channels were found");
        }
        Ok(0)
    }
}
