use anyhow::Result;

use crate::application::use_cases::batch_generate::{
    BatchGenerateConfig, BatchGenerateUseCase, BatchResult, EnvironmentStatus,
};
use crate::common::context::RunContext;
use crate::common::error::EnvReconError;
use crate::domain::value_objects::reconcile_method::ReconcileMethod;
use crate::infrastructure::process::{CondaCommandExecutor, ExecutionConfig};
use crate::presentation::ui::DisplayHelper;

/// Reconcile every discovered environment into a manifest
pub struct GenerateCommand {
    pub config: BatchGenerateConfig,
    pub context: RunContext,
    pub verbose: bool,
}

impl GenerateCommand {
    pub fn new(config: BatchGenerateConfig, context: RunContext, verbose: bool) -> Self {
        Self {
            config,
            context,
            verbose,
        }
    }

    pub async fn execute(&self, display: &DisplayHelper) -> Result<i32> {
        if let Some(log_file) = &self.context.log_file {
            display.info(&format!(
                "Logging to {}",
                display.format_path(&log_file.display().to_string())
            ));
        }

        let use_case = BatchGenerateUseCase::new(self.config.clone(), &self.context);
        use_case.prepare().await.map_err(EnvReconError::from)?;
        let environments = use_case.discover();

        if environments.is_empty() {
            display.warning("No conda environments found");
            return Ok(0);
        }
        display.info(&format!(
            "Reconciling {} environment(s) into {}",
            environments.len(),
            display.format_path(&self.config.output_dir.display().to_string())
        ));

        let executor = CondaCommandExecutor::new(
            ExecutionConfig::new().with_timeout(self.context.settings.command_timeout_secs),
        );
        let pb = display.create_progress_bar(environments.len() as u64, "Reconciling");
        let result = use_case
            .run(&executor, environments, |report| {
                pb.set_message(report.environment.name.clone());
                pb.inc(1);
            })
            .await;
        pb.finish_and_clear();

        self.print_result(display, &result);
        Ok(0)
    }

    fn print_result(&self, display: &DisplayHelper, result: &BatchResult) {
        display.print_summary(
            "Processing Summary",
            &[
                ("Total".to_string(), result.total().to_string()),
                ("Succeeded".to_string(), result.succeeded().to_string()),
                ("Failed".to_string(), result.failed().to_string()),
                (
                    "From history".to_string(),
                    result.count_method(ReconcileMethod::History).to_string(),
                ),
                (
                    "From fallback".to_string(),
                    result.count_method(ReconcileMethod::Fallback).to_string(),
                ),
            ],
        );

        if self.verbose {
            let rows: Vec<Vec<String>> = result
                .reports
                .iter()
                .map(|r| {
                    vec![
                        r.environment.name.clone(),
                        display.format_status(
                            &r.status.to_string(),
                            r.status == EnvironmentStatus::Ok,
                        ),
                        r.method
                            .map(|m| display.format_method(m))
                            .unwrap_or_else(|| "N/A".to_string()),
                        r.kept.to_string(),
                        r.filtered.to_string(),
                    ]
                })
                .collect();
            println!();
            display.print_table(&["Environment", "Status", "Method", "Kept", "Filtered"], &rows);
        }

        let failed: Vec<_> = result.failed_reports().collect();
        if !failed.is_empty() {
            display.section_header("Environments with errors");
            for report in failed {
                display.error(&format!(
                    "{} [{}]",
                    report.environment.path.display(),
                    report.status
                ));
                for note in &report.notes {
                    display.print_indented(note, 2);
                }
            }
        }

        if let Some(path) = &result.summary_path {
            display.success(&format!(
                "Summary written to {}",
                display.format_path(&path.display().to_string())
            ));
        }
        if let Some(log_file) = &self.context.log_file {
            display.info(&format!(
                "Full log: {}",
                display.format_path(&log_file.display().to_string())
            ));
        }
    }
}
