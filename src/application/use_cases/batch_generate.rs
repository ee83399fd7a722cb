use chrono::{DateTime, Local};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::Instrument;

use crate::application::use_cases::reconcile_environment::ReconcileEnvironmentUseCase;
use crate::common::context::RunContext;
use crate::domain::entities::environment::{CondaEnvironment, UNKNOWN};
use crate::domain::value_objects::reconcile_method::ReconcileMethod;
use crate::infrastructure::filesystem::{
    env_discovery::{DiscoveryMode, EnvDiscovery},
    output_store::{OutputLayout, OutputStore, OutputStoreError},
    summary_writer::{summary_file_name, write_summary, SummaryRow},
};
use crate::infrastructure::process::CommandRunner;

static CONDA_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"conda\s+([\d.]+)").expect("conda version pattern is valid"));

/// バッチ生成関連のエラー
#[derive(Debug, Error)]
pub enum BatchGenerateError {
    #[error("Cannot create output directory {}: {source}", .path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: OutputStoreError,
    },
}

/// バッチ生成の設定
#[derive(Debug, Clone)]
pub struct BatchGenerateConfig {
    /// 環境を探索するルートディレクトリ
    pub search_paths: Vec<PathBuf>,

    /// 出力先ディレクトリ
    pub output_dir: PathBuf,

    /// CSVサマリーを書き出すか
    pub write_summary: bool,
}

impl BatchGenerateConfig {
    pub fn new(search_paths: Vec<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            search_paths,
            output_dir: output_dir.into(),
            write_summary: true,
        }
    }

    pub fn with_summary(mut self, write_summary: bool) -> Self {
        self.write_summary = write_summary;
        self
    }
}

/// 環境ごとの最終ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentStatus {
    /// マニフェストとアーカイブをすべて書き込めた
    Ok,
    /// コマンドまたは解析の失敗でマニフェストなし
    Error,
    /// マニフェストは計算できたが書き込みに失敗
    WriteFailed,
}

impl fmt::Display for EnvironmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentStatus::Ok => write!(f, "OK"),
            EnvironmentStatus::Error => write!(f, "ERROR"),
            EnvironmentStatus::WriteFailed => write!(f, "WRITE_FAILED"),
        }
    }
}

/// 単一環境の処理結果
#[derive(Debug, Clone)]
pub struct EnvironmentReport {
    pub environment: CondaEnvironment,
    pub current_conda_version: String,
    pub status: EnvironmentStatus,
    pub method: Option<ReconcileMethod>,
    pub kept: usize,
    pub filtered: usize,
    pub filtered_packages: Vec<String>,
    pub manifest_path: Option<PathBuf>,
    pub notes: Vec<String>,
}

impl EnvironmentReport {
    fn failed(environment: CondaEnvironment, current_conda_version: String, error: String) -> Self {
        Self {
            environment,
            current_conda_version,
            status: EnvironmentStatus::Error,
            method: None,
            kept: 0,
            filtered: 0,
            filtered_packages: Vec::new(),
            manifest_path: None,
            notes: vec![error],
        }
    }

    pub fn to_summary_row(&self) -> SummaryRow {
        SummaryRow {
            env_name: self.environment.name.clone(),
            env_path: self.environment.path.display().to_string(),
            last_modified: self.environment.last_modified_label(),
            creation_conda_version: self.environment.creation_conda_version.clone(),
            current_conda_version: self.current_conda_version.clone(),
            status: self.status.to_string(),
            method: self
                .method
                .map(|m| m.label().to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            kept: self.kept,
            filtered: self.filtered,
            notes: self.notes.join("; "),
            filtered_list: self.filtered_packages.join(", "),
        }
    }
}

/// バッチ全体の結果
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub started: DateTime<Local>,
    pub reports: Vec<EnvironmentReport>,
    pub summary_path: Option<PathBuf>,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count_status(EnvironmentStatus::Ok)
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn count_method(&self, method: ReconcileMethod) -> usize {
        self.reports
            .iter()
            .filter(|r| r.method == Some(method))
            .count()
    }

    pub fn failed_reports(&self) -> impl Iterator<Item = &EnvironmentReport> {
        self.reports
            .iter()
            .filter(|r| r.status != EnvironmentStatus::Ok)
    }

    fn count_status(&self, status: EnvironmentStatus) -> usize {
        self.reports.iter().filter(|r| r.status == status).count()
    }
}

/// 探索した全環境を順番に処理するユースケース
pub struct BatchGenerateUseCase<'a> {
    config: BatchGenerateConfig,
    context: &'a RunContext,
    store: OutputStore,
}

impl<'a> BatchGenerateUseCase<'a> {
    pub fn new(config: BatchGenerateConfig, context: &'a RunContext) -> Self {
        let store = OutputStore::new(OutputLayout::new(&config.output_dir));
        Self {
            config,
            context,
            store,
        }
    }

    /// Create output directories. Fatal when it fails.
    pub async fn prepare(&self) -> Result<(), BatchGenerateError> {
        self.store
            .ensure_directories()
            .await
            .map_err(|source| BatchGenerateError::OutputDirectory {
                path: self.config.output_dir.clone(),
                source,
            })
    }

    pub fn discover(&self) -> Vec<CondaEnvironment> {
        let discovery = EnvDiscovery::new(
            self.context.settings.skip_dirs.clone(),
            DiscoveryMode::Reconcilable,
        );
        discovery.discover(&self.config.search_paths)
    }

    /// Prepare, discover and process everything.
    pub async fn execute(&self, runner: &dyn CommandRunner) -> Result<BatchResult, BatchGenerateError> {
        self.prepare().await?;
        let environments = self.discover();
        Ok(self.run(runner, environments, |_| {}).await)
    }

    /// Process environments one at a time. A failing environment never stops
    /// the batch; `on_report` is called after each one.
    pub async fn run<F>(
        &self,
        runner: &dyn CommandRunner,
        environments: Vec<CondaEnvironment>,
        mut on_report: F,
    ) -> BatchResult
    where
        F: FnMut(&EnvironmentReport),
    {
        let started = Local::now();
        let use_case = ReconcileEnvironmentUseCase::new(self.context, runner, &self.store);
        let mut reports = Vec::with_capacity(environments.len());

        for environment in environments {
            let span = tracing::info_span!("env", path = %environment.path.display());
            let report = self
                .process(&use_case, runner, environment)
                .instrument(span)
                .await;
            on_report(&report);
            reports.push(report);
        }

        let summary_path = if self.config.write_summary {
            self.write_summary(started, &reports)
        } else {
            None
        };

        BatchResult {
            started,
            reports,
            summary_path,
        }
    }

    async fn process(
        &self,
        use_case: &ReconcileEnvironmentUseCase<'_>,
        runner: &dyn CommandRunner,
        environment: CondaEnvironment,
    ) -> EnvironmentReport {
        tracing::info!("Processing environment {}", environment.name);
        let current_version =
            probe_conda_version(runner, &self.context.conda_exe, &environment.path).await;

        match use_case.execute(&environment).await {
            Ok(report) => {
                let status = if report.fully_written() {
                    EnvironmentStatus::Ok
                } else {
                    EnvironmentStatus::WriteFailed
                };
                let mut notes = report.notes;
                notes.extend(report.write_errors);

                EnvironmentReport {
                    environment,
                    current_conda_version: current_version,
                    status,
                    method: Some(report.outcome.method),
                    kept: report.outcome.kept,
                    filtered: report.outcome.filtered,
                    filtered_packages: report.outcome.filtered_packages,
                    manifest_path: report.manifest_path,
                    notes,
                }
            }
            Err(e) => {
                tracing::error!("{}", e);
                EnvironmentReport::failed(environment, current_version, e.to_string())
            }
        }
    }

    fn write_summary(&self, started: DateTime<Local>, reports: &[EnvironmentReport]) -> Option<PathBuf> {
        let path = self.config.output_dir.join(summary_file_name(started));
        let rows: Vec<SummaryRow> = reports.iter().map(EnvironmentReport::to_summary_row).collect();

        match write_summary(&path, &rows) {
            Ok(()) => {
                tracing::info!("Summary written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::error!("Failed to write summary: {}", e);
                None
            }
        }
    }
}

/// `conda --version` as seen from an environment.
///
/// Prefers the conda of the installation the environment belongs to
/// (`<env>/../../bin/conda`). Any failure yields `Unknown`.
pub async fn probe_conda_version(
    runner: &dyn CommandRunner,
    default_exe: &Path,
    env_path: &Path,
) -> String {
    let local_exe = env_path
        .parent()
        .and_then(Path::parent)
        .map(|base| base.join("bin").join("conda"))
        .filter(|p| p.is_file());
    let exe = local_exe.as_deref().unwrap_or(default_exe);

    match runner.run(exe, &["--version"], None).await {
        Ok(output) => parse_conda_version(&output).unwrap_or_else(|| UNKNOWN.to_string()),
        Err(e) => {
            tracing::warn!("Could not determine conda version: {}", e);
            UNKNOWN.to_string()
        }
    }
}

/// Extract `X.Y.Z` from `conda --version` output, ignoring any other lines.
pub fn parse_conda_version(output: &str) -> Option<String> {
    CONDA_VERSION_RE
        .captures(output)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_conda_version() {
        assert_eq!(parse_conda_version("conda 24.1.2\n"), Some("24.1.2".to_string()));
        assert_eq!(parse_conda_version(""), None);
        assert_eq!(parse_conda_version("23.7.4\n"), None);
    }

    #[test]
    fn test_parse_conda_version_skips_stray_lines() {
        assert_eq!(
            parse_conda_version("WARNING: conda is outdated\nconda 24.1.2\n"),
            Some("24.1.2".to_string())
        );
        assert_eq!(parse_conda_version("Segmentation fault\n"), None);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(EnvironmentStatus::Ok.to_string(), "OK");
        assert_eq!(EnvironmentStatus::Error.to_string(), "ERROR");
        assert_eq!(EnvironmentStatus::WriteFailed.to_string(), "WRITE_FAILED");
    }

    #[test]
    fn test_failed_report_summary_row() {
        let report = EnvironmentReport::failed(
            CondaEnvironment::new("/envs/broken"),
            "24.1.2".to_string(),
            "history export failed".to_string(),
        );
        let row = report.to_summary_row();

        assert_eq!(row.status, "ERROR");
        assert_eq!(row.method, "N/A");
        assert_eq!(row.notes, "history export failed");
        assert_eq!(row.last_modified, "Unknown");
    }
}
