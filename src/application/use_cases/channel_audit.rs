use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::common::context::RunContext;
use crate::domain::entities::installed_package::InstalledPackage;
use crate::domain::value_objects::channel_policy::{ChannelPolicy, ChannelVerdict};
use crate::infrastructure::filesystem::{
    audit_report::{write_audit_reports, AuditFinding, AuditReportPaths, SCAN_ERROR_SUFFIX},
    env_discovery::{DiscoveryMode, EnvDiscovery},
    summary_writer::SummaryWriterError,
};
use crate::infrastructure::process::CommandRunner;

pub const LIST_JSON_ARGS: &[&str] = &["list", "--json"];

/// チャネル監査関連のエラー
#[derive(Debug, Error)]
pub enum ChannelAuditError {
    #[error("Cannot create report directory {}: {source}", .path.display())]
    ReportDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Report write failed: {0}")]
    Report(#[from] SummaryWriterError),
}

/// チャネル監査の設定
#[derive(Debug, Clone)]
pub struct ChannelAuditConfig {
    /// 探索するルートディレクトリ
    pub scan_roots: Vec<PathBuf>,

    /// レポートの出力先
    pub output_dir: PathBuf,

    /// レポートファイル名に使うホスト名
    pub host: String,
}

/// 単一環境の監査結果
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentAudit {
    pub path: String,
    pub packages_checked: usize,
    pub findings: Vec<(InstalledPackage, ChannelVerdict)>,
    pub scan_error: Option<String>,
}

impl EnvironmentAudit {
    pub fn has_violation(&self) -> bool {
        self.findings.iter().any(|(_, v)| v.is_violation())
    }

    pub fn is_dirty(&self) -> bool {
        self.scan_error.is_some() || !self.findings.is_empty()
    }
}

/// 監査全体の結果
#[derive(Debug, Clone)]
pub struct AuditResult {
    pub audits: Vec<EnvironmentAudit>,
    pub report_paths: AuditReportPaths,
}

impl AuditResult {
    pub fn dirty_count(&self) -> usize {
        self.audits.iter().filter(|a| a.is_dirty()).count()
    }

    pub fn violation_count(&self) -> usize {
        self.audits.iter().filter(|a| a.has_violation()).count()
    }

    pub fn scan_error_count(&self) -> usize {
        self.audits.iter().filter(|a| a.scan_error.is_some()).count()
    }
}

/// 各環境のインストール済みパッケージのチャネルを検査するユースケース
pub struct ChannelAuditUseCase<'a> {
    config: ChannelAuditConfig,
    context: &'a RunContext,
}

impl<'a> ChannelAuditUseCase<'a> {
    pub fn new(config: ChannelAuditConfig, context: &'a RunContext) -> Self {
        Self { config, context }
    }

    pub async fn execute(&self, runner: &dyn CommandRunner) -> Result<AuditResult, ChannelAuditError> {
        std::fs::create_dir_all(&self.config.output_dir).map_err(|source| {
            ChannelAuditError::ReportDirectory {
                path: self.config.output_dir.clone(),
                source,
            }
        })?;

        let environments = EnvDiscovery::new(
            self.context.settings.skip_dirs.clone(),
            DiscoveryMode::Any,
        )
        .discover(&self.config.scan_roots);

        let mut audits = Vec::with_capacity(environments.len());
        for env in &environments {
            let audit = self.scan_environment(runner, &env.path).await;
            if let Some(error) = &audit.scan_error {
                tracing::warn!("Scan failed for {}: {}", audit.path, error);
            } else {
                tracing::info!(
                    "Checked {} package(s) in {}: {} finding(s)",
                    audit.packages_checked,
                    audit.path,
                    audit.findings.len()
                );
            }
            audits.push(audit);
        }

        let report_paths = AuditReportPaths::new(&self.config.output_dir, &self.config.host);
        let (findings, dirty, violations) = collect_report_lines(&audits);
        write_audit_reports(&report_paths, &findings, &dirty, &violations)?;

        Ok(AuditResult {
            audits,
            report_paths,
        })
    }

    pub async fn scan_environment(&self, runner: &dyn CommandRunner, path: &Path) -> EnvironmentAudit {
        let display = path.display().to_string();
        let output = match runner
            .run(&self.context.conda_exe, LIST_JSON_ARGS, Some(path))
            .await
        {
            Ok(output) => output,
            Err(e) => return scan_failed(display, e.to_string()),
        };

        match serde_json::from_str::<Vec<InstalledPackage>>(&output) {
            Ok(packages) => audit_packages(display, packages, &self.context.settings.channel_policy),
            Err(e) => scan_failed(display, format!("invalid JSON from conda list: {e}")),
        }
    }
}

/// Classify every package and keep the ones that do not pass.
pub fn audit_packages(
    path: String,
    packages: Vec<InstalledPackage>,
    policy: &ChannelPolicy,
) -> EnvironmentAudit {
    let packages_checked = packages.len();
    let findings = packages
        .into_iter()
        .filter_map(|package| {
            let verdict = policy.classify(package.channel.as_deref());
            (!verdict.is_pass()).then_some((package, verdict))
        })
        .collect();

    EnvironmentAudit {
        path,
        packages_checked,
        findings,
        scan_error: None,
    }
}

fn scan_failed(path: String, error: String) -> EnvironmentAudit {
    EnvironmentAudit {
        path,
        packages_checked: 0,
        findings: Vec::new(),
        scan_error: Some(error),
    }
}

fn collect_report_lines(audits: &[EnvironmentAudit]) -> (Vec<AuditFinding>, Vec<String>, Vec<String>) {
    let mut findings = Vec::new();
    let mut dirty = Vec::new();
    let mut violations = Vec::new();

    for audit in audits {
        if audit.scan_error.is_some() {
            dirty.push(format!("{}{}", audit.path, SCAN_ERROR_SUFFIX));
            continue;
        }
        if audit.is_dirty() {
            dirty.push(audit.path.clone());
        }
        if audit.has_violation() {
            violations.push(audit.path.clone());
        }
        findings.extend(audit.findings.iter().map(|(package, verdict)| AuditFinding {
            environment_path: audit.path.clone(),
            package_name: package.name.clone(),
            version: package.version_label().to_string(),
            violation_type: verdict.to_string(),
        }));
    }

    (findings, dirty, violations)
}
