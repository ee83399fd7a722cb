use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::application::services::{
    export_parser::{
        extract_pip_section_from_text, parse_environment_export, parse_flat_listing,
        ExportParseError, PipExtraction,
    },
    history_classifier::HistoryClassifier,
    reconciler::{ReconcileOutcome, Reconciler},
};
use crate::common::context::RunContext;
use crate::domain::entities::{environment::CondaEnvironment, manifest::EnvironmentFile};
use crate::domain::value_objects::history_verdict::HistoryVerdict;
use crate::infrastructure::filesystem::output_store::OutputStore;
use crate::infrastructure::process::{CommandExecutorError, CommandRunner};

pub const HISTORY_EXPORT_ARGS: &[&str] = &["env", "export", "--from-history", "--no-builds"];
pub const FULL_EXPORT_ARGS: &[&str] = &["env", "export", "--no-builds"];
pub const FLAT_LISTING_ARGS: &[&str] = &["list", "--export"];

/// コマンド実行の段階
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStage {
    HistoryExport,
    FullExport,
    FlatListing,
}

impl fmt::Display for ReconcileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileStage::HistoryExport => write!(f, "history export"),
            ReconcileStage::FullExport => write!(f, "full export"),
            ReconcileStage::FlatListing => write!(f, "flat listing"),
        }
    }
}

/// 環境リコンサイル関連のエラー
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{stage} failed for {environment}: {source}")]
    Command {
        stage: ReconcileStage,
        environment: String,
        #[source]
        source: CommandExecutorError,
    },

    #[error("history export of {environment} could not be parsed: {source}")]
    HistoryParse {
        environment: String,
        #[source]
        source: ExportParseError,
    },

    #[error("flat package listing of {environment} is empty")]
    EmptyFallbackListing { environment: String },
}

impl ReconcileError {
    pub fn environment(&self) -> &str {
        match self {
            ReconcileError::Command { environment, .. }
            | ReconcileError::HistoryParse { environment, .. }
            | ReconcileError::EmptyFallbackListing { environment } => environment,
        }
    }
}

/// 単一環境のリコンサイル結果
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    /// 履歴の品質判定
    pub verdict: HistoryVerdict,

    /// 生成されたマニフェストと件数
    pub outcome: ReconcileOutcome,

    /// シリアライズ対象のファイル内容
    pub environment_file: EnvironmentFile,

    /// 書き込まれたマニフェストのパス（失敗時はNone）
    pub manifest_path: Option<PathBuf>,

    /// 書き込み失敗の内容
    pub write_errors: Vec<String>,

    /// 警告やフォールバック理由などの補足
    pub notes: Vec<String>,
}

impl ReconcileReport {
    /// マニフェストとアーカイブがすべて書き込めたか
    pub fn fully_written(&self) -> bool {
        self.manifest_path.is_some() && self.write_errors.is_empty()
    }
}

/// 一つの環境について履歴とフォールバックのどちらを使うか決め、
/// マニフェストを生成するユースケース
pub struct ReconcileEnvironmentUseCase<'a> {
    context: &'a RunContext,
    runner: &'a dyn CommandRunner,
    store: &'a OutputStore,
    classifier: HistoryClassifier,
    reconciler: Reconciler,
}

impl<'a> ReconcileEnvironmentUseCase<'a> {
    pub fn new(
        context: &'a RunContext,
        runner: &'a dyn CommandRunner,
        store: &'a OutputStore,
    ) -> Self {
        Self {
            context,
            runner,
            store,
            classifier: HistoryClassifier::from_settings(&context.settings),
            reconciler: Reconciler::new(context.settings.ignore_set.clone()),
        }
    }

    pub async fn execute(&self, env: &CondaEnvironment) -> Result<ReconcileReport, ReconcileError> {
        let environment = env.path.display().to_string();
        let mut notes = Vec::new();
        let mut write_errors = Vec::new();

        let history_text = self
            .run(env, HISTORY_EXPORT_ARGS)
            .await
            .map_err(|source| ReconcileError::Command {
                stage: ReconcileStage::HistoryExport,
                environment: environment.clone(),
                source,
            })?;
        if let Err(e) = self.store.archive_history(env, &history_text).await {
            tracing::warn!("Failed to archive history export: {}", e);
            write_errors.push(e.to_string());
        }

        let pip = match self.run(env, FULL_EXPORT_ARGS).await {
            Ok(text) => extract_pip_section_from_text(&text),
            Err(e) => PipExtraction {
                packages: None,
                warnings: vec![format!("pip section unavailable: {e}")],
            },
        };
        for warning in &pip.warnings {
            tracing::warn!("{}", warning);
        }
        notes.extend(pip.warnings);

        let flat_listing = self.run(env, FLAT_LISTING_ARGS).await;
        if let Ok(text) = &flat_listing {
            if let Err(e) = self.store.archive_flat_listing(env, text).await {
                tracing::warn!("Failed to archive flat listing: {}", e);
                write_errors.push(e.to_string());
            }
        }

        let history = parse_environment_export(&history_text).map_err(|source| {
            ReconcileError::HistoryParse {
                environment: environment.clone(),
                source,
            }
        })?;

        let verdict = self.classifier.classify(Some(&history));
        tracing::info!("History check: {}", verdict.reason());

        let outcome = if verdict.is_clean() {
            if let Err(e) = &flat_listing {
                notes.push(format!("flat listing unavailable: {e}"));
            }
            self.reconciler.build_from_history(&history, pip.packages)
        } else {
            notes.push(format!("history rejected: {}", verdict.reason()));
            let text = flat_listing.map_err(|source| ReconcileError::Command {
                stage: ReconcileStage::FlatListing,
                environment: environment.clone(),
                source,
            })?;
            self.reconciler
                .build_from_listing(&parse_flat_listing(&text), pip.packages)
                .map_err(|_| ReconcileError::EmptyFallbackListing {
                    environment: environment.clone(),
                })?
        };

        for warning in &outcome.warnings {
            tracing::warn!("{}", warning);
        }
        notes.extend(outcome.warnings.iter().cloned());

        let manifest_name =
            env.manifest_name(outcome.method.name_prefix(), self.context.use_original_name);
        let environment_file = outcome
            .manifest
            .to_environment_file(manifest_name, self.context.settings.channels.clone());

        let manifest_path = match self
            .store
            .write_manifest(env, outcome.method, &environment_file)
            .await
        {
            Ok(path) => {
                tracing::info!(
                    "Wrote {} manifest ({} kept, {} filtered) to {}",
                    outcome.method,
                    outcome.kept,
                    outcome.filtered,
                    path.display()
                );
                Some(path)
            }
            Err(e) => {
                tracing::error!("Failed to write manifest: {}", e);
                write_errors.push(e.to_string());
                None
            }
        };

        Ok(ReconcileReport {
            verdict,
            outcome,
            environment_file,
            manifest_path,
            write_errors,
            notes,
        })
    }

    async fn run(
        &self,
        env: &CondaEnvironment,
        args: &[&str],
    ) -> Result<String, CommandExecutorError> {
        self.runner
            .run(&self.context.conda_exe, args, Some(&env.path))
            .await
    }
}
