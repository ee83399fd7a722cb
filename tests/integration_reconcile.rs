//! 単一環境リコンサイルの統合テスト
//!
//! スクリプト化したcondaランナーと一時ディレクトリを使って、
//! 履歴パスとフォールバックパスの出力を検証する

mod common;

use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

use common::mock_services::ScriptedRunner;
use common::test_fixtures::*;
use envrecon::application::use_cases::reconcile_environment::{
    ReconcileEnvironmentUseCase, ReconcileError, ReconcileStage, FLAT_LISTING_ARGS,
    FULL_EXPORT_ARGS, HISTORY_EXPORT_ARGS,
};
use envrecon::domain::entities::environment::CondaEnvironment;
use envrecon::domain::entities::manifest::ManifestDependency;
use envrecon::domain::value_objects::{HistoryVerdict, ReconcileMethod};
use envrecon::infrastructure::filesystem::output_store::{OutputLayout, OutputStore};

/// テスト用の環境と出力先をまとめたもの
struct Harness {
    _temp_dir: TempDir,
    env: CondaEnvironment,
    store: OutputStore,
    runner: ScriptedRunner,
}

impl Harness {
    async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let env = CondaEnvironment::new(temp_dir.path().join("envs").join("demo"));
        let store = OutputStore::new(OutputLayout::new(temp_dir.path().join("out")));
        store.ensure_directories().await.unwrap();

        Self {
            _temp_dir: temp_dir,
            env,
            store,
            runner: ScriptedRunner::new(),
        }
    }

    fn script(&self, history: &str, full: Option<&str>, listing: Option<&str>) {
        let path = Some(self.env.path.as_path());
        self.runner.respond(path, HISTORY_EXPORT_ARGS, history);
        match full {
            Some(text) => self.runner.respond(path, FULL_EXPORT_ARGS, text),
            None => self.runner.fail(path, FULL_EXPORT_ARGS, "export failed"),
        };
        match listing {
            Some(text) => self.runner.respond(path, FLAT_LISTING_ARGS, text),
            None => self.runner.fail(path, FLAT_LISTING_ARGS, "list failed"),
        };
    }
}

#[tokio::test]
async fn test_clean_history_writes_history_manifest() {
    let harness = Harness::new().await;
    harness.script(CLEAN_HISTORY, Some(FULL_EXPORT_WITH_PIP), Some(FLAT_LISTING));
    let context = test_context();

    let report = ReconcileEnvironmentUseCase::new(&context, &harness.runner, &harness.store)
        .execute(&harness.env)
        .await
        .unwrap();

    assert_eq!(report.verdict, HistoryVerdict::Clean);
    assert_eq!(report.outcome.method, ReconcileMethod::History);
    assert_eq!(report.outcome.kept, 1);
    assert!(report.fully_written());

    let path = report.manifest_path.unwrap();
    assert_eq!(
        path,
        harness.store.layout().manifest_path(&harness.env, ReconcileMethod::History)
    );
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "name: cf_hist_demo\nchannels:\n- conda-forge\ndependencies:\n- python=3.10\n- pip\n- setuptools\n- wheel\n- numpy=1.24\n- pip:\n  - requests\n  - torch\n  - rich\n"
    );

    let archived =
        fs::read_to_string(harness.store.layout().history_archive_path(&harness.env)).unwrap();
    assert_eq!(archived, CLEAN_HISTORY);
    assert!(harness
        .store
        .layout()
        .listing_archive_path(&harness.env)
        .is_file());
}

#[tokio::test]
async fn test_dirty_history_falls_back_to_listing() {
    let harness = Harness::new().await;
    harness.script(DIRTY_HISTORY, Some(FULL_EXPORT_NO_PIP), Some(FLAT_LISTING));
    let context = test_context();

    let report = ReconcileEnvironmentUseCase::new(&context, &harness.runner, &harness.store)
        .execute(&harness.env)
        .await
        .unwrap();

    assert!(matches!(report.verdict, HistoryVerdict::BuildString { .. }));
    assert_eq!(report.outcome.method, ReconcileMethod::Fallback);
    assert_eq!(
        report.outcome.manifest.spec_strings(),
        vec!["python=3.9.18", "pip", "setuptools", "wheel", "numpy=1.24.4"]
    );
    assert_eq!(report.outcome.kept, 1);
    assert_eq!(report.outcome.filtered, 1);
    assert_eq!(report.outcome.filtered_packages, vec!["six".to_string()]);
    assert_eq!(report.environment_file.name, "cf_filt_demo");
    assert!(report.notes.iter().any(|n| n.starts_with("history rejected")));

    let path = report.manifest_path.unwrap();
    assert!(path.starts_with(harness.store.layout().manifest_dir(ReconcileMethod::Fallback)));
}

#[tokio::test]
async fn test_oversized_history_falls_back() {
    let harness = Harness::new().await;
    harness.script(&long_history(60), Some(FULL_EXPORT_NO_PIP), Some(FLAT_LISTING));
    let context = test_context();

    let report = ReconcileEnvironmentUseCase::new(&context, &harness.runner, &harness.store)
        .execute(&harness.env)
        .await
        .unwrap();

    assert_eq!(
        report.verdict,
        HistoryVerdict::TooManyDependencies {
            count: 60,
            threshold: 50
        }
    );
    assert_eq!(report.outcome.method, ReconcileMethod::Fallback);
}

#[tokio::test]
async fn test_empty_fallback_listing_fails_environment() {
    let harness = Harness::new().await;
    harness.script(DIRTY_HISTORY, Some(FULL_EXPORT_NO_PIP), Some(EMPTY_FLAT_LISTING));
    let context = test_context();

    let result = ReconcileEnvironmentUseCase::new(&context, &harness.runner, &harness.store)
        .execute(&harness.env)
        .await;

    match result {
        Err(ReconcileError::EmptyFallbackListing { environment }) => {
            assert_eq!(environment, harness.env.path.display().to_string());
        }
        other => panic!("Expected EmptyFallbackListing, got {other:?}"),
    }
    assert!(!harness
        .store
        .layout()
        .manifest_path(&harness.env, ReconcileMethod::Fallback)
        .exists());
}

#[tokio::test]
async fn test_missing_pip_section_leaves_no_pip_group() {
    let harness = Harness::new().await;
    harness.script(CLEAN_HISTORY, Some(FULL_EXPORT_NO_PIP), Some(FLAT_LISTING));
    let context = test_context();

    let report = ReconcileEnvironmentUseCase::new(&context, &harness.runner, &harness.store)
        .execute(&harness.env)
        .await
        .unwrap();

    assert!(report.outcome.manifest.pip().is_none());
    assert!(!report
        .environment_file
        .dependencies
        .iter()
        .any(|d| matches!(d, ManifestDependency::Pip { .. })));
    assert!(report.notes.is_empty());
}

#[tokio::test]
async fn test_full_export_failure_is_a_note() {
    let harness = Harness::new().await;
    harness.script(CLEAN_HISTORY, None, Some(FLAT_LISTING));
    let context = test_context();

    let report = ReconcileEnvironmentUseCase::new(&context, &harness.runner, &harness.store)
        .execute(&harness.env)
        .await
        .unwrap();

    assert!(report.outcome.manifest.pip().is_none());
    assert!(report
        .notes
        .iter()
        .any(|n| n.starts_with("pip section unavailable")));
    assert!(report.fully_written());
}

#[tokio::test]
async fn test_listing_failure_only_matters_for_fallback() {
    let harness = Harness::new().await;
    harness.script(CLEAN_HISTORY, Some(FULL_EXPORT_NO_PIP), None);
    let context = test_context();
    let use_case = ReconcileEnvironmentUseCase::new(&context, &harness.runner, &harness.store);

    let report = use_case.execute(&harness.env).await.unwrap();
    assert_eq!(report.outcome.method, ReconcileMethod::History);
    assert!(report
        .notes
        .iter()
        .any(|n| n.starts_with("flat listing unavailable")));

    harness.runner.respond(
        Some(harness.env.path.as_path()),
        HISTORY_EXPORT_ARGS,
        DIRTY_HISTORY,
    );
    match use_case.execute(&harness.env).await {
        Err(ReconcileError::Command { stage, .. }) => {
            assert_eq!(stage, ReconcileStage::FlatListing)
        }
        other => panic!("Expected flat listing failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_history_command_failure() {
    let harness = Harness::new().await;
    let context = test_context();
    harness.runner.time_out(Some(harness.env.path.as_path()), HISTORY_EXPORT_ARGS);

    let result = ReconcileEnvironmentUseCase::new(&context, &harness.runner, &harness.store)
        .execute(&harness.env)
        .await;

    match result {
        Err(ReconcileError::Command { stage, .. }) => {
            assert_eq!(stage, ReconcileStage::HistoryExport)
        }
        other => panic!("Expected history export failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unparseable_history_is_an_error() {
    let harness = Harness::new().await;
    harness.script("dependencies: [oops\n", Some(FULL_EXPORT_NO_PIP), Some(FLAT_LISTING));
    let context = test_context();

    let result = ReconcileEnvironmentUseCase::new(&context, &harness.runner, &harness.store)
        .execute(&harness.env)
        .await;

    assert!(matches!(result, Err(ReconcileError::HistoryParse { .. })));
}

#[tokio::test]
async fn test_rerun_produces_identical_manifest() {
    let harness = Harness::new().await;
    harness.script(DIRTY_HISTORY, Some(FULL_EXPORT_WITH_PIP), Some(FLAT_LISTING));
    let context = test_context();
    let use_case = ReconcileEnvironmentUseCase::new(&context, &harness.runner, &harness.store);

    let first_path = use_case.execute(&harness.env).await.unwrap().manifest_path.unwrap();
    let first = fs::read(&first_path).unwrap();
    let second_path = use_case.execute(&harness.env).await.unwrap().manifest_path.unwrap();
    let second = fs::read(&second_path).unwrap();

    assert_eq!(first_path, second_path);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_original_name_is_kept_on_request() {
    let harness = Harness::new().await;
    harness.script(CLEAN_HISTORY, Some(FULL_EXPORT_NO_PIP), Some(FLAT_LISTING));
    let context = test_context().with_original_names(true);

    let report = ReconcileEnvironmentUseCase::new(&context, &harness.runner, &harness.store)
        .execute(&harness.env)
        .await
        .unwrap();

    assert_eq!(report.environment_file.name, "demo");
}
