//! # envrecon - conda environment reconciler
//!
//! `envrecon` turns existing conda environments into portable, minimal
//! `environment.yml` manifests that target a single channel (conda-forge by
//! default).
//!
//! ## How an environment is reconciled
//!
//! For every environment found under the search paths:
//!
//! 1. The user-intent history (`conda env export --from-history`) is fetched
//!    and classified. A history is *clean* when it is well formed, short,
//!    free of build strings and free of base-layer packages.
//! 2. A clean history is rewritten as-is (with the runtime spec first and the
//!    installer trio ensured) into `from_history/`.
//! 3. Otherwise the flat listing (`conda list --export`) is filtered through
//!    the ignore set and written into `from_fallback/`.
//! 4. In both cases the pip requirements of the full export are appended,
//!    with version constraints stripped.
//!
//! Raw exports are archived next to the manifests and a CSV summary records
//! one row per environment.
//!
//! ## Quick Start
//!
//! ```bash
//! envrecon generate /opt/conda/envs ~/miniforge3/envs
//! envrecon classify saved_history.yml
//! envrecon audit /opt
//! ```
//!
//! ## Architecture
//!
//! - [`domain`]: package specs, exports, manifests and verdicts
//! - [`application`]: classification, reconciliation and the batch workflows
//! - [`infrastructure`]: conda subprocesses, discovery and output files
//! - [`presentation`]: CLI interface and terminal output
//! - [`common`]: error type, logging and the per-run context
//!
//! ## Using the Library
//!
//! ```rust
//! use envrecon::application::services::{parse_environment_export, HistoryClassifier};
//!
//! let export = parse_environment_export(
//!     "name: demo\ndependencies:\n  - python=3.10\n  - numpy=1.24\n",
//! )?;
//! let verdict = HistoryClassifier::default().classify(Some(&export));
//! assert!(verdict.is_clean());
//! # Ok::<(), envrecon::application::services::ExportParseError>(())
//! ```
//!
//! See [`application::services::Reconciler`] for building a manifest from a
//! history or a flat listing, and
//! [`application::use_cases::batch_generate::BatchGenerateUseCase`] for the
//! full batch run.

#![deny(rustdoc::broken_intra_doc_links)]

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use crate::common::error::EnvReconError;
pub use crate::common::result::EnvReconResult as Result;
