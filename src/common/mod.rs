//! Shared utilities: error type, result helpers, logging setup and the
//! per-run context.

pub mod context;
pub mod error;
pub mod logging;
pub mod result;

pub use context::{ReconSettings, RunContext};
pub use error::EnvReconError;
pub use result::EnvReconResult;
