pub mod export_parser;
pub mod history_classifier;
pub mod reconciler;

pub use export_parser::{
    extract_pip_section, parse_environment_export, parse_flat_listing, ExportParseError,
    PipExtraction,
};
pub use history_classifier::HistoryClassifier;
pub use reconciler::{EmptyListingError, ReconcileOutcome, Reconciler};
