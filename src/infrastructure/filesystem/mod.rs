pub mod audit_report;
pub mod config_store;
pub mod env_discovery;
pub mod output_store;
pub mod summary_writer;

pub use config_store::{ConfigStore, ConfigStoreError, EnvReconConfig};
pub use env_discovery::{DiscoveryMode, EnvDiscovery};
pub use output_store::{OutputLayout, OutputStore, OutputStoreError};
pub use summary_writer::{SummaryRow, SummaryWriterError};
