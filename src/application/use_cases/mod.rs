pub mod batch_generate;
pub mod channel_audit;
pub mod collect_packages;
pub mod reconcile_environment;
