pub mod channel_policy;
pub mod history_verdict;
pub mod ignore_set;
pub mod package_spec;
pub mod reconcile_method;

pub use channel_policy::{ChannelPolicy, ChannelVerdict};
pub use history_verdict::HistoryVerdict;
pub use ignore_set::IgnoreSet;
pub use package_spec::PackageSpec;
pub use reconcile_method::ReconcileMethod;
