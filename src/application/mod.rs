/// Application layer
///
/// Services hold the pure reconciliation logic; use cases drive them
/// against conda and the file system.
pub mod services;
pub mod use_cases;
