use crate::common::error::EnvReconError;

/// Result alias used across the crate.
///
/// # Examples
///
/// ```
/// use envrecon::common::result::{EnvReconResult, ResultExt};
///
/// fn read_settings(path: &str) -> EnvReconResult<String> {
///     std::fs::read_to_string(path).with_internal_context("reading settings")
/// }
///
/// assert!(read_settings("/nonexistent/envrecon.yml").is_err());
/// ```
pub type EnvReconResult<T> = Result<T, EnvReconError>;

/// Conversion helper from foreign `Result` types into [`EnvReconResult`].
pub trait ResultExt<T> {
    /// Wrap the error as an internal error carrying `message`.
    fn with_internal_context(self, message: impl Into<String>) -> EnvReconResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_internal_context(self, message: impl Into<String>) -> EnvReconResult<T> {
        self.map_err(|e| EnvReconError::internal_error_with_source(message, e))
    }
}
