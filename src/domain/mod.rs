/// Domain layer
///
/// Entities describing environments, their exports and reconciled manifests,
/// plus value objects for specs, verdicts and filtering policy.
pub mod entities;
pub mod value_objects;
