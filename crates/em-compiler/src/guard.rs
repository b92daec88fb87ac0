use em_core::{BodyError, CompileError};

/// Runs `f`, attaching `label` to any error that escapes it. Nested calls
/// build a label chain while the original error stays reachable as the source.
pub fn with_context<T, E>(
    label: impl Into<String>,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, CompileError>
where
    E: Into<BodyError>,
{
    f().map_err(|error| CompileError::build(label, error))
}
