//! Fail-open handling for observability failures
//!
//! Metrics are infrastructure: a broken sink must not break the caller.
//! Every place that can observe a handler failure funnels it through
//! [`fail_open`], which either logs and swallows it or, when propagation
//! is enabled process-wide, hands it back to the caller.

use tracing::error;

use crate::settings::propagate_exceptions;
use crate::Result;

/// Contain the outcome of an observability operation.
///
/// Returns `Ok(Some(value))` on success. On failure, logs via
/// `tracing::error!` and returns `Ok(None)`, unless
/// [`propagate_exceptions`] is set, in which case the error is returned.
///
/// # Usage
///
/// ```no_run
/// use metr_core::fail_open::fail_open;
/// use metr_core::{MetrError, Result};
///
/// fn write_to_sink() -> Result<()> {
///     Err(MetrError::Handler("sink offline".to_string()))
/// }
///
/// // With the default settings this logs and yields Ok(None)
/// let outcome = fail_open("sql sink", write_to_sink());
/// assert!(outcome.is_ok());
/// ```
pub fn fail_open<T>(operation_name: &str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(val) => Ok(Some(val)),
        Err(e) if propagate_exceptions() => Err(e),
        Err(e) => {
            error!("{} failed (fail-open): {}", operation_name, e);
            Ok(None)
        }
    }
}
