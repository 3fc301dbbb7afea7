//! Degrading fallible Slack fetches.
//!
//! The aggregator treats partial history as acceptable: a failed read is
//! logged and replaced by whatever the caller can still use.

use tracing::warn;

use crate::errors::RelayError;

/// Unwrap `result`, or log `what` with the error and fall back to `fallback`.
pub fn or_fallback<T>(result: Result<T, RelayError>, what: &str, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Error fetching {}", what);
            fallback
        }
    }
}

/// Like [`or_fallback`] with `T::default()` (an empty list for fetches).
pub fn or_empty<T: Default>(result: Result<T, RelayError>, what: &str) -> T {
    or_fallback(result, what, T::default())
}
