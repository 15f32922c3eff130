//! Shared primitives for all Rust crates in Clawcook.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Result type used across Clawcook crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// User is not authenticated or not allowed to access a resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Request was rejected by a quota rule. The message is user-facing.
    #[error("{0}")]
    RateLimited(String),

    /// An external dependency could not be reached or answered garbage.
    ///
    /// Covers transport failures, timeouts, non-success responses and
    /// malformed payloads. Callers with a degrade path match on this variant
    /// and nothing else.
    #[error("dependency unavailable: {0}")]
    Unavailable(String),

    /// An upstream collaborator answered with an error.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns true when the error signals an unreachable or misbehaving dependency.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn rate_limited_displays_reason_verbatim() {
        let error = AppError::RateLimited("slow down".to_owned());
        assert_eq!(error.to_string(), "slow down");
    }

    #[test]
    fn only_unavailable_counts_as_outage() {
        assert!(AppError::Unavailable("timeout".to_owned()).is_unavailable());
        assert!(!AppError::Validation("empty key".to_owned()).is_unavailable());
        assert!(!AppError::Internal("bug".to_owned()).is_unavailable());
    }
}
