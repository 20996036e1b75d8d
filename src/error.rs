//! # Error Module
//!
//! Failures of the two external services (search provider and completion
//! service) are described here. None of them ever aborts a research run:
//! each call site turns them into a fixed fallback value, and [`Outcome`]
//! records whether that happened.

use thiserror::Error;

// =============================================================================
// UPSTREAM ERROR TAXONOMY
// =============================================================================
/// Errors produced while talking to an external service.
///
/// # Rust Concept: Custom Error Types with thiserror
///
/// Each variant is one kind of failure. The `#[error("...")]` attribute
/// generates the `Display` implementation, so the errors can be logged with
/// `%err` in tracing fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResearchError {
    /// Network failure, provider error or non-success HTTP status.
    #[error("upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A response arrived but did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The call did not finish within its own timeout.
    #[error("{what} timed out after {secs}s")]
    Timeout { what: &'static str, secs: u64 },
}

impl ResearchError {
    /// True for failures where the service could not be reached at all.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ResearchError::UpstreamUnavailable(_) | ResearchError::Timeout { .. }
        )
    }
}

impl From<reqwest::Error> for ResearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ResearchError::MalformedResponse(err.to_string())
        } else {
            ResearchError::UpstreamUnavailable(err.to_string())
        }
    }
}

// =============================================================================
// TAGGED RESULT
// =============================================================================
/// A value that is always usable, tagged with where it came from.
///
/// `Fresh` holds a value parsed from a real response. `Degraded` holds the
/// call site's fixed fallback together with the failure that caused it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Fresh(T),
    Degraded { value: T, reason: ResearchError },
}

impl<T> Outcome<T> {
    /// Build an outcome from a call result, substituting `fallback` on error.
    pub fn or_fallback(result: Result<T, ResearchError>, fallback: impl FnOnce() -> T) -> Self {
        match result {
            Ok(value) => Outcome::Fresh(value),
            Err(reason) => Outcome::Degraded {
                value: fallback(),
                reason,
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Fresh(value) | Outcome::Degraded { value, .. } => value,
        }
    }

    /// The failure behind a degraded value, if any.
    pub fn reason(&self) -> Option<&ResearchError> {
        match self {
            Outcome::Fresh(_) => None,
            Outcome::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Outcome::Fresh(value) | Outcome::Degraded { value, .. } => value,
        }
    }
}
