//! Error taxonomy for the ingestion pipeline.
//!
//! Only [`ValidationError`] and [`ProviderError`] ever reach a caller.
//! [`PersistenceError`] is logged by the persist stage and dropped. Malformed
//! backend output is not an error at all; the validator repairs it.

use std::time::Duration;

use thiserror::Error;

/// Input rejected before parsing was attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing input: transcript text is empty")]
    MissingInput,
}

impl ValidationError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingInput => "missing_input",
        }
    }
}

/// Why a backend call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Timeout,
    Transport,
    BackendRejected,
}

impl ProviderErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::Transport => "transport",
            ProviderErrorKind::BackendRejected => "backend_rejected",
        }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classification backend was unreachable, too slow, or refused the request
#[derive(Debug, Clone, Error)]
#[error("{provider} {kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    /// Which backend produced the error
    pub provider: &'static str,
    pub message: String,
    /// HTTP status, when the backend answered
    pub status: Option<u16>,
    /// Backend response body, kept for logging only
    pub diagnostic: Option<String>,
}

impl ProviderError {
    pub fn timeout(provider: &'static str, after: Duration) -> Self {
        Self {
            kind: ProviderErrorKind::Timeout,
            provider,
            message: format!("no response within {}s", after.as_secs_f64()),
            status: None,
            diagnostic: None,
        }
    }

    pub fn transport(provider: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Transport,
            provider,
            message: message.into(),
            status: None,
            diagnostic: None,
        }
    }

    pub fn rejected(
        provider: &'static str,
        status: Option<u16>,
        message: impl Into<String>,
        diagnostic: Option<String>,
    ) -> Self {
        Self {
            kind: ProviderErrorKind::BackendRejected,
            provider,
            message: message.into(),
            status,
            diagnostic,
        }
    }
}

/// Record sink failure; never surfaced to the caller
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("insert did not finish within {0:?}")]
    Timeout(Duration),
    #[error("insert task failed: {0}")]
    Join(String),
}

/// Classification policy rejected at construction time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("speaker label must not be empty")]
    EmptyLabel,
    #[error("self and other speaker labels must differ (both are {0:?})")]
    DuplicateLabel(String),
    #[error("speaker label {0:?} must not contain ':' or line breaks")]
    InvalidLabel(String),
    #[error("transcript character budget must be greater than zero")]
    ZeroContextBudget,
}

/// Errors the orchestrator surfaces to its caller
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::rejected("openai", Some(429), "HTTP 429", Some("{}".into()));
        assert_eq!(err.to_string(), "openai backend_rejected: HTTP 429");
        assert_eq!(err.kind, ProviderErrorKind::BackendRejected);
    }

    #[test]
    fn test_ingest_error_is_transparent() {
        let err: IngestError = ValidationError::MissingInput.into();
        assert_eq!(err.to_string(), "missing input: transcript text is empty");
    }
}
