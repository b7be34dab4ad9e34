use thiserror::Error;

/// How much of the offending model output is kept in a [`ParseFailure`].
const EXCERPT_LEN: usize = 160;

/// Returned when no structured payload could be recovered from model output.
///
/// This is a value, not a panic: callers treat it as a retryable condition
/// until the unit's retry budget is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} (output starts with: {excerpt:?})")]
pub struct ParseFailure {
    pub reason: String,
    /// Leading excerpt of the raw output, for diagnostics.
    pub excerpt: String,
}

impl ParseFailure {
    pub fn new(reason: impl Into<String>, raw: &str) -> Self {
        let excerpt: String = raw.chars().take(EXCERPT_LEN).collect();
        Self {
            reason: reason.into(),
            excerpt,
        }
    }
}

/// Faults that can occur while driving one unit of model work
/// (one file extraction or one language translation).
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The generation API answered with a non-success status.
    #[error("model API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The generation API could not be reached.
    #[error("failed to reach model API: {0}")]
    Network(#[source] reqwest::Error),

    /// The request exceeded the configured timeout.
    #[error("model API request timed out")]
    Timeout,

    /// The API answered 2xx but the completion contained no choices.
    #[error("model response contained no choices")]
    EmptyResponse,

    /// The completion text carried no recoverable structured payload.
    #[error(transparent)]
    Malformed(#[from] ParseFailure),
}

impl InvokeError {
    /// Whether this fault is worth another attempt.
    ///
    /// Rate limiting (429) and server errors are transient; other 4xx
    /// responses indicate a request that will keep failing. Malformed
    /// output is retryable because the model may produce valid output
    /// on a subsequent attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            InvokeError::Api { status, .. } => *status == 429 || *status >= 500,
            InvokeError::Network(_)
            | InvokeError::Timeout
            | InvokeError::EmptyResponse
            | InvokeError::Malformed(_) => true,
        }
    }
}
