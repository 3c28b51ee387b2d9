// ABOUTME: Outbound call abstraction for the rate-limited provider API.
// ABOUTME: Defines CallError with retryable classification and the CallFuture alias.

mod http;

pub use http::HttpCall;

use futures::future::BoxFuture;

/// Result of one outbound API call. Provider responses are opaque JSON;
/// callers deserialize what they need.
pub type CallResult = Result<serde_json::Value, CallError>;

/// Boxed future produced by a unit of work. The dispatcher re-invokes the
/// work factory on retry, so the factory must be callable more than once.
pub type CallFuture = BoxFuture<'static, CallResult>;

/// Errors from a single outbound call attempt.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The provider answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Anything else the work closure wants to surface.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Substrings providers put in quota-exceeded error bodies. Agreed
/// convention with the CRM; status 429 is the primary signal.
const RATE_LIMIT_MARKERS: [&str; 4] = [
    "rate limit",
    "too many requests",
    "rate_limit_exceeded",
    "quota exceeded",
];

impl CallError {
    /// Whether this failure is a provider rate limit and therefore worth
    /// retrying after a backoff. Everything else is terminal for the task.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            CallError::Api { status, message } => {
                if *status == 429 {
                    return true;
                }
                let message = message.to_lowercase();
                RATE_LIMIT_MARKERS.iter().any(|m| message.contains(m))
            }
            CallError::Http(err) => err.status().is_some_and(|s| s.as_u16() == 429),
            CallError::Other(_) => false,
        }
    }
}

#[cfg(test)]
mod call_test;
