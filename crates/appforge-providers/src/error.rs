//! The single failure type every adapter reports.

use std::time::Duration;

use thiserror::Error;

/// Why a provider attempt produced no output.
///
/// Adapters translate transport errors, HTTP statuses and response shapes
/// into one of these; nothing adapter-specific crosses the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderFailure {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("cancelled")]
    Cancelled,
}

/// Longest response body excerpt kept in a `Status` failure.
const BODY_EXCERPT: usize = 200;

impl ProviderFailure {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ProviderFailure::Timeout(timeout)
        } else if err.is_decode() {
            ProviderFailure::MalformedResponse(err.to_string())
        } else {
            ProviderFailure::Transport(err.to_string())
        }
    }

    pub(crate) fn status(code: u16, body: &str) -> Self {
        ProviderFailure::Status {
            code,
            body: body.chars().take(BODY_EXCERPT).collect(),
        }
    }

    /// Short machine-friendly label, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderFailure::Timeout(_) => "timeout",
            ProviderFailure::Transport(_) => "transport",
            ProviderFailure::Status { .. } => "status",
            ProviderFailure::MalformedResponse(_) => "malformed",
            ProviderFailure::Unavailable(_) => "unavailable",
            ProviderFailure::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_body_is_truncated() {
        let long = "x".repeat(1000);
        let ProviderFailure::Status { code, body } = ProviderFailure::status(503, &long) else {
            panic!("expected status failure");
        };
        assert_eq!(code, 503);
        assert_eq!(body.len(), BODY_EXCERPT);
    }

    #[test]
    fn display_includes_detail() {
        let failure = ProviderFailure::status(429, "rate limited");
        assert_eq!(failure.to_string(), "HTTP 429: rate limited");
        assert_eq!(failure.kind(), "status");
        assert_eq!(ProviderFailure::Timeout(Duration::from_secs(2)).to_string(), "timed out after 2s");
    }
}
