use thiserror::Error;

/// Maximum characters to include in error message body for debugging.
pub(crate) const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors that can occur while resolving an identity source or acquiring a token.
///
/// Every variant is an authentication failure from the caller's point of view.
/// The messages exist for diagnostics; callers should not branch on their text,
/// which may change between releases.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Construction-time configuration problem: an invalid managed identity id,
    /// a malformed identity-source endpoint URL, or an out-of-range port.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The selected identity source does not support the configured identity.
    /// Cloud Shell and Azure Arc accept the system-assigned identity only.
    #[error("identity source mismatch: {0}")]
    SourceMismatch(String),

    /// Azure Arc challenge protocol violation: unexpected status code, malformed
    /// `WWW-Authenticate` header, or an invalid/oversized key file.
    #[error("challenge error: {0}")]
    Challenge(String),

    /// The token response body could not be parsed.
    #[error("token response parse error: {0}")]
    Parse(String),

    /// HTTP/network layer error from reqwest.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token endpoint replied with a non-success status code.
    #[error("token endpoint returned HTTP {status} with body: {body}")]
    Http { status: u16, body: String },
}

impl CredentialError {
    /// Returns `true` if the error is potentially recoverable by retrying.
    ///
    /// This layer never retries on its own; the classification is for callers
    /// that layer a retry policy on top.
    pub fn is_retryable(&self) -> bool {
        match self {
            // Network errors are generally retryable
            CredentialError::Transport(e) => e.is_timeout() || e.is_connect(),

            // Server errors and throttling are retryable
            CredentialError::Http { status, .. } => *status >= 500 || *status == 429,

            // These are never retryable
            CredentialError::Configuration(_)
            | CredentialError::SourceMismatch(_)
            | CredentialError::Challenge(_)
            | CredentialError::Parse(_) => false,
        }
    }
}

/// A specialized Result type for credential operations.
pub type Result<T> = std::result::Result<T, CredentialError>;

/// Truncates a string to at most `max_chars` characters on a valid UTF-8 boundary.
pub(crate) fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
