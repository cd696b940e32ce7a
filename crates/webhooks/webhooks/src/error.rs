//! Webhook error types.

use media_webhooks_token::TokenError;
use thiserror::Error;

/// Result type for webhook operations.
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Error type for webhook operations.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The event could not be encoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// The access token could not be built.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Request could not be sent or no response was received.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a status that is not retried.
    #[error("Unexpected HTTP status: {status}")]
    HttpStatus { status: u16 },

    /// Retries exhausted.
    #[error("Giving up after {attempts} attempt(s): {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },

    /// Invalid signature.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature expired.
    #[error("Signature expired")]
    ExpiredSignature,

    /// The body does not match the digest in the token.
    #[error("sha256 checksum of body does not match")]
    ChecksumMismatch,

    /// No secret is known for the token's API key.
    #[error("Unknown API key: {0}")]
    UnknownKey(String),

    /// Invalid payload.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::Serialization(err.to_string())
    }
}

impl From<TokenError> for WebhookError {
    fn from(err: TokenError) -> Self {
        WebhookError::Signing(err.to_string())
    }
}

impl From<reqwest::Error> for WebhookError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WebhookError::Transport(format!("request timed out: {err}"))
        } else {
            WebhookError::Transport(err.to_string())
        }
    }
}
