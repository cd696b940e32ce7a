//! Webhook token claims.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Claims carried by a webhook access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookClaims {
    /// Issuer: the API key whose secret signed the token.
    pub iss: String,

    /// Subject (identity the token was issued for).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Not before (Unix timestamp).
    pub nbf: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Base64 SHA-256 digest of the payload this token authenticates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl WebhookClaims {
    /// Creates claims valid from now for `valid_for`.
    pub fn new(api_key: impl Into<String>, valid_for: Duration) -> Self {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(valid_for.as_secs()).unwrap_or(i64::MAX);
        Self {
            iss: api_key.into(),
            sub: None,
            nbf: now,
            exp: now.saturating_add(ttl),
            sha256: None,
        }
    }

    /// Sets the subject.
    pub fn with_subject(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Binds the claims to a payload digest.
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into());
        self
    }
}
