//! Webhook receiver for verifying incoming webhooks.

use std::sync::Arc;

use media_webhooks_events::WebhookEvent;
use media_webhooks_token::{
    constant_time_eq, sha256_base64, KeyProvider, TokenError, TokenVerifier, WebhookClaims,
};

use crate::error::{WebhookError, WebhookResult};

/// Header carrying the signed token.
pub const AUTH_HEADER: &str = "Authorization";

/// Verifies webhook requests against a set of API keys.
///
/// A request is trusted only if its token was signed with the secret of
/// the key that issued it and the token's digest matches the body.
pub struct WebhookReceiver {
    keys: Arc<dyn KeyProvider>,
}

impl WebhookReceiver {
    /// Creates a receiver backed by `keys`.
    pub fn new(keys: Arc<dyn KeyProvider>) -> Self {
        Self { keys }
    }

    /// Verifies the token and body, then decodes the event.
    pub fn receive(&self, auth_header: &str, body: &[u8]) -> WebhookResult<WebhookEvent> {
        self.verify(auth_header, body)?;
        WebhookEvent::from_wire(body).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }

    /// Verifies the token in `auth_header` and that it was issued for `body`.
    pub fn verify(&self, auth_header: &str, body: &[u8]) -> WebhookResult<WebhookClaims> {
        let token = auth_header.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token);

        let verifier = TokenVerifier::parse(token).map_err(|_| WebhookError::InvalidSignature)?;
        let secret = self
            .keys
            .secret_for(verifier.api_key())
            .ok_or_else(|| WebhookError::UnknownKey(verifier.api_key().to_string()))?;

        let claims = verifier.verify(&secret).map_err(|e| match e {
            TokenError::Expired => WebhookError::ExpiredSignature,
            _ => WebhookError::InvalidSignature,
        })?;

        let expected = claims.sha256.as_deref().unwrap_or_default();
        if !constant_time_eq(&sha256_base64(body), expected) {
            return Err(WebhookError::ChecksumMismatch);
        }

        Ok(claims)
    }
}
