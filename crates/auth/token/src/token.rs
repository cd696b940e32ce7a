//! Access token encoding and verification.

use std::time::Duration;

use jsonwebtoken::{decode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::WebhookClaims;

/// Validity window of tokens attached to webhook deliveries.
pub const TOKEN_VALIDITY: Duration = Duration::from_secs(5 * 60);

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

/// Error type for token operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("API key and secret are required")]
    MissingKeys,

    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Invalid signature")]
    InvalidSignature,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidToken
            | ErrorKind::ImmatureSignature
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAlgorithm => TokenError::Invalid,
            _ => TokenError::DecodingFailed(err.to_string()),
        }
    }
}

/// Encodes claims into an HS256 token signed with `secret`.
pub fn encode(claims: &WebhookClaims, secret: &str) -> TokenResult<String> {
    let header = Header::new(Algorithm::HS256);
    jsonwebtoken::encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| TokenError::EncodingFailed(e.to_string()))
}

/// Builder for a signed access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    api_key: String,
    api_secret: String,
    valid_for: Duration,
    identity: Option<String>,
    sha256: Option<String>,
}

impl AccessToken {
    /// Creates a token issued by `api_key` and signed with `api_secret`.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            valid_for: TOKEN_VALIDITY,
            identity: None,
            sha256: None,
        }
    }

    /// Sets how long the token stays valid.
    pub fn with_valid_for(mut self, valid_for: Duration) -> Self {
        self.valid_for = valid_for;
        self
    }

    /// Sets the identity the token is issued for.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Binds the token to a payload digest (see [`crate::sha256_base64`]).
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into());
        self
    }

    /// Signs the token.
    pub fn to_jwt(&self) -> TokenResult<String> {
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(TokenError::MissingKeys);
        }

        let mut claims = WebhookClaims::new(&self.api_key, self.valid_for);
        if let Some(ref identity) = self.identity {
            claims = claims.with_subject(identity);
        }
        if let Some(ref digest) = self.sha256 {
            claims = claims.with_sha256(digest);
        }

        encode(&claims, &self.api_secret)
    }
}

/// A received token whose issuer has been read but not yet verified.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    token: String,
    api_key: String,
}

impl TokenVerifier {
    /// Parses a token without validating its signature.
    ///
    /// The issuer is needed to look up the secret before verification.
    pub fn parse(token: &str) -> TokenResult<Self> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        let data = decode::<WebhookClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        if data.claims.iss.is_empty() {
            return Err(TokenError::Invalid);
        }

        Ok(Self {
            token: token.to_string(),
            api_key: data.claims.iss,
        })
    }

    /// Returns the API key that issued the token.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Verifies the signature and validity window, returning the claims.
    pub fn verify(&self, api_secret: &str) -> TokenResult<WebhookClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.api_key]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss"]);

        let data = decode::<WebhookClaims>(
            &self.token,
            &DecodingKey::from_secret(api_secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }
}
