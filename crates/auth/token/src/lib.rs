//! # Media Webhooks Token
//!
//! Short-lived bearer tokens that authenticate webhook deliveries.
//!
//! ## Features
//!
//! - HS256 JWTs issued by an API key and signed with its secret
//! - A `sha256` claim binding the token to one exact payload
//! - Verification of signature, validity window and payload digest
//! - Key providers for looking up secrets on the receiving side
//!
//! ## Example
//!
//! ```rust,ignore
//! use media_webhooks_token::{sha256_base64, AccessToken, TokenVerifier, TOKEN_VALIDITY};
//!
//! let body = br#"{"event":"room_started"}"#;
//! let token = AccessToken::new("api-key", "api-secret")
//!     .with_valid_for(TOKEN_VALIDITY)
//!     .with_sha256(sha256_base64(body))
//!     .to_jwt()?;
//!
//! let claims = TokenVerifier::parse(&token)?.verify("api-secret")?;
//! ```

pub mod claims;
pub mod digest;
pub mod keys;
pub mod token;

pub use claims::WebhookClaims;
pub use digest::{constant_time_eq, sha256_base64};
pub use keys::{KeyProvider, StaticKeyProvider};
pub use token::{encode, AccessToken, TokenError, TokenResult, TokenVerifier, TOKEN_VALIDITY};
