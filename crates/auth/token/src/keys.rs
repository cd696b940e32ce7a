//! API key to secret lookup for token verification.

use std::collections::HashMap;

/// Resolves the secret for an API key.
pub trait KeyProvider: Send + Sync {
    /// Returns the secret for `api_key`, if known.
    fn secret_for(&self, api_key: &str) -> Option<String>;
}

/// In-memory key provider.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyProvider {
    keys: HashMap<String, String>,
}

impl StaticKeyProvider {
    /// Creates a provider holding a single key pair.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self::default().with_key(api_key, api_secret)
    }

    /// Adds a key pair.
    pub fn with_key(mut self, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        self.keys.insert(api_key.into(), api_secret.into());
        self
    }
}

impl KeyProvider for StaticKeyProvider {
    fn secret_for(&self, api_key: &str) -> Option<String> {
        self.keys.get(api_key).cloned()
    }
}
