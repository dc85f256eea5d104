//! API key resolution.
//!
//! A key is looked up on every request and never cached, so a key switched
//! between two calls is used by the second one.

use std::sync::{Arc, RwLock};

/// Environment variable read by [`EnvCredential::default`].
pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";

/// Source of the provider API key.
pub trait CredentialSource: Send + Sync {
    /// Returns the current key, or `None` if no usable key is configured.
    fn resolve(&self) -> Option<String>;
}

/// Reads the key from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    /// Reads from the named variable.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the variable this source reads.
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::new(DEFAULT_API_KEY_ENV)
    }
}

impl CredentialSource for EnvCredential {
    fn resolve(&self) -> Option<String> {
        std::env::var(&self.var).ok().and_then(non_blank)
    }
}

/// A fixed key.
#[derive(Clone)]
pub struct StaticCredential(String);

impl StaticCredential {
    /// Wraps the given key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl std::fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticCredential").field(&"<redacted>").finish()
    }
}

impl CredentialSource for StaticCredential {
    fn resolve(&self) -> Option<String> {
        non_blank(self.0.clone())
    }
}

/// A key slot shared between a key selection host and the provider.
///
/// When the slot is empty the fallback source is consulted.
#[derive(Clone)]
pub struct SelectedKey {
    slot: Arc<RwLock<Option<String>>>,
    fallback: Option<Arc<dyn CredentialSource>>,
}

impl SelectedKey {
    /// Creates an empty slot without fallback.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
            fallback: None,
        }
    }

    /// Creates an empty slot that defers to `fallback` until a key is selected.
    pub fn with_fallback(fallback: impl CredentialSource + 'static) -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
            fallback: Some(Arc::new(fallback)),
        }
    }

    /// Stores a selected key. Blank keys clear the slot.
    pub fn select(&self, key: impl Into<String>) {
        let key = non_blank(key.into());
        match self.slot.write() {
            Ok(mut slot) => *slot = key,
            Err(poisoned) => *poisoned.into_inner() = key,
        }
    }

    /// Forgets the selected key.
    pub fn clear(&self) {
        self.select(String::new());
    }

    /// Returns true if a key was explicitly selected.
    pub fn is_selected(&self) -> bool {
        match self.slot.read() {
            Ok(slot) => slot.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }
}

impl Default for SelectedKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SelectedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedKey")
            .field("selected", &self.is_selected())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl CredentialSource for SelectedKey {
    fn resolve(&self) -> Option<String> {
        let selected = match self.slot.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        selected.or_else(|| self.fallback.as_ref().and_then(|f| f.resolve()))
    }
}

fn non_blank(key: String) -> Option<String> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
