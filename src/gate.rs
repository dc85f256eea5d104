//! Key selection gate for the privileged model tier.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Host environment able to report and change the selected API key.
#[async_trait]
pub trait KeySelectionHost: Send + Sync {
    /// Returns true if the user has selected a key.
    async fn has_selected_api_key(&self) -> bool;

    /// Opens the interactive key selection and waits for it to finish.
    async fn open_select_key(&self) -> Result<()>;
}

/// Gates the privileged path behind an explicit key selection.
///
/// Without a host every check passes and selection requests are no-ops.
#[derive(Clone, Default)]
pub struct KeyGate {
    host: Option<Arc<dyn KeySelectionHost>>,
}

impl KeyGate {
    /// A gate with no host.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// A gate backed by `host`.
    pub fn with_host(host: impl KeySelectionHost + 'static) -> Self {
        Self {
            host: Some(Arc::new(host)),
        }
    }

    /// Returns true if a host is attached.
    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    /// Returns true if a key selection is active.
    pub async fn has_active_selection(&self) -> bool {
        match &self.host {
            Some(host) => host.has_selected_api_key().await,
            None => true,
        }
    }

    /// Asks the host to run its interactive key selection.
    ///
    /// The outcome is not re-checked here; callers check again before retrying.
    pub async fn request_selection(&self) -> Result<()> {
        match &self.host {
            Some(host) => {
                tracing::debug!("opening key selection");
                host.open_select_key().await
            }
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for KeyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyGate")
            .field("host", &self.host.is_some())
            .finish()
    }
}
