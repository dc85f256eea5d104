//! In-memory generation session: gating, key recovery and the gallery.

use crate::error::{Error, Result};
use crate::gate::KeyGate;
use crate::image::{GalleryItem, GenerationConfig, ImageProvider};
use uuid::Uuid;

/// What a call to [`Studio::generate`] ended with.
#[derive(Debug, Clone)]
pub enum StudioOutcome {
    /// New gallery items, in provider order.
    Generated(Vec<GalleryItem>),
    /// A key must be selected before the request can go through.
    KeySelectionRequired,
}

/// A generation session over one provider.
pub struct Studio<P> {
    provider: P,
    gate: KeyGate,
    gallery: Vec<GalleryItem>,
    needs_key_selection: bool,
    last_error: Option<String>,
    selected: Option<Uuid>,
}

impl<P: ImageProvider> Studio<P> {
    /// Creates a session without a key selection host.
    pub fn new(provider: P) -> Self {
        Self::with_gate(provider, KeyGate::permissive())
    }

    /// Creates a session gated by `gate`.
    pub fn with_gate(provider: P, gate: KeyGate) -> Self {
        Self {
            provider,
            gate,
            gallery: Vec::new(),
            needs_key_selection: false,
            last_error: None,
            selected: None,
        }
    }

    /// Runs one generation and records the result.
    ///
    /// The privileged tier is checked against the gate first. A key the provider
    /// does not recognize is reported as [`StudioOutcome::KeySelectionRequired`]
    /// rather than an error.
    pub async fn generate(&mut self, config: &GenerationConfig) -> Result<StudioOutcome> {
        if config.is_prompt_blank() {
            self.last_error = Some(Error::EmptyPrompt.to_string());
            return Err(Error::EmptyPrompt);
        }

        self.last_error = None;
        self.needs_key_selection = false;

        if config.model.is_privileged() && !self.gate.has_active_selection().await {
            tracing::debug!(model = %config.model, "no key selected");
            self.needs_key_selection = true;
            return Ok(StudioOutcome::KeySelectionRequired);
        }

        match self.provider.generate(config).await {
            Ok(resources) => {
                let items: Vec<GalleryItem> = resources
                    .into_iter()
                    .map(|r| GalleryItem::new(r, config))
                    .collect();
                let mut gallery = items.clone();
                gallery.append(&mut self.gallery);
                self.gallery = gallery;
                tracing::debug!(
                    added = items.len(),
                    total = self.gallery.len(),
                    "gallery updated"
                );
                Ok(StudioOutcome::Generated(items))
            }
            Err(e) if e.needs_key_selection() => {
                tracing::warn!("provider rejected the key: {e}");
                self.needs_key_selection = true;
                Ok(StudioOutcome::KeySelectionRequired)
            }
            Err(e) => {
                tracing::warn!("image generation failed: {e}");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Opens the key selection and clears the pending request for one.
    ///
    /// Does not retry the last generation.
    pub async fn connect_key(&mut self) -> Result<()> {
        if let Err(e) = self.gate.request_selection().await {
            tracing::error!("failed to select key: {e}");
            return Err(e);
        }
        self.needs_key_selection = false;
        Ok(())
    }

    /// Generated images, newest first.
    pub fn gallery(&self) -> &[GalleryItem] {
        &self.gallery
    }

    /// Returns true if the last generation needs a key to be selected.
    pub fn needs_key_selection(&self) -> bool {
        self.needs_key_selection
    }

    /// Message of the last failed generation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Marks a gallery item as selected. Returns false for unknown ids.
    pub fn select(&mut self, id: Uuid) -> bool {
        let found = self.gallery.iter().any(|item| item.id == id);
        if found {
            self.selected = Some(id);
        }
        found
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// The selected gallery item.
    pub fn selected(&self) -> Option<&GalleryItem> {
        let id = self.selected?;
        self.gallery.iter().find(|item| item.id == id)
    }

    /// The provider behind this session.
    pub fn provider(&self) -> &P {
        &self.provider
    }
}
