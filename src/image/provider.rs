//! Image provider trait.

use crate::error::Result;
use crate::image::types::{GenerationConfig, ImageResource};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for image generation providers.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates images for the given config, in the order the provider emitted them.
    ///
    /// Succeeds only with a non-empty list.
    async fn generate(&self, config: &GenerationConfig) -> Result<Vec<ImageResource>>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ImageProvider + ?Sized> ImageProvider for Arc<T> {
    async fn generate(&self, config: &GenerationConfig) -> Result<Vec<ImageResource>> {
        (**self).generate(config).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
