#![warn(missing_docs)]
//! ImaginAI - prompt-to-image generation with the Gemini image models.
//!
//! The crate turns a [`GenerationConfig`] into one `generateContent` call and
//! returns the generated images as self-contained data URIs. The pro tier can be
//! gated behind an explicit key selection, and a [`Studio`] session keeps the
//! resulting gallery in memory.
//!
//! # Quick Start
//!
//! ```no_run
//! use imaginai::{GeminiProvider, GenerationConfig, ImageProvider};
//!
//! #[tokio::main]
//! async fn main() -> imaginai::Result<()> {
//!     // Reads `API_KEY` on every request.
//!     let provider = GeminiProvider::builder().build()?;
//!     let config = GenerationConfig::new("A golden retriever puppy");
//!     for (i, image) in provider.generate(&config).await?.iter().enumerate() {
//!         image.save(format!("puppy-{i}.{}", image.extension()))?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Pro tier
//!
//! ```no_run
//! use imaginai::{
//!     GeminiProvider, GenerationConfig, ImageSize, KeyGate, ModelTier, Studio, StudioOutcome,
//! };
//!
//! # async fn run(gate: KeyGate) -> imaginai::Result<()> {
//! let mut studio = Studio::with_gate(GeminiProvider::builder().build()?, gate);
//! let config = GenerationConfig::new("A lighthouse at dusk")
//!     .with_model(ModelTier::Pro)
//!     .with_size(ImageSize::Size2K);
//!
//! if let StudioOutcome::KeySelectionRequired = studio.generate(&config).await? {
//!     studio.connect_key().await?;
//!     studio.generate(&config).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod credentials;
mod error;
pub mod gate;
pub mod image;
pub mod studio;

// Re-export error types at crate root
pub use error::{Error, ImaginAiError, Result};

pub use credentials::{CredentialSource, EnvCredential, SelectedKey, StaticCredential};
pub use gate::{KeyGate, KeySelectionHost};
pub use image::providers::{GeminiProvider, GeminiProviderBuilder};
pub use image::{
    AspectRatio, GalleryItem, GenerationConfig, ImageProvider, ImageResource, ImageSize,
    ModelTier,
};
pub use studio::{Studio, StudioOutcome};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Error, ImaginAiError, Result};
    pub use crate::gate::{KeyGate, KeySelectionHost};
    pub use crate::image::providers::GeminiProvider;
    pub use crate::image::{GenerationConfig, ImageProvider, ImageResource, ModelTier};
    pub use crate::studio::{Studio, StudioOutcome};
}
