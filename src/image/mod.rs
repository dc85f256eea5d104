//! Image generation module.

mod provider;
pub mod providers;
mod types;

pub use provider::ImageProvider;
pub use types::{
    AspectRatio, GalleryItem, GenerationConfig, ImageResource, ImageSize, ModelTier,
    DEFAULT_MIME_TYPE,
};
