//! Core types for image generation.

use crate::error::{Error, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// MIME type assumed when the provider omits one.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// Gemini image model tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Gemini 2.5 Flash Image (fast, economical).
    #[default]
    Standard,
    /// Gemini 3 Pro Image (high definition, configurable resolution).
    ///
    /// Needs an explicitly selected, billing-enabled key.
    Pro,
}

impl ModelTier {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "gemini-2.5-flash-image",
            Self::Pro => "gemini-3-pro-image-preview",
        }
    }

    /// Returns true for the privileged tier.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Pro)
    }

    /// Returns true if this tier accepts an output resolution.
    pub fn supports_size(&self) -> bool {
        self.is_privileged()
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "Gemini Flash",
            Self::Pro => "Gemini Pro",
        }
    }
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aspect ratios accepted by the image models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square aspect ratio.
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// 16:9 landscape (widescreen) aspect ratio.
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait (tall) aspect ratio.
    #[serde(rename = "9:16")]
    Portrait,
    /// 4:3 standard landscape aspect ratio.
    #[serde(rename = "4:3")]
    Standard,
    /// 3:4 standard portrait aspect ratio.
    #[serde(rename = "3:4")]
    StandardPortrait,
}

impl AspectRatio {
    /// Returns the aspect ratio as a string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Standard => "4:3",
            Self::StandardPortrait => "3:4",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output resolution, honored by the pro tier only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    /// About 1024 px on the long edge.
    #[default]
    #[serde(rename = "1K")]
    Size1K,
    /// About 2048 px on the long edge.
    #[serde(rename = "2K")]
    Size2K,
    /// About 4096 px on the long edge.
    #[serde(rename = "4K")]
    Size4K,
}

impl ImageSize {
    /// Returns the label sent to the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Size1K => "1K",
            Self::Size2K => "2K",
            Self::Size4K => "4K",
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request to generate images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// The text prompt describing the desired image.
    pub prompt: String,
    /// Model tier to generate with.
    pub model: ModelTier,
    /// Aspect ratio of the output.
    pub aspect_ratio: AspectRatio,
    /// Output resolution. Ignored unless `model` is [`ModelTier::Pro`].
    pub size: Option<ImageSize>,
}

impl GenerationConfig {
    /// Creates a new config with the given prompt and default settings.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: ModelTier::default(),
            aspect_ratio: AspectRatio::default(),
            size: None,
        }
    }

    /// Sets the model tier.
    pub fn with_model(mut self, model: ModelTier) -> Self {
        self.model = model;
        self
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Sets the output resolution.
    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = Some(size);
        self
    }

    /// Returns the resolution that should reach the provider, if any.
    pub fn effective_size(&self) -> Option<ImageSize> {
        self.size.filter(|_| self.model.supports_size())
    }

    /// Returns true if the prompt has no visible characters.
    pub fn is_prompt_blank(&self) -> bool {
        self.prompt.trim().is_empty()
    }
}

/// One generated image, carried as base64 payload plus MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResource {
    /// MIME type reported by the provider.
    pub mime_type: String,
    /// Base64 encoded image bytes.
    pub data: String,
}

impl ImageResource {
    /// Creates a resource, defaulting the MIME type when absent or empty.
    pub fn new(data: impl Into<String>, mime_type: Option<&str>) -> Self {
        let mime_type = mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();
        Self {
            mime_type,
            data: data.into(),
        }
    }

    /// Returns the image as a data URL.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decodes the payload into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.data.trim())
            .map_err(|e| Error::Decode(e.to_string()))
    }

    /// Returns the file extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }

    /// Decodes the payload and writes it to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.decode()?)?;
        Ok(())
    }
}

/// A generated image as kept in a gallery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryItem {
    /// Random identifier.
    pub id: Uuid,
    /// The image itself.
    pub resource: ImageResource,
    /// Prompt that produced the image.
    pub prompt: String,
    /// Aspect ratio requested.
    pub aspect_ratio: AspectRatio,
    /// Model tier used.
    pub model: ModelTier,
    /// When the image was received.
    pub created_at: DateTime<Utc>,
}

impl GalleryItem {
    /// Wraps a resource produced for `config`.
    pub fn new(resource: ImageResource, config: &GenerationConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource,
            prompt: config.prompt.clone(),
            aspect_ratio: config.aspect_ratio,
            model: config.model,
            created_at: Utc::now(),
        }
    }

    /// File name used when downloading the image.
    pub fn download_file_name(&self) -> String {
        format!("imaginai-{}.{}", self.id, self.resource.extension())
    }
}
