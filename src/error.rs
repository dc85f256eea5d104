//! Error types for image generation.

/// Marker the provider puts in its message when it cannot resolve the
/// API key or the entity it refers to.
pub(crate) const ENTITY_NOT_FOUND_MARKER: &str = "Requested entity was not found";

/// Errors that can occur during image generation.
#[derive(Debug, thiserror::Error)]
pub enum ImaginAiError {
    /// No API key could be resolved from the configured credential source.
    #[error("API key missing: set the API key before generating")]
    MissingCredential,

    /// The provider could not resolve the active key; a new key must be selected.
    #[error("API key not recognized by the provider, select or connect a key: {0}")]
    CredentialNotFound(String),

    /// The provider answered but no image came back.
    #[error("no image generated, try again with a different prompt")]
    NoImageProduced,

    /// Any other transport or provider failure.
    #[error("{message}")]
    Provider {
        /// HTTP status, when the failure came from an error response.
        status: Option<u16>,
        /// Provider message, unchanged.
        message: String,
    },

    /// The prompt was empty or whitespace.
    #[error("enter a description to generate an image")]
    EmptyPrompt,

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The interactive key selection failed.
    #[error("key selection failed: {0}")]
    KeySelection(String),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImaginAiError {
    /// Classifies a failure raised while calling the provider or reading its reply.
    ///
    /// Classification is by substring because the REST surface reports this case
    /// as a plain 404 shared with unknown models.
    pub(crate) fn from_provider(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains(ENTITY_NOT_FOUND_MARKER) {
            Self::CredentialNotFound(message)
        } else {
            Self::Provider { status, message }
        }
    }

    /// Returns true if the caller should ask the user to select or connect a key.
    pub fn needs_key_selection(&self) -> bool {
        matches!(self, Self::CredentialNotFound(_))
    }
}

impl From<reqwest::Error> for ImaginAiError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        Self::from_provider(status, err.to_string())
    }
}

pub use self::ImaginAiError as Error;

/// Result type alias for image generation operations.
pub type Result<T> = std::result::Result<T, ImaginAiError>;
