//! Gemini (Google) image generation provider.

use crate::credentials::{CredentialSource, EnvCredential, StaticCredential};
use crate::error::{Error, Result};
use crate::image::provider::ImageProvider;
use crate::image::types::{GenerationConfig, ImageResource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Builder for GeminiProvider.
#[derive(Default)]
pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    credentials: Option<Arc<dyn CredentialSource>>,
    base_url: Option<String>,
    client: Option<reqwest::Client>,
}

impl GeminiProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a fixed API key. Without one the key is read from `API_KEY` on every request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the source the API key is resolved from on every request.
    pub fn credentials(mut self, source: impl CredentialSource + 'static) -> Self {
        self.credentials = Some(Arc::new(source));
        self
    }

    /// Overrides the API endpoint.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Uses a preconfigured HTTP client (proxies, timeouts).
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the provider. The API key is not resolved here.
    pub fn build(self) -> Result<GeminiProvider> {
        let credentials: Arc<dyn CredentialSource> = match (self.credentials, self.api_key) {
            (Some(source), _) => source,
            (None, Some(key)) => Arc::new(StaticCredential::new(key)),
            (None, None) => Arc::new(EnvCredential::default()),
        };

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if base_url.is_empty() {
            return Err(Error::InvalidRequest("base URL must not be empty".into()));
        }

        Ok(GeminiProvider {
            client: self.client.unwrap_or_default(),
            credentials,
            base_url,
        })
    }
}

/// Gemini image generation provider.
///
/// Stateless between calls: every request resolves the key again.
pub struct GeminiProvider {
    client: reqwest::Client,
    credentials: Arc<dyn CredentialSource>,
    base_url: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProviderBuilder`.
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }

    async fn generate_impl(&self, config: &GenerationConfig) -> Result<Vec<ImageResource>> {
        let start = Instant::now();

        let api_key = self
            .credentials
            .resolve()
            .ok_or(Error::MissingCredential)?;
        tracing::debug!(model = %config.model, "credential resolved");

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            config.model.as_str(),
        );
        let body = GeminiRequest::from_config(config);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        tracing::debug!(model = %config.model, "request sent");

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = error_message(status.as_u16(), &text);
            tracing::warn!(status = status.as_u16(), "Gemini API error: {message}");
            return Err(Error::from_provider(Some(status.as_u16()), message));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&text)
            .map_err(|e| Error::from_provider(None, format!("invalid Gemini response: {e}")))?;

        let images = gemini_response.into_images();
        tracing::debug!(
            count = images.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "response parsed"
        );

        if images.is_empty() {
            return Err(Error::NoImageProduced);
        }
        Ok(images)
    }
}

#[async_trait]
impl ImageProvider for GeminiProvider {
    async fn generate(&self, config: &GenerationConfig) -> Result<Vec<ImageResource>> {
        self.generate_impl(config).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

/// Pulls the provider's message out of an error body, falling back to the raw text.
fn error_message(status: u16, text: &str) -> String {
    if let Ok(body) = serde_json::from_str::<GeminiErrorBody>(text) {
        if !body.error.message.is_empty() {
            return body.error.message;
        }
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.to_string()
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Serialize)]
struct GeminiRequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    image_config: GeminiImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiImageConfig {
    aspect_ratio: &'static str,
    // The standard tier rejects unknown fields, so this must be omitted rather than null.
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<&'static str>,
}

impl GeminiRequest {
    fn from_config(config: &GenerationConfig) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiRequestPart {
                    text: config.prompt.clone(),
                }],
            }],
            generation_config: GeminiConfig {
                image_config: GeminiImageConfig {
                    aspect_ratio: config.aspect_ratio.as_str(),
                    image_size: config.effective_size().map(|s| s.as_str()),
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Option<Vec<GeminiPartResponse>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: String,
}

impl GeminiResponse {
    /// Collects the inline images of the first candidate. Later candidates are ignored.
    fn into_images(self) -> Vec<ImageResource> {
        self.candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.inline_data)
            .filter(|d| !d.data.is_empty())
            .map(|d| ImageResource::new(d.data, d.mime_type.as_deref()))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::SelectedKey;
    use crate::image::types::{AspectRatio, ImageSize, ModelTier};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PRO_PATH: &str = "/v1beta/models/gemini-3-pro-image-preview:generateContent";
    const STANDARD_PATH: &str = "/v1beta/models/gemini-2.5-flash-image:generateContent";

    fn provider_for(server: &MockServer) -> GeminiProvider {
        GeminiProvider::builder()
            .api_key("test-key")
            .base_url(server.uri())
            .build()
            .unwrap()
    }

    fn image_response(candidates: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "candidates": candidates }))
    }

    #[test]
    fn test_standard_tier_never_sends_image_size() {
        for size in [None, Some(ImageSize::Size1K), Some(ImageSize::Size4K)] {
            let mut config = GenerationConfig::new("A puppy").with_model(ModelTier::Standard);
            config.size = size;
            let json = serde_json::to_value(GeminiRequest::from_config(&config)).unwrap();
            let image_config = &json["generationConfig"]["imageConfig"];
            assert_eq!(image_config["aspectRatio"], "1:1");
            assert!(image_config.get("imageSize").is_none());
        }
    }

    #[test]
    fn test_pro_tier_sends_requested_size() {
        let config = GenerationConfig::new("A puppy")
            .with_model(ModelTier::Pro)
            .with_aspect_ratio(AspectRatio::Portrait)
            .with_size(ImageSize::Size2K);
        let json = serde_json::to_value(GeminiRequest::from_config(&config)).unwrap();
        assert_eq!(
            json["generationConfig"]["imageConfig"],
            json!({ "aspectRatio": "9:16", "imageSize": "2K" })
        );
    }

    #[test]
    fn test_pro_tier_without_size_omits_field() {
        let config = GenerationConfig::new("A puppy").with_model(ModelTier::Pro);
        let json = serde_json::to_value(GeminiRequest::from_config(&config)).unwrap();
        assert!(json["generationConfig"]["imageConfig"]
            .get("imageSize")
            .is_none());
    }

    #[test]
    fn test_prompt_is_sole_content_part() {
        let config = GenerationConfig::new("A puppy");
        let json = serde_json::to_value(GeminiRequest::from_config(&config)).unwrap();
        assert_eq!(json["contents"], json!([{ "parts": [{ "text": "A puppy" }] }]));
    }

    #[test]
    fn test_first_candidate_only() {
        let resp: GeminiResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [
                    { "inlineData": { "mimeType": "image/png", "data": "AAAA" } },
                    { "inlineData": { "mimeType": "image/jpeg", "data": "BBBB" } }
                ] } },
                { "content": { "parts": [
                    { "inlineData": { "mimeType": "image/png", "data": "CCCC" } }
                ] } }
            ]
        }))
        .unwrap();
        let images = resp.into_images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].data, "AAAA");
        assert_eq!(images[1].data, "BBBB");
        assert_eq!(images[1].mime_type, "image/jpeg");
    }

    #[test]
    fn test_missing_mime_type_defaults_to_png() {
        let resp: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Here you go" },
                { "inlineData": { "data": "AAAA" } },
                { "inlineData": { "mimeType": "image/webp", "data": "" } }
            ] } }]
        }))
        .unwrap();
        let images = resp.into_images();
        assert_eq!(images, vec![ImageResource::new("AAAA", Some("image/png"))]);
    }

    #[test]
    fn test_empty_shapes_yield_no_images() {
        for body in [
            json!({}),
            json!({ "candidates": [] }),
            json!({ "candidates": [{}] }),
            json!({ "candidates": [{ "content": {} }] }),
            json!({ "candidates": [{ "content": { "parts": [{ "text": "no" }] } }] }),
        ] {
            let resp: GeminiResponse = serde_json::from_value(body).unwrap();
            assert!(resp.into_images().is_empty());
        }
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
        assert_eq!(error_message(404, body), "Requested entity was not found.");
        assert_eq!(error_message(502, "  bad gateway \n"), "bad gateway");
        assert_eq!(error_message(503, ""), "HTTP 503");
    }

    #[test]
    fn test_builder_defaults() {
        let provider = GeminiProvider::builder().build().unwrap();
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(provider.name(), "Gemini (Google)");

        let provider = GeminiProvider::builder()
            .base_url("http://localhost:8080/")
            .build()
            .unwrap();
        assert_eq!(provider.base_url, "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_generate_returns_inline_images() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(STANDARD_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(image_response(json!([{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "AAAA" } },
                { "text": "A cute puppy." }
            ] } }])))
            .expect(1)
            .mount(&server)
            .await;

        let images = provider_for(&server)
            .generate(&GenerationConfig::new("A puppy"))
            .await
            .unwrap();

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].mime_type, "image/png");
        assert_eq!(images[0].data_uri(), "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    async fn test_generate_sends_size_for_pro() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PRO_PATH))
            .respond_with(image_response(json!([{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "AAAA" } }
            ] } }])))
            .expect(1)
            .mount(&server)
            .await;

        let config = GenerationConfig::new("A puppy")
            .with_model(ModelTier::Pro)
            .with_aspect_ratio(AspectRatio::Landscape)
            .with_size(ImageSize::Size4K);
        provider_for(&server).generate(&config).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            body["generationConfig"]["imageConfig"],
            json!({ "aspectRatio": "16:9", "imageSize": "4K" })
        );
    }

    #[tokio::test]
    async fn test_zero_candidates_is_no_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(image_response(json!([])))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .generate(&GenerationConfig::new("A puppy"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoImageProduced));
    }

    #[tokio::test]
    async fn test_text_only_success_is_no_image() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(image_response(json!([{ "content": { "parts": [
                { "text": "I can't draw that." }
            ] } }])))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .generate(&GenerationConfig::new("A puppy"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoImageProduced));
    }

    #[tokio::test]
    async fn test_entity_not_found_is_credential_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {
                    "code": 404,
                    "message": "Requested entity was not found.",
                    "status": "NOT_FOUND"
                }
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .generate(&GenerationConfig::new("A puppy").with_model(ModelTier::Pro))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CredentialNotFound(_)));
    }

    #[tokio::test]
    async fn test_other_errors_keep_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT"
                }
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .generate(&GenerationConfig::new("A puppy"))
            .await
            .unwrap_err();
        match err {
            Error::Provider { status, message } => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "API key not valid. Please pass a valid API key.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .generate(&GenerationConfig::new("A puppy"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider { status: None, .. }));
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(image_response(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let provider = GeminiProvider::builder()
            .credentials(SelectedKey::new())
            .base_url(server.uri())
            .build()
            .unwrap();
        let err = provider
            .generate(&GenerationConfig::new("A puppy"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingCredential));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_key_switch_applies_to_next_call() {
        let server = MockServer::start().await;
        let ok = || {
            image_response(json!([{ "content": { "parts": [
                { "inlineData": { "data": "AAAA" } }
            ] } }]))
        };
        Mock::given(header("x-goog-api-key", "first"))
            .respond_with(ok())
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(header("x-goog-api-key", "second"))
            .respond_with(ok())
            .expect(1)
            .mount(&server)
            .await;

        let key = SelectedKey::new();
        let provider = GeminiProvider::builder()
            .credentials(key.clone())
            .base_url(server.uri())
            .build()
            .unwrap();
        let config = GenerationConfig::new("A puppy");

        key.select("first");
        provider.generate(&config).await.unwrap();
        key.select("second");
        provider.generate(&config).await.unwrap();

        server.verify().await;
    }
}
