//! Basic image generation example.
//!
//! Run with: `cargo run --example generate_image`
//!
//! Requires `API_KEY` environment variable.

use imaginai::{AspectRatio, GeminiProvider, GenerationConfig, ImageProvider};

#[tokio::main]
async fn main() -> imaginai::Result<()> {
    let provider = GeminiProvider::builder().build()?;

    let config = GenerationConfig::new("A golden retriever puppy playing in snow")
        .with_aspect_ratio(AspectRatio::Landscape);
    let images = provider.generate(&config).await?;

    for (i, image) in images.iter().enumerate() {
        let path = format!("output-{i}.{}", image.extension());
        image.save(&path)?;
        println!("Generated image: {path} ({})", image.mime_type);
    }

    Ok(())
}
