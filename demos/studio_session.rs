//! Gallery session with the pro tier.
//!
//! Run with: `cargo run --example studio_session`
//!
//! Requires `API_KEY` environment variable with billing enabled for the pro model.

use imaginai::{
    GeminiProvider, GenerationConfig, ImageSize, ModelTier, Studio, StudioOutcome,
};

#[tokio::main]
async fn main() -> imaginai::Result<()> {
    let mut studio = Studio::new(GeminiProvider::builder().build()?);

    let prompts = ["A lighthouse at dusk", "The same lighthouse in a storm"];
    for prompt in prompts {
        let config = GenerationConfig::new(prompt)
            .with_model(ModelTier::Pro)
            .with_size(ImageSize::Size2K);
        match studio.generate(&config).await {
            Ok(StudioOutcome::Generated(items)) => {
                println!("{prompt}: {} image(s)", items.len());
            }
            Ok(StudioOutcome::KeySelectionRequired) => {
                eprintln!("API key not accepted, select a key with billing enabled");
                return Ok(());
            }
            Err(e) => eprintln!("{prompt}: {e}"),
        }
    }

    for item in studio.gallery() {
        item.resource.save(item.download_file_name())?;
        println!("{} {} {}", item.created_at, item.model.label(), item.prompt);
    }

    Ok(())
}
