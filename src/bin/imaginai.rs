//! CLI for ImaginAI - prompt-to-image generation.

use async_trait::async_trait;
use clap::{Args, Parser, Subcommand, ValueEnum};
use imaginai::{
    AspectRatio, CredentialSource, EnvCredential, GalleryItem, GeminiProvider, GenerationConfig,
    ImageProvider, ImageSize, KeyGate, KeySelectionHost, ModelTier, SelectedKey, Studio,
    StudioOutcome,
};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imaginai")]
#[command(about = "Turn words into images with the Gemini image models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate images from a text prompt
    Generate(GenerateArgs),

    /// List available model tiers
    Models,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt describing the image
    prompt: String,

    /// Model tier to use
    #[arg(short, long, value_enum, default_value = "standard")]
    model: ModelArg,

    /// Aspect ratio
    #[arg(short, long, value_enum, default_value = "1:1")]
    aspect_ratio: AspectRatioArg,

    /// Output resolution (pro tier only)
    #[arg(short, long, value_enum)]
    size: Option<SizeArg>,

    /// Directory the images are written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Environment variable holding the API key
    #[arg(long, default_value = imaginai::credentials::DEFAULT_API_KEY_ENV)]
    api_key_env: String,

    /// Override the API endpoint
    #[arg(long, env = "IMAGINAI_BASE_URL")]
    base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Standard,
    Pro,
}

impl From<ModelArg> for ModelTier {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Standard => ModelTier::Standard,
            ModelArg::Pro => ModelTier::Pro,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "1:1")]
    Square,
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
    #[value(name = "4:3")]
    Standard,
    #[value(name = "3:4")]
    StandardPortrait,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Square => AspectRatio::Square,
            AspectRatioArg::Landscape => AspectRatio::Landscape,
            AspectRatioArg::Portrait => AspectRatio::Portrait,
            AspectRatioArg::Standard => AspectRatio::Standard,
            AspectRatioArg::StandardPortrait => AspectRatio::StandardPortrait,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SizeArg {
    #[value(name = "1K")]
    Size1K,
    #[value(name = "2K")]
    Size2K,
    #[value(name = "4K")]
    Size4K,
}

impl From<SizeArg> for ImageSize {
    fn from(arg: SizeArg) -> Self {
        match arg {
            SizeArg::Size1K => ImageSize::Size1K,
            SizeArg::Size2K => ImageSize::Size2K,
            SizeArg::Size4K => ImageSize::Size4K,
        }
    }
}

/// Asks for an API key on the terminal and stores it in the shared slot.
struct TerminalKeySelector {
    key: SelectedKey,
}

#[async_trait]
impl KeySelectionHost for TerminalKeySelector {
    async fn has_selected_api_key(&self) -> bool {
        self.key.resolve().is_some()
    }

    async fn open_select_key(&self) -> imaginai::Result<()> {
        let line = tokio::task::spawn_blocking(|| -> std::io::Result<String> {
            let mut stderr = std::io::stderr();
            writeln!(
                stderr,
                "The pro model needs an API key from a Google Cloud project with billing enabled."
            )?;
            writeln!(stderr, "See https://ai.google.dev/gemini-api/docs/billing")?;
            write!(stderr, "API key: ")?;
            stderr.flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            Ok(line)
        })
        .await
        .map_err(|e| imaginai::Error::KeySelection(e.to_string()))??;

        if line.trim().is_empty() {
            return Err(imaginai::Error::KeySelection("no key entered".into()));
        }
        self.key.select(line);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => {
            generate(args, cli.json).await?;
        }
        Commands::Models => {
            list_models(cli.json)?;
        }
    }

    Ok(())
}

fn build_config(args: &GenerateArgs) -> anyhow::Result<GenerationConfig> {
    let model = ModelTier::from(args.model);
    if args.size.is_some() && !model.supports_size() {
        anyhow::bail!("--size requires the pro model (--model pro)");
    }

    let mut config = GenerationConfig::new(&args.prompt)
        .with_model(model)
        .with_aspect_ratio(args.aspect_ratio.into());
    if let Some(size) = args.size {
        config = config.with_size(size.into());
    }
    Ok(config)
}

/// Generates once, and once more after a successful key selection.
async fn generate_with_key_selection<P: ImageProvider>(
    studio: &mut Studio<P>,
    config: &GenerationConfig,
) -> anyhow::Result<Vec<GalleryItem>> {
    let mut outcome = studio.generate(config).await?;
    if let StudioOutcome::KeySelectionRequired = outcome {
        studio.connect_key().await?;
        outcome = studio.generate(config).await?;
    }
    match outcome {
        StudioOutcome::Generated(items) => Ok(items),
        StudioOutcome::KeySelectionRequired => {
            anyhow::bail!("the selected API key was not accepted; select a different key")
        }
    }
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    // Validate flag compatibility before any request
    let config = build_config(&args)?;

    let key = SelectedKey::with_fallback(EnvCredential::new(&args.api_key_env));
    let mut builder = GeminiProvider::builder().credentials(key.clone());
    if let Some(ref url) = args.base_url {
        builder = builder.base_url(url);
    }
    let gate = KeyGate::with_host(TerminalKeySelector { key });
    let mut studio = Studio::with_gate(builder.build()?, gate);

    let items = generate_with_key_selection(&mut studio, &config).await?;

    std::fs::create_dir_all(&args.out_dir)?;
    let mut saved = Vec::with_capacity(items.len());
    for item in &items {
        let path = args.out_dir.join(item.download_file_name());
        item.resource.save(&path)?;
        saved.push(path);
    }

    if json_output {
        let images: Vec<_> = items
            .iter()
            .zip(&saved)
            .map(|(item, path)| {
                serde_json::json!({
                    "id": item.id,
                    "output": path.display().to_string(),
                    "mime_type": item.resource.mime_type,
                    "created_at": item.created_at,
                })
            })
            .collect();
        let result = serde_json::json!({
            "success": true,
            "prompt": config.prompt,
            "model": config.model.as_str(),
            "aspect_ratio": config.aspect_ratio.as_str(),
            "size": config.effective_size().map(|s| s.as_str()),
            "images": images,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for path in &saved {
            println!("Generated image: {}", path.display());
        }
        println!("{} image(s) via {}", saved.len(), config.model.label());
    }

    Ok(())
}

fn list_models(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ModelInfo {
        tier: &'static str,
        name: &'static str,
        id: &'static str,
        sizes: bool,
        key_selection: bool,
    }

    let models: Vec<ModelInfo> = [ModelTier::Standard, ModelTier::Pro]
        .into_iter()
        .map(|tier| ModelInfo {
            tier: match tier {
                ModelTier::Standard => "standard",
                ModelTier::Pro => "pro",
            },
            name: tier.label(),
            id: tier.as_str(),
            sizes: tier.supports_size(),
            key_selection: tier.is_privileged(),
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else {
        println!("Available models:\n");
        for m in &models {
            println!("  {} - {} ({})", m.tier, m.name, m.id);
            if m.sizes {
                println!("    Sizes: 1K, 2K, 4K");
            }
            if m.key_selection {
                println!("    Requires a selected key with billing enabled");
            }
        }
    }

    Ok(())
}
