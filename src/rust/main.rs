use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use veritas::{ArtifactKind, ClassificationResult, Classifier, ModelManager, ProvisioningConfig};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Classify a news text and route it by confidence",
    long_about = None
)]
struct Args {
    /// Text to classify. Read from --file or stdin when omitted
    text: Option<String>,

    /// Read the text from a file
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Directory holding the vectorizer and model artifacts
    #[arg(long, env = "VERITAS_MODELS_DIR")]
    models_dir: Option<PathBuf>,

    /// Lexicon for lemmatizing normalization; character filtering is used without it
    #[arg(long, env = "VERITAS_LEXICON")]
    lexicon: Option<PathBuf>,

    /// Download the vectorizer artifact before loading
    #[arg(long)]
    fetch_vectorizer: Option<String>,

    /// Download the model artifact before loading
    #[arg(long)]
    fetch_model: Option<String>,

    /// Print the result record as JSON
    #[arg(long)]
    json: bool,
}

fn read_input(args: &Args) -> Result<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path));
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read text from stdin")?;
    Ok(buffer)
}

async fn ensure_artifacts(manager: &ModelManager, args: &Args) -> Result<()> {
    let fetches = [
        (ArtifactKind::Vectorizer, &args.fetch_vectorizer),
        (ArtifactKind::Model, &args.fetch_model),
    ];
    for (kind, url) in fetches {
        if let Some(url) = url {
            info!("Fetching {} artifact...", kind);
            manager
                .fetch_artifact(kind, url)
                .await
                .with_context(|| format!("Failed to fetch {} from {}", kind, url))?;
        }
    }
    Ok(())
}

fn print_result(result: &ClassificationResult) {
    println!("Result: {}", result.classification());
    if let Some(confidence) = result.confidence() {
        println!("Confidence: {:.1}%", confidence * 100.0);
    }
    if let Some(message) = result.message() {
        println!("Message: {}", message);
    }
    if let Some(alternatives) = result.alternatives() {
        println!("All predictions:");
        for (label, probability) in alternatives {
            println!("  {}: {:.1}%", label, probability * 100.0);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    veritas::init_logger();
    let args = Args::parse();

    let mut config = ProvisioningConfig::from_env();
    if let Some(dir) = &args.models_dir {
        config.models_dir = dir.clone();
    }
    let manager = ModelManager::new(config).context("Failed to prepare models directory")?;
    ensure_artifacts(&manager, &args).await?;

    let text = read_input(&args)?;

    let start_time = Instant::now();
    let classifier = Classifier::builder()
        .with_resources(&manager)
        .with_lexicon(args.lexicon.as_deref())
        .build()?;
    info!("Classifier ready in {:.2?}: {:?}", start_time.elapsed(), classifier.info());

    let classify_start = Instant::now();
    let result = classifier.classify(&text);
    info!("Classification took {:.2?}", classify_start.elapsed());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.to_record())?);
    } else {
        print_result(&result);
    }
    Ok(())
}
