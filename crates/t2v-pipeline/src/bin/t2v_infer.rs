//! Run the generation pipeline over a prompt file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use t2v_models::{ArtifactNaming, GenerationRequest, MAX_TABLE_PROMPT_LEN};
use t2v_pipeline::{init_tracing, read_prompt_file, GenerationPipeline, PipelineConfig};
use t2v_storage::S3Client;

#[derive(Debug, Parser)]
#[command(name = "t2v-infer", about = "Generate videos for a prompt file and upload them")]
struct Args {
    /// Model config name
    #[arg(long)]
    model: String,

    /// Prompt file (.txt or .csv); defaults to PROMPTS_PATH
    #[arg(long = "prompt-path", alias = "prompt_path")]
    prompt_path: Option<PathBuf>,

    /// How generated files are matched to prompts
    #[arg(long)]
    naming: Option<ArtifactNaming>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = PipelineConfig::from_env();
    let prompt_path = args.prompt_path.unwrap_or_else(|| config.prompts_path.clone());

    let entries = read_prompt_file(&prompt_path)
        .await
        .with_context(|| format!("reading prompts from {}", prompt_path.display()))?;
    info!("Loaded {} prompts from {}", entries.len(), prompt_path.display());

    let mut request = GenerationRequest::new(&args.model, &entries, MAX_TABLE_PROMPT_LEN)?;
    if let Some(naming) = args.naming {
        request = request.with_naming(naming);
    }

    let store = Arc::new(S3Client::from_env().await?);
    let pipeline = GenerationPipeline::from_config(config, store)?;
    let outcome = pipeline.run(request).await?;

    if outcome.failed() > 0 {
        warn!("{} of {} prompts were not uploaded", outcome.failed(), outcome.results.len());
    }
    println!("{}", serde_json::to_string_pretty(&outcome.results)?);
    Ok(())
}
