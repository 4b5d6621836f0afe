//! Upload videos already sitting in the output directory.

use std::sync::Arc;

use clap::Parser;

use t2v_pipeline::{init_tracing, GenerationPipeline, PipelineConfig};
use t2v_storage::S3Client;

#[derive(Debug, Parser)]
#[command(name = "t2v-export", about = "Upload existing prompt-named videos for a model")]
struct Args {
    /// Model the videos were generated with
    #[arg(long)]
    model: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = PipelineConfig::from_env();
    let store = Arc::new(S3Client::from_env().await?);
    let pipeline = GenerationPipeline::from_config(config, store)?;

    let outcome = pipeline.export_existing(&args.model).await?;
    println!("{}", serde_json::to_string_pretty(&outcome.results)?);
    Ok(())
}
