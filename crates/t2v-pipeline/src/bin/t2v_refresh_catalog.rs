//! Rebuild the viewer catalog from the bucket.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use t2v_pipeline::{init_tracing, CatalogConfig, CatalogRebuilder};
use t2v_storage::S3Client;

#[derive(Debug, Parser)]
#[command(name = "t2v-refresh-catalog", about = "Regenerate the catalog CSV from bucket contents")]
struct Args {
    /// Output catalog path; defaults to CATALOG_PATH
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Approved prompts table (.csv or .txt)
    #[arg(long)]
    approved: Option<PathBuf>,

    /// Read base prompts from object metadata
    #[arg(long)]
    with_metadata: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let mut config = CatalogConfig::from_env();
    if let Some(path) = args.csv {
        config.output_path = path;
    }
    if args.approved.is_some() {
        config.approved_prompts = args.approved;
    }
    config.fetch_metadata |= args.with_metadata;

    let store = Arc::new(S3Client::from_env().await?);
    let report = CatalogRebuilder::new(store, config).rebuild().await?;

    println!(
        "wrote {} rows to {} ({} keys skipped, {} other models, {} unapproved prompts)",
        report.rows,
        report.path.display(),
        report.skipped_keys,
        report.filtered_models,
        report.dropped_prompts.len()
    );
    Ok(())
}
