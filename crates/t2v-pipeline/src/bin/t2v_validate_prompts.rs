//! Clean and validate a prompt file in place.

use std::path::PathBuf;

use clap::Parser;

use t2v_pipeline::{init_tracing, validate_prompt_file};

#[derive(Debug, Parser)]
#[command(name = "t2v-validate-prompts", about = "Validate and clean a prompt file")]
struct Args {
    /// Prompt file (.txt or .csv)
    #[arg(long = "prompt_path", alias = "prompt-path")]
    prompt_path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let entries = validate_prompt_file(&args.prompt_path).await?;
    println!("{}: {} prompts ok", args.prompt_path.display(), entries.len());
    Ok(())
}
