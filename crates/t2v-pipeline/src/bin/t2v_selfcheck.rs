use std::path::Path;

use t2v_generator::{check_program, ModelRegistry};
use t2v_pipeline::PipelineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = PipelineConfig::from_env();

    println!(
        "t2v-selfcheck: starting with output_dir={}",
        config.output_dir.display()
    );
    ensure_output_dir(&config.output_dir).await?;
    ensure_generator(&config)?;
    ensure_models(&config.model_config_dir)?;

    println!("t2v-selfcheck: ok");
    Ok(())
}

async fn ensure_output_dir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path).await?;
    let marker = path.join(".t2v-selfcheck");
    tokio::fs::write(&marker, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("output dir {} not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&marker).await?;
    Ok(())
}

fn ensure_generator(config: &PipelineConfig) -> anyhow::Result<()> {
    check_program(&config.program)?;

    let script = match &config.working_dir {
        Some(dir) if config.script.is_relative() => dir.join(&config.script),
        _ => config.script.clone(),
    };
    if !script.is_file() {
        return Err(anyhow::anyhow!(
            "generation script not found: {}",
            script.display()
        ));
    }
    Ok(())
}

fn ensure_models(dir: &Path) -> anyhow::Result<()> {
    let registry = ModelRegistry::discover(dir)?;
    if registry.is_empty() {
        return Err(anyhow::anyhow!("no model configs in {}", dir.display()));
    }
    println!("t2v-selfcheck: models {}", registry.names().join(", "));
    Ok(())
}
