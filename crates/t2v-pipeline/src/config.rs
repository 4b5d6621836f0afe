//! Pipeline and catalog configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use t2v_generator::InvokerSettings;
use t2v_models::ArtifactNaming;

/// Models published in the catalog unless `CATALOG_MODELS` says otherwise.
pub const DEFAULT_CATALOG_MODELS: &[&str] = &[
    "opensora-v1-2",
    "sora1.2-stdit-720p",
    "sora1.2-stdit-480p",
    "sora1.1-stdit-480p",
    "lambda-720p",
    "lambda-speedrun",
];

/// Legacy model labels renamed in the catalog.
pub const DEFAULT_LEGACY_ALIASES: &[(&str, &str)] = &[("lambda-speedrun", "lambda-720p")];

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Generation pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory the generation script writes into
    pub output_dir: PathBuf,
    /// Directory holding `<model>.py` configs
    pub model_config_dir: PathBuf,
    /// Interpreter or launcher for the script
    pub program: String,
    /// Inference script
    pub script: PathBuf,
    /// Working directory for the script process
    pub working_dir: Option<PathBuf>,
    /// Default prompt list for the inference CLI
    pub prompts_path: PathBuf,
    /// Extension of generated files
    pub extension: String,
    /// Naming policy when a request does not pick one
    pub naming: ArtifactNaming,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("/data"),
            model_config_dir: PathBuf::from("/app/custom_configs"),
            program: "python".to_string(),
            script: PathBuf::from("scripts/inference.py"),
            working_dir: None,
            prompts_path: PathBuf::from("/app/prompts.txt"),
            extension: "mp4".to_string(),
            naming: ArtifactNaming::PromptAsPath,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            output_dir: PathBuf::from(env_or("SAVE_DIR", "/data")),
            model_config_dir: PathBuf::from(env_or("MODEL_CONFIG_DIR", "/app/custom_configs")),
            program: env_or("GENERATOR_PROGRAM", "python"),
            script: PathBuf::from(env_or("GENERATOR_SCRIPT", "scripts/inference.py")),
            working_dir: std::env::var("GENERATOR_WORKDIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            prompts_path: PathBuf::from(env_or("PROMPTS_PATH", "/app/prompts.txt")),
            extension: env_or("VIDEO_EXTENSION", "mp4")
                .trim_start_matches('.')
                .to_ascii_lowercase(),
            naming: std::env::var("ARTIFACT_NAMING")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }

    /// Settings for the generation invoker.
    pub fn invoker_settings(&self) -> InvokerSettings {
        InvokerSettings {
            program: self.program.clone(),
            script: self.script.clone(),
            working_dir: self.working_dir.clone(),
            output_dir: self.output_dir.clone(),
            extension: self.extension.clone(),
        }
    }
}

/// Catalog rebuild configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Where the catalog CSV is written
    pub output_path: PathBuf,
    /// Models published in the catalog
    pub models: Vec<String>,
    /// Optional approved prompt/base_prompt table
    pub approved_prompts: Option<PathBuf>,
    /// Legacy model label renames
    pub aliases: BTreeMap<String, String>,
    /// Read `base_prompt` from object metadata
    pub fetch_metadata: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("frontend/db.csv"),
            models: DEFAULT_CATALOG_MODELS.iter().map(|m| m.to_string()).collect(),
            approved_prompts: None,
            aliases: DEFAULT_LEGACY_ALIASES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            fetch_metadata: false,
        }
    }
}

impl CatalogConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_path: std::env::var("CATALOG_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.output_path),
            models: std::env::var("CATALOG_MODELS")
                .ok()
                .map(|v| parse_list(&v))
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.models),
            approved_prompts: std::env::var("CATALOG_APPROVED_PROMPTS")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            aliases: std::env::var("CATALOG_LEGACY_ALIASES")
                .ok()
                .map(|v| parse_aliases(&v))
                .unwrap_or(defaults.aliases),
            fetch_metadata: std::env::var("CATALOG_FETCH_METADATA")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Parse a comma-separated list, dropping empty items.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `old=new,old2=new2`; malformed pairs are ignored.
pub fn parse_aliases(value: &str) -> BTreeMap<String, String> {
    value
        .split(',')
        .filter_map(|pair| {
            let (from, to) = pair.split_once('=')?;
            let (from, to) = (from.trim(), to.trim());
            (!from.is_empty() && !to.is_empty()).then(|| (from.to_string(), to.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("/data"));
        assert_eq!(config.naming, ArtifactNaming::PromptAsPath);
        assert_eq!(config.invoker_settings().program, "python");
    }

    #[test]
    fn test_catalog_defaults() {
        let config = CatalogConfig::default();
        assert_eq!(config.models.len(), 6);
        assert_eq!(config.aliases.get("lambda-speedrun").map(String::as_str), Some("lambda-720p"));
        assert!(!config.fetch_metadata);
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_parse_aliases() {
        let aliases = parse_aliases("old=new, bad, x = y,=z");
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases["old"], "new");
        assert_eq!(aliases["x"], "y");
    }
}
