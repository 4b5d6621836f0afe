//! Generation invoker: prepare the output directory and run the script.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use t2v_models::{ArtifactNaming, GenerationRequest, GenerationResult};

use crate::command::{GenerationCommand, GenerationRunner};
use crate::error::GeneratorResult;
use crate::fs_utils::{clear_stale_outputs, write_prompts_file};
use crate::registry::ResolvedModel;

/// Name of the prompts file materialized inside the output directory.
pub const PROMPTS_FILE_NAME: &str = "prompts.txt";

/// Settings for launching the generation script.
#[derive(Debug, Clone)]
pub struct InvokerSettings {
    /// Interpreter or launcher
    pub program: String,
    /// Inference script path
    pub script: PathBuf,
    /// Working directory for the process
    pub working_dir: Option<PathBuf>,
    /// Directory the script writes videos into
    pub output_dir: PathBuf,
    /// Extension of generated files
    pub extension: String,
}

impl Default for InvokerSettings {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            script: PathBuf::from("scripts/inference.py"),
            working_dir: None,
            output_dir: PathBuf::from("/data"),
            extension: "mp4".to_string(),
        }
    }
}

/// Runs the generation script for one request at a time.
#[derive(Debug, Clone)]
pub struct Invoker {
    settings: InvokerSettings,
    runner: GenerationRunner,
}

impl Invoker {
    pub fn new(settings: InvokerSettings) -> Self {
        Self {
            settings,
            runner: GenerationRunner::new(),
        }
    }

    pub fn settings(&self) -> &InvokerSettings {
        &self.settings
    }

    pub fn output_dir(&self) -> &Path {
        &self.settings.output_dir
    }

    pub fn prompts_path(&self) -> PathBuf {
        self.settings.output_dir.join(PROMPTS_FILE_NAME)
    }

    /// Build the command for `request` without running it.
    pub fn command_for(
        &self,
        request: &GenerationRequest,
        model: &ResolvedModel,
        naming: ArtifactNaming,
    ) -> GenerationCommand {
        GenerationCommand::new(&self.settings.program, &self.settings.script, &model.config_path)
            .save_dir(&self.settings.output_dir)
            .prompt_path(self.prompts_path())
            .prompt_as_path(naming == ArtifactNaming::PromptAsPath)
            .params(request.params().clone())
            .working_dir(self.settings.working_dir.clone())
    }

    /// Clear stale outputs, write the prompts file, and run the script.
    pub async fn invoke(
        &self,
        request: &GenerationRequest,
        model: &ResolvedModel,
        naming: ArtifactNaming,
    ) -> GeneratorResult<GenerationResult> {
        fs::create_dir_all(&self.settings.output_dir).await?;

        let removed = clear_stale_outputs(&self.settings.output_dir, &self.settings.extension).await?;
        if removed > 0 {
            info!("Removed {} stale output files", removed);
        }

        write_prompts_file(self.prompts_path(), request.prompts()).await?;

        let cmd = self.command_for(request, model, naming);
        self.runner.run(&cmd).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use t2v_models::{PromptEntry, MAX_PROMPT_LEN};

    const FAKE_SCRIPT: &str = r#"
save_dir=""
prompt_path=""
while [ $# -gt 0 ]; do
  case "$1" in
    --save-dir) save_dir="$2"; shift 2 ;;
    --prompt-path) prompt_path="$2"; shift 2 ;;
    *) shift ;;
  esac
done
while IFS= read -r line; do
  [ -n "$line" ] && : > "$save_dir/$line.mp4"
done < "$prompt_path"
"#;

    #[tokio::test]
    async fn test_invoke_clears_stale_files_and_runs() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        std::fs::create_dir(&output).unwrap();
        std::fs::write(output.join("stale.mp4"), b"old").unwrap();

        let script = dir.path().join("inference.sh");
        std::fs::write(&script, FAKE_SCRIPT).unwrap();

        let invoker = Invoker::new(InvokerSettings {
            program: "sh".to_string(),
            script,
            working_dir: None,
            output_dir: output.clone(),
            extension: "mp4".to_string(),
        });

        let request = GenerationRequest::new(
            "opensora-v1-2",
            &[PromptEntry::new("a beautiful waterfall")],
            MAX_PROMPT_LEN,
        )
        .unwrap();
        let model = ResolvedModel {
            name: "opensora-v1-2".to_string(),
            config_path: dir.path().join("opensora-v1-2.py"),
        };

        let result = invoker
            .invoke(&request, &model, ArtifactNaming::PromptAsPath)
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(!output.join("stale.mp4").exists());
        assert!(output.join("a beautiful waterfall.mp4").exists());
        assert_eq!(
            std::fs::read_to_string(output.join(PROMPTS_FILE_NAME)).unwrap(),
            "a beautiful waterfall\n"
        );
    }
}
