//! Generation command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::{debug, info, warn};

use t2v_models::{GenerationParams, GenerationResult};

use crate::error::{GeneratorError, GeneratorResult};

/// Builder for generation script invocations.
///
/// Argument order is fixed: script, model config, then flags.
#[derive(Debug, Clone)]
pub struct GenerationCommand {
    /// Interpreter or launcher (e.g. `python`)
    program: String,
    /// Inference script passed as the first argument
    script: PathBuf,
    /// Model config file
    config: PathBuf,
    /// Directory the script writes videos into
    save_dir: PathBuf,
    /// File with one prompt per line
    prompt_path: PathBuf,
    /// Whether the script should name files after prompts
    prompt_as_path: bool,
    /// Optional generation parameters
    params: GenerationParams,
    /// Working directory for the process
    working_dir: Option<PathBuf>,
}

impl GenerationCommand {
    /// Create a new generation command.
    pub fn new(
        program: impl Into<String>,
        script: impl AsRef<Path>,
        config: impl AsRef<Path>,
    ) -> Self {
        Self {
            program: program.into(),
            script: script.as_ref().to_path_buf(),
            config: config.as_ref().to_path_buf(),
            save_dir: PathBuf::from("/data"),
            prompt_path: PathBuf::from("/data/prompts.txt"),
            prompt_as_path: false,
            params: GenerationParams::default(),
            working_dir: None,
        }
    }

    /// Set the output directory.
    pub fn save_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.save_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the prompts file.
    pub fn prompt_path(mut self, path: impl AsRef<Path>) -> Self {
        self.prompt_path = path.as_ref().to_path_buf();
        self
    }

    /// Ask the script to name each output file after its prompt.
    pub fn prompt_as_path(mut self, enabled: bool) -> Self {
        self.prompt_as_path = enabled;
        self
    }

    /// Set generation parameters.
    pub fn params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Set the process working directory.
    pub fn working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Build the command arguments (everything after the program).
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            self.script.to_string_lossy().to_string(),
            self.config.to_string_lossy().to_string(),
            "--save-dir".to_string(),
            self.save_dir.to_string_lossy().to_string(),
            "--prompt-path".to_string(),
            self.prompt_path.to_string_lossy().to_string(),
        ];

        if self.prompt_as_path {
            args.push("--prompt-as-path".to_string());
        }

        if let Some(ref num_frames) = self.params.num_frames {
            args.push("--num-frames".to_string());
            args.push(num_frames.as_str().to_string());
        }

        if let Some(resolution) = self.params.resolution {
            args.push("--resolution".to_string());
            args.push(resolution.as_arg().to_string());
        }

        if let Some(aspect_ratio) = self.params.aspect_ratio {
            args.push("--aspect-ratio".to_string());
            args.push(aspect_ratio.as_arg().to_string());
        }

        args
    }

    /// Resolve the script path against the working directory.
    fn resolved_script(&self) -> PathBuf {
        match (&self.working_dir, self.script.is_relative()) {
            (Some(dir), true) => dir.join(&self.script),
            _ => self.script.clone(),
        }
    }
}

/// Runs generation commands to completion.
///
/// There is no timeout: a hung generation process blocks the caller.
#[derive(Debug, Default, Clone)]
pub struct GenerationRunner;

impl GenerationRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run the command and capture both output streams.
    ///
    /// A non-zero exit is returned as a normal [`GenerationResult`]; only a
    /// failure to start the process is an error.
    pub async fn run(&self, cmd: &GenerationCommand) -> GeneratorResult<GenerationResult> {
        check_program(cmd.program())?;

        let script = cmd.resolved_script();
        if !script.exists() {
            return Err(GeneratorError::invocation(format!(
                "generation script not found: {}",
                script.display()
            )));
        }

        let args = cmd.build_args();
        debug!("Running command: {} {}", cmd.program(), args.join(" "));

        let mut command = Command::new(cmd.program());
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref dir) = cmd.working_dir {
            command.current_dir(dir);
        }

        let start = Instant::now();
        let output = command.output().await.map_err(|e| {
            GeneratorError::invocation(format!("failed to start {}: {}", cmd.program(), e))
        })?;

        let result = GenerationResult {
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        debug!("Command output: {}", result.stdout);
        if result.success {
            info!(
                duration_ms = start.elapsed().as_millis() as u64,
                "Generation process finished"
            );
            if !result.stderr.is_empty() {
                debug!("Command error output: {}", result.stderr);
            }
        } else {
            warn!(
                exit_code = ?result.exit_code,
                duration_ms = start.elapsed().as_millis() as u64,
                "Generation process failed: {}",
                result.stderr
            );
        }

        Ok(result)
    }
}

/// Check that the generation program is resolvable.
pub fn check_program(program: &str) -> GeneratorResult<PathBuf> {
    which::which(program)
        .map_err(|_| GeneratorError::invocation(format!("{} not found in PATH", program)))
}
