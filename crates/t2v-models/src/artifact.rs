//! Generation results and collected artifacts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Outcome of one run of the generation program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Exit code; `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// A generated video file waiting to be uploaded.
///
/// The uploader owns the local file: it deletes it once the remote copy is
/// confirmed, and leaves it in place otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub prompt: String,
    #[serde(default)]
    pub base_prompt: String,
    pub model: String,
}

impl Artifact {
    pub fn new(
        path: impl Into<PathBuf>,
        prompt: impl Into<String>,
        base_prompt: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            prompt: prompt.into(),
            base_prompt: base_prompt.into(),
            model: model.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File extension without the dot, lowercased (`mp4` when missing).
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_else(|| "mp4".to_string())
    }

    /// MIME type derived from the file extension.
    pub fn content_type(&self) -> &'static str {
        match self.extension().as_str() {
            "mp4" => "video/mp4",
            "webm" => "video/webm",
            "gif" => "image/gif",
            "mov" => "video/quicktime",
            _ => "application/octet-stream",
        }
    }
}
