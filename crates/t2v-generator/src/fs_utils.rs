//! Filesystem helpers for the shared output directory.
//!
//! Every run both reads and destructively clears the output directory, so
//! callers must not run two generations against the same directory at once.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use t2v_models::PromptEntry;

use crate::error::GeneratorResult;

/// Whether `path` has extension `ext` (case-insensitive).
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext.trim_start_matches('.')))
}

/// List regular files in `dir` with extension `ext`, sorted by file name.
pub async fn list_outputs(dir: impl AsRef<Path>, ext: &str) -> GeneratorResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut files = Vec::new();

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
        Err(e) => return Err(e.into()),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !has_extension(&path, ext) {
            continue;
        }
        if entry.file_type().await?.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Remove output files left over from a previous run.
///
/// Returns the number of files removed.
pub async fn clear_stale_outputs(dir: impl AsRef<Path>, ext: &str) -> GeneratorResult<usize> {
    let stale = list_outputs(dir, ext).await?;
    let mut removed = 0;

    for path in stale {
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed file: {}", path.display());
                removed += 1;
            }
            // Already gone is fine
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(removed)
}

/// Write prompts one per line, creating parent directories as needed.
pub async fn write_prompts_file(path: impl AsRef<Path>, prompts: &[PromptEntry]) -> GeneratorResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut contents = String::new();
    for entry in prompts {
        contents.push_str(&entry.prompt);
        contents.push('\n');
    }

    fs::write(path, contents).await?;
    debug!("Wrote {} prompts to {}", prompts.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_outputs_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["sample_0002.mp4", "sample_0001.MP4", "notes.txt", "sample_0000.mp4"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("folder.mp4")).unwrap();

        let files = list_outputs(dir.path(), "mp4").await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["sample_0000.mp4", "sample_0001.MP4", "sample_0002.mp4"]);
    }

    #[tokio::test]
    async fn test_list_outputs_missing_dir() {
        let files = list_outputs("/definitely/not/here", "mp4").await.unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_clear_stale_outputs_keeps_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("prompts.txt"), b"p\n").unwrap();

        let removed = clear_stale_outputs(dir.path(), "mp4").await.unwrap();
        assert_eq!(removed, 1);
        assert!(!dir.path().join("old.mp4").exists());
        assert!(dir.path().join("prompts.txt").exists());
    }

    #[tokio::test]
    async fn test_write_prompts_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prompts.txt");
        let prompts = vec![PromptEntry::new("one"), PromptEntry::with_base("two", "base")];

        write_prompts_file(&path, &prompts).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }
}
