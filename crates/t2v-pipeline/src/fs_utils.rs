//! File helpers.

use std::path::{Path, PathBuf};

use tokio::fs;

/// Temporary sibling used while replacing `path`.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

/// Replace `path` with `contents` via a temp file and rename, so readers
/// never see a half-written file.
pub async fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let tmp = temp_sibling(path);
    fs::write(&tmp, contents).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        fs::remove_file(&tmp).await.ok();
        return Err(e);
    }
    Ok(())
}
