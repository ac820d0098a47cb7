//! # IO Utilities
//!
//! File system operations for the `.ideation` runtime directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the runtime directory under the working directory
pub const RUNTIME_DIR: &str = ".ideation";

/// Get the runtime directory path (.ideation)
pub fn get_runtime_path() -> PathBuf {
    // Check for environment variable override
    if let Ok(path) = std::env::var("IDEATION_RUNTIME_PATH") {
        return PathBuf::from(path);
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(RUNTIME_DIR)
}

/// Read a file from a runtime directory
pub async fn read_file(root: &Path, relative_path: impl AsRef<Path>) -> Result<String> {
    let path = root.join(relative_path.as_ref());
    fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read file: {:?}", path))
}

/// Write a file into a runtime directory, creating parents as needed
pub async fn write_runtime_file(
    root: &Path,
    relative_path: impl AsRef<Path>,
    content: &str,
) -> Result<PathBuf> {
    let path = root.join(relative_path);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create runtime directory: {:?}", parent))?;
    }

    fs::write(&path, content)
        .await
        .with_context(|| format!("Failed to write file: {:?}", path))?;
    Ok(path)
}

/// Check if a runtime file exists
pub async fn file_exists(root: &Path, relative_path: impl AsRef<Path>) -> bool {
    let path = root.join(relative_path);
    fs::metadata(&path).await.is_ok()
}
