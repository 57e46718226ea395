//! Disposable per-request working directories.
//!
//! Every request gets a uniquely named directory that is bind-mounted into
//! each container created for it. Directories are disjoint by construction,
//! so concurrent requests never need locking on the filesystem.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// An ownership-exclusive scratch directory for one request.
///
/// The directory is removed recursively when the value is dropped, so every
/// exit path of the orchestrator (success, validation failure, adapter error)
/// reclaims it without explicit cleanup calls.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    /// Create a fresh workspace under `root` with a collision-free name.
    pub async fn create(root: &Path) -> Result<Self> {
        let path = root.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&path)
            .await
            .with_context(|| format!("Failed to create workspace: {}", path.display()))?;
        debug!(path = %path.display(), "created workspace");
        Ok(Self { path })
    }

    /// Host path of the workspace directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a file into the workspace, creating parent directories as
    /// needed (e.g. `src/lib.rs` for the Rust adapter layout).
    pub async fn write_file(&self, name: &str, contents: &str) -> Result<()> {
        let dest = self.path.join(name);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        tokio::fs::write(&dest, contents)
            .await
            .with_context(|| format!("Failed to write file: {}", dest.display()))
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove workspace");
            }
        } else {
            debug!(path = %self.path.display(), "removed workspace");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_makes_unique_directories() {
        let root = tempdir().unwrap();
        let a = Workspace::create(root.path()).await.unwrap();
        let b = Workspace::create(root.path()).await.unwrap();
        assert!(a.path().is_dir());
        assert!(b.path().is_dir());
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn test_write_file_with_nested_path() {
        let root = tempdir().unwrap();
        let ws = Workspace::create(root.path()).await.unwrap();
        ws.write_file("src/lib.rs", "fn answer() -> u8 { 42 }")
            .await
            .unwrap();
        let contents = std::fs::read_to_string(ws.path().join("src/lib.rs")).unwrap();
        assert!(contents.contains("42"));
    }

    #[tokio::test]
    async fn test_drop_removes_directory() {
        let root = tempdir().unwrap();
        let path = {
            let ws = Workspace::create(root.path()).await.unwrap();
            ws.write_file("solution.py", "pass").await.unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_tolerates_already_removed() {
        let root = tempdir().unwrap();
        let ws = Workspace::create(root.path()).await.unwrap();
        std::fs::remove_dir_all(ws.path()).unwrap();
        drop(ws); // must not panic
    }
}
