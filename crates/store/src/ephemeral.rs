//! Scoped ephemeral files for staged transfers.

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A uniquely named temporary file scoped to one transfer.
///
/// The file exists (zero-length) from allocation onward and is removed when
/// the guard drops, on every exit path including mid-stream cancellation.
/// There is no way to detach the path from the guard: whoever needs the file
/// alive must own the guard.
#[derive(Debug)]
pub struct EphemeralFile {
    path: PathBuf,
}

impl EphemeralFile {
    /// Allocate a fresh ephemeral file under `dir`.
    pub async fn allocate(dir: &Path) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(Uuid::new_v4().to_string());
        tokio::fs::File::create(&path).await?;
        Ok(Self { path })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for EphemeralFile {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), %err, "failed to remove ephemeral file");
            }
        }
    }
}
