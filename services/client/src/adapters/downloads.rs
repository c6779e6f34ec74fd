//! services/client/src/adapters/downloads.rs
//!
//! Saves generated documents into the download directory.
//! It implements the `DownloadSink` port from the `core` crate.

use async_trait::async_trait;
use paper_desk_core::{DownloadSink, PortError, PortResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Clone)]
pub struct FsDownloadSink {
    dir: PathBuf,
}

impl FsDownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DownloadSink for FsDownloadSink {
    /// Writes into a temporary file first and moves it into place once complete,
    /// so a half-written document never carries the final name.
    async fn save(&self, filename: &str, bytes: &[u8]) -> PortResult<PathBuf> {
        let dir = self.dir.clone();
        let filename = filename.to_string();
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || -> std::io::Result<PathBuf> {
            std::fs::create_dir_all(&dir)?;
            let mut staged = NamedTempFile::new_in(&dir)?;
            staged.write_all(&bytes)?;
            let target = available_path(&dir, &filename);
            staged.persist_noclobber(&target).map_err(|e| e.error)?;
            Ok(target)
        })
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?
        .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

/// `name.ext`, or `name (1).ext`, `name (2).ext`... for the first name not taken.
fn available_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let extension = path.extension().and_then(|e| e.to_str());
    (1..)
        .map(|n| match extension {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn saves_under_given_name_without_clobbering() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsDownloadSink::new(dir.path().join("out"));

        let first = sink.save("notes.docx", b"one").await.unwrap();
        let second = sink.save("notes.docx", b"two").await.unwrap();

        assert_eq!(first, dir.path().join("out/notes.docx"));
        assert_eq!(second, dir.path().join("out/notes (1).docx"));
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");

        // Only the two documents remain; the staging files were consumed.
        assert_eq!(std::fs::read_dir(dir.path().join("out")).unwrap().count(), 2);
    }
}
