//! Host capabilities for delivering exported artifacts.
//!
//! Controllers never touch the filesystem or a clipboard directly; the host
//! injects whichever sinks fit its platform.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::info;

use crate::binary::ExportedFile;
use crate::error::{ExportError, ExportResult};

/// Receives binary files offered for download.
#[async_trait]
pub trait BlobSink: Send + Sync {
    async fn write_file(&self, bytes: &[u8], name: &str, mime_type: &str) -> ExportResult<()>;
}

/// Receives short text for the clipboard.
#[async_trait]
pub trait ClipboardSink: Send + Sync {
    async fn write_text(&self, text: &str) -> ExportResult<()>;
}

/// Writes files into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a file name inside the root, refusing anything that is not a
    /// bare file name.
    fn target(&self, name: &str) -> ExportResult<PathBuf> {
        let candidate = Path::new(name);
        match candidate.file_name() {
            Some(file_name) if file_name == candidate.as_os_str() => Ok(self.root.join(file_name)),
            _ => Err(ExportError::InvalidName(name.to_string())),
        }
    }
}

#[async_trait]
impl BlobSink for DirectorySink {
    async fn write_file(&self, bytes: &[u8], name: &str, mime_type: &str) -> ExportResult<()> {
        let path = self.target(name)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| ExportError::Write {
                name: name.to_string(),
                source,
            })?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| ExportError::Write {
                name: name.to_string(),
                source,
            })?;

        info!(
            path = %path.display(),
            mime_type = %mime_type,
            size = bytes.len(),
            "Exported file written"
        );
        Ok(())
    }
}

/// Keeps everything in memory; useful for embedding hosts and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<ExportedFile>>,
    clipboard: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> Vec<ExportedFile> {
        lock(&self.files).clone()
    }

    pub fn clipboard(&self) -> Vec<String> {
        lock(&self.clipboard).clone()
    }
}

#[async_trait]
impl BlobSink for MemorySink {
    async fn write_file(&self, bytes: &[u8], name: &str, mime_type: &str) -> ExportResult<()> {
        lock(&self.files).push(ExportedFile::new(bytes.to_vec(), name, mime_type));
        Ok(())
    }
}

#[async_trait]
impl ClipboardSink for MemorySink {
    async fn write_text(&self, text: &str) -> ExportResult<()> {
        lock(&self.clipboard).push(text.to_string());
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
