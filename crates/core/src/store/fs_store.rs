//! Filesystem content store.

use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::layout::{parse_artifact_name, ArtifactKind, ContentLayout};
use super::{StoreError, StreamWriteError};
use crate::fileset_id::FilesetId;
use crate::metrics;

const PARTIAL_SUFFIX: &str = ".part";

/// An artifact already present in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingArtifact {
    pub path: PathBuf,
    pub fileset: FilesetId,
}

/// Writes chapter artifacts under a [`ContentLayout`].
///
/// Writes go to a `.part` sibling and are renamed into place, so a
/// final-named file is always complete.
#[derive(Debug, Clone)]
pub struct ContentStore {
    layout: ContentLayout,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            layout: ContentLayout::new(root),
        }
    }

    pub fn layout(&self) -> &ContentLayout {
        &self.layout
    }

    /// Whether `path` is a non-empty regular file.
    pub async fn is_complete(path: &Path) -> bool {
        match fs::metadata(path).await {
            Ok(meta) => meta.is_file() && meta.len() > 0,
            Err(_) => false,
        }
    }

    /// First complete artifact of `kind` for a chapter, from any fileset.
    ///
    /// Candidates are considered in file-name order. Empty files are ignored.
    pub async fn find_existing(
        &self,
        language: &str,
        work: &str,
        book: &str,
        chapter: u32,
        kind: ArtifactKind,
    ) -> Result<Option<ExistingArtifact>, StoreError> {
        let dir = self.layout.book_dir(language, work, book);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::read_dir_failed(dir, e)),
        };

        let mut matches = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::read_dir_failed(dir.clone(), e))?
        {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(fileset) = parse_artifact_name(name, book, chapter, kind) {
                matches.push(ExistingArtifact { path, fileset });
            }
        }
        matches.sort_by(|a, b| a.path.cmp(&b.path));

        for candidate in matches {
            if Self::is_complete(&candidate.path).await {
                return Ok(Some(candidate));
            }
            debug!(path = %candidate.path.display(), "Ignoring empty artifact");
        }
        Ok(None)
    }

    /// Write `bytes` to `destination` atomically. Returns the byte count.
    pub async fn write_atomic(&self, destination: &Path, bytes: &[u8]) -> Result<u64, StoreError> {
        if bytes.is_empty() {
            return Err(StoreError::EmptyContent {
                path: destination.to_path_buf(),
            });
        }
        create_parent(destination).await?;

        let partial = partial_path(destination);
        if let Err(e) = fs::write(&partial, bytes).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StoreError::WriteFailed {
                path: partial,
                source: e,
            });
        }

        commit(&partial, destination, bytes.len() as u64).await
    }

    /// Stream chunks into `destination` atomically. Returns the byte count.
    ///
    /// Chunks go straight to the `.part` file; a failing source or an empty
    /// stream leaves nothing behind.
    pub async fn write_stream_atomic<S, E>(
        &self,
        destination: &Path,
        mut chunks: S,
    ) -> Result<u64, StreamWriteError<E>>
    where
        S: Stream<Item = Result<Vec<u8>, E>> + Unpin,
    {
        create_parent(destination).await?;

        let partial = partial_path(destination);
        let written = match fill_partial(&partial, &mut chunks).await {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&partial).await;
                return Err(e);
            }
        };
        if written == 0 {
            let _ = fs::remove_file(&partial).await;
            return Err(StoreError::EmptyContent {
                path: destination.to_path_buf(),
            }
            .into());
        }

        Ok(commit(&partial, destination, written).await?)
    }
}

async fn create_parent(destination: &Path) -> Result<(), StoreError> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }
    Ok(())
}

async fn fill_partial<S, E>(partial: &Path, chunks: &mut S) -> Result<u64, StreamWriteError<E>>
where
    S: Stream<Item = Result<Vec<u8>, E>> + Unpin,
{
    let write_failed = |source| StoreError::WriteFailed {
        path: partial.to_path_buf(),
        source,
    };

    let mut file = fs::File::create(partial).await.map_err(write_failed)?;
    let mut written = 0u64;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(StreamWriteError::Source)?;
        file.write_all(&chunk).await.map_err(write_failed)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(write_failed)?;
    Ok(written)
}

/// Rename a finished `.part` file into place.
async fn commit(partial: &Path, destination: &Path, written: u64) -> Result<u64, StoreError> {
    if let Err(e) = fs::rename(partial, destination).await {
        warn!(path = %destination.display(), error = %e, "Failed to move artifact into place");
        let _ = fs::remove_file(partial).await;
        return Err(StoreError::move_failed(
            partial.to_path_buf(),
            destination.to_path_buf(),
            e,
        ));
    }

    metrics::BYTES_WRITTEN.inc_by(written);
    debug!(path = %destination.display(), bytes = written, "Artifact written");
    Ok(written)
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}
