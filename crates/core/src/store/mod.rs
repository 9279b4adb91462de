//! Content store for downloaded chapter artifacts.
//!
//! Audio, text and timing artifacts are written under a fixed path scheme
//! (see [`ContentLayout`]). Every write is atomic: bytes land in a `.part`
//! sibling that is renamed into place, so an interrupted run never leaves a
//! final-named partial file behind, and existence checks only accept
//! non-empty regular files.

mod fs_store;
mod layout;

pub use fs_store::{ContentStore, ExistingArtifact};
pub use layout::{artifact_file_name, chapter_prefix, parse_artifact_name, ArtifactKind, ContentLayout};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while storing artifacts.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to create destination directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the temporary file.
    #[error("Failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move the temporary file into place.
    #[error("Failed to move file from {from} to {destination}")]
    MoveFailed {
        from: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Failed to list {path}")]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Refused to store an empty artifact.
    #[error("Refusing to write empty content to {path}")]
    EmptyContent { path: PathBuf },
}

/// Failure while streaming an artifact to disk.
#[derive(Debug, Error)]
pub enum StreamWriteError<E> {
    /// The chunk source failed before the artifact was complete.
    #[error(transparent)]
    Source(E),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StoreError {
    /// Creates a move failed error.
    pub fn move_failed(from: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed {
            from,
            destination,
            error,
        }
    }

    pub fn read_dir_failed(path: PathBuf, source: std::io::Error) -> Self {
        Self::ReadDirFailed { path, source }
    }
}
