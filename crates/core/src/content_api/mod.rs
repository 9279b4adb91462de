//! Content API integration.
//!
//! Clients for the remote scripture content service: per-chapter audio
//! locations, verse text, timing payloads, media bytes, and the paginated
//! catalog that feeds classification.

mod client;
mod fetcher;
mod types;

pub use client::DbpClient;
pub use fetcher::{CatalogFetcher, FetchReport};
pub use types::*;

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::fileset_id::FilesetId;

/// Errors that can occur when talking to the content API.
///
/// A successful response that carries no usable content is `Ok(None)`
/// from the client methods, never an error.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request exceeded its timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing or rejected API key).
    #[error("Client not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl FetchError {
    /// Whether the failure happened in transport rather than in the API.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::HttpError(_) | Self::Timeout(_))
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::HttpError(err)
        }
    }
}

/// Media body, delivered chunk by chunk as it arrives.
pub type MediaStream = BoxStream<'static, Result<Vec<u8>, FetchError>>;

/// Per-chapter content retrieval.
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Retrievable media location for one chapter of an audio fileset.
    async fn audio_location(
        &self,
        fileset: &FilesetId,
        book: &str,
        chapter: u32,
    ) -> Result<Option<String>, FetchError>;

    /// Open the media body at a location returned by [`Self::audio_location`].
    ///
    /// Status errors surface here; transport errors while reading the body
    /// surface as stream items.
    async fn download_media(&self, url: &str) -> Result<MediaStream, FetchError>;

    /// Verse text of one chapter, one verse per line.
    async fn chapter_text(
        &self,
        fileset: &FilesetId,
        book: &str,
        chapter: u32,
    ) -> Result<Option<String>, FetchError>;

    /// Timing payload for one chapter of an audio fileset.
    async fn chapter_timing(
        &self,
        fileset: &FilesetId,
        book: &str,
        chapter: u32,
    ) -> Result<Option<serde_json::Value>, FetchError>;
}

/// Source of raw catalog pages.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// One page of the catalog, as returned by the service.
    async fn catalog_page(&self, page: u32, limit: u32)
        -> Result<serde_json::Value, FetchError>;
}
