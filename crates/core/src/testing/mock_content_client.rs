//! Mock content API for testing.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::content_api::{CatalogSource, ContentClient, FetchError, MediaStream};
use crate::fileset_id::FilesetId;

/// Content operation, used to target failures and filter recorded calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentOperation {
    AudioLocation,
    DownloadMedia,
    ChapterText,
    ChapterTiming,
}

/// A recorded content API call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedContentCall {
    pub operation: ContentOperation,
    /// Fileset id, or the URL for media downloads.
    pub target: String,
    pub book: String,
    pub chapter: u32,
}

type ChapterKey = (String, String, u32);

/// Media bodies are served in chunks of this size.
const MEDIA_CHUNK: usize = 4;

fn media_url(fileset: &str, book: &str, chapter: u32) -> String {
    format!("mock://media/{}/{}/{}.mp3", fileset, book, chapter)
}

fn key(fileset: &str, book: &str, chapter: u32) -> ChapterKey {
    (fileset.to_string(), book.to_string(), chapter)
}

/// Mock implementation of [`ContentClient`] and [`CatalogSource`].
///
/// Provides controllable behavior for testing:
/// - Configurable per-chapter audio, text and timing responses
/// - Transport failures for specific units, including media bodies that
///   break off after the first chunk
/// - Call recording for assertions
///
/// Units with no configured response return "not available".
///
/// # Example
///
/// ```rust,ignore
/// use versekit_core::testing::MockContentClient;
///
/// let client = MockContentClient::new();
/// client.add_audio("ENGWEBN1DA", "MAT", 1, b"ID3".to_vec()).await;
///
/// let url = client.audio_location(&"ENGWEBN1DA".into(), "MAT", 1).await?;
/// assert!(url.is_some());
/// ```
#[derive(Debug)]
pub struct MockContentClient {
    audio_locations: Arc<RwLock<HashMap<ChapterKey, String>>>,
    media: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    texts: Arc<RwLock<HashMap<ChapterKey, String>>>,
    timings: Arc<RwLock<HashMap<ChapterKey, Value>>>,
    /// Units that fail with a transport error.
    failures: Arc<RwLock<HashSet<(ContentOperation, ChapterKey)>>>,
    /// Media URLs whose body fails after the first chunk.
    interrupted_media: Arc<RwLock<HashSet<String>>>,
    catalog_pages: Arc<RwLock<Vec<Value>>>,
    catalog_requests: Arc<RwLock<Vec<(u32, u32)>>>,
    calls: Arc<RwLock<Vec<RecordedContentCall>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<FetchError>>>,
}

impl Default for MockContentClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockContentClient {
    pub fn new() -> Self {
        Self {
            audio_locations: Arc::new(RwLock::new(HashMap::new())),
            media: Arc::new(RwLock::new(HashMap::new())),
            texts: Arc::new(RwLock::new(HashMap::new())),
            timings: Arc::new(RwLock::new(HashMap::new())),
            failures: Arc::new(RwLock::new(HashSet::new())),
            interrupted_media: Arc::new(RwLock::new(HashSet::new())),
            catalog_pages: Arc::new(RwLock::new(Vec::new())),
            catalog_requests: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Make a chapter of an audio fileset downloadable with the given bytes.
    pub async fn add_audio(&self, fileset: &str, book: &str, chapter: u32, bytes: Vec<u8>) {
        let url = media_url(fileset, book, chapter);
        self.audio_locations
            .write()
            .await
            .insert(key(fileset, book, chapter), url.clone());
        self.media.write().await.insert(url, bytes);
    }

    /// Return a location whose download yields nothing.
    pub async fn add_audio_location(&self, fileset: &str, book: &str, chapter: u32, url: &str) {
        self.audio_locations
            .write()
            .await
            .insert(key(fileset, book, chapter), url.to_string());
    }

    pub async fn add_text(&self, fileset: &str, book: &str, chapter: u32, text: &str) {
        self.texts
            .write()
            .await
            .insert(key(fileset, book, chapter), text.to_string());
    }

    pub async fn add_timing(&self, fileset: &str, book: &str, chapter: u32, timing: Value) {
        self.timings
            .write()
            .await
            .insert(key(fileset, book, chapter), timing);
    }

    /// Fail one unit with a transport error.
    pub async fn fail_transport(
        &self,
        operation: ContentOperation,
        fileset: &str,
        book: &str,
        chapter: u32,
    ) {
        self.failures
            .write()
            .await
            .insert((operation, key(fileset, book, chapter)));
    }

    /// Break the media body of a chapter off after its first chunk.
    pub async fn interrupt_media(&self, fileset: &str, book: &str, chapter: u32) {
        self.interrupted_media
            .write()
            .await
            .insert(media_url(fileset, book, chapter));
    }

    /// Append a catalog page; pages are served in insertion order from 1.
    pub async fn add_catalog_page(&self, page: Value) {
        self.catalog_pages.write().await.push(page);
    }

    /// Set an error to be returned by the next operation.
    pub async fn set_next_error(&self, error: FetchError) {
        *self.next_error.write().await = Some(error);
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    pub async fn calls(&self) -> Vec<RecordedContentCall> {
        self.calls.read().await.clone()
    }

    pub async fn calls_of(&self, operation: ContentOperation) -> Vec<RecordedContentCall> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// (page, limit) of every catalog request.
    pub async fn catalog_requests(&self) -> Vec<(u32, u32)> {
        self.catalog_requests.read().await.clone()
    }

    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn take_error(&self) -> Option<FetchError> {
        self.next_error.write().await.take()
    }

    /// Record a call and return the injected failure, if any.
    async fn begin(
        &self,
        operation: ContentOperation,
        target: &str,
        book: &str,
        chapter: u32,
    ) -> Result<(), FetchError> {
        self.calls.write().await.push(RecordedContentCall {
            operation,
            target: target.to_string(),
            book: book.to_string(),
            chapter,
        });

        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        if self
            .failures
            .read()
            .await
            .contains(&(operation, key(target, book, chapter)))
        {
            return Err(FetchError::Timeout(format!(
                "mock transport failure for {} {} {}",
                target, book, chapter
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentClient for MockContentClient {
    async fn audio_location(
        &self,
        fileset: &FilesetId,
        book: &str,
        chapter: u32,
    ) -> Result<Option<String>, FetchError> {
        self.begin(ContentOperation::AudioLocation, fileset.as_str(), book, chapter)
            .await?;
        Ok(self
            .audio_locations
            .read()
            .await
            .get(&key(fileset.as_str(), book, chapter))
            .cloned())
    }

    async fn download_media(&self, url: &str) -> Result<MediaStream, FetchError> {
        self.begin(ContentOperation::DownloadMedia, url, "", 0).await?;
        let bytes = self.media.read().await.get(url).cloned().unwrap_or_default();

        let mut chunks: Vec<Result<Vec<u8>, FetchError>> =
            bytes.chunks(MEDIA_CHUNK).map(|c| Ok(c.to_vec())).collect();
        if self.interrupted_media.read().await.contains(url) {
            chunks.truncate(1);
            chunks.push(Err(FetchError::Timeout(format!(
                "mock media body interrupted for {}",
                url
            ))));
        }
        Ok(futures::stream::iter(chunks).boxed())
    }

    async fn chapter_text(
        &self,
        fileset: &FilesetId,
        book: &str,
        chapter: u32,
    ) -> Result<Option<String>, FetchError> {
        self.begin(ContentOperation::ChapterText, fileset.as_str(), book, chapter)
            .await?;
        Ok(self
            .texts
            .read()
            .await
            .get(&key(fileset.as_str(), book, chapter))
            .cloned())
    }

    async fn chapter_timing(
        &self,
        fileset: &FilesetId,
        book: &str,
        chapter: u32,
    ) -> Result<Option<Value>, FetchError> {
        self.begin(ContentOperation::ChapterTiming, fileset.as_str(), book, chapter)
            .await?;
        Ok(self
            .timings
            .read()
            .await
            .get(&key(fileset.as_str(), book, chapter))
            .cloned())
    }
}

#[async_trait]
impl CatalogSource for MockContentClient {
    async fn catalog_page(&self, page: u32, limit: u32) -> Result<Value, FetchError> {
        self.catalog_requests.write().await.push((page, limit));
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        let pages = self.catalog_pages.read().await;
        page.checked_sub(1)
            .and_then(|index| pages.get(index as usize))
            .cloned()
            .ok_or_else(|| FetchError::ApiError {
                status: 404,
                message: format!("no mock catalog page {}", page),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_unconfigured_units_are_not_available() {
        let client = MockContentClient::new();
        let id = FilesetId::new("ENGWEBN1DA");

        assert_eq!(client.audio_location(&id, "MAT", 1).await.unwrap(), None);
        assert_eq!(client.chapter_text(&id, "MAT", 1).await.unwrap(), None);
        assert_eq!(client.call_count().await, 2);
    }

    #[tokio::test]
    async fn test_audio_round_trip() {
        let client = MockContentClient::new();
        client.add_audio("ENGWEBN1DA", "MAT", 1, b"audio".to_vec()).await;

        let url = client
            .audio_location(&FilesetId::new("ENGWEBN1DA"), "MAT", 1)
            .await
            .unwrap()
            .unwrap();
        let body: Vec<u8> = client
            .download_media(&url)
            .await
            .unwrap()
            .try_concat()
            .await
            .unwrap();
        assert_eq!(body, b"audio".to_vec());
        assert_eq!(
            client.calls_of(ContentOperation::DownloadMedia).await[0].target,
            url
        );
    }

    #[tokio::test]
    async fn test_targeted_transport_failure() {
        let client = MockContentClient::new();
        client.add_text("ENGWEBN_ET", "MAT", 1, "text").await;
        client
            .fail_transport(ContentOperation::ChapterText, "ENGWEBN_ET", "MAT", 1)
            .await;

        let err = client
            .chapter_text(&FilesetId::new("ENGWEBN_ET"), "MAT", 1)
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_next_error_is_consumed_once() {
        let client = MockContentClient::new();
        client.add_timing("ENGWEBN1DA", "MAT", 1, json!([1])).await;
        client
            .set_next_error(FetchError::NotConfigured("no key".to_string()))
            .await;

        let id = FilesetId::new("ENGWEBN1DA");
        assert!(client.chapter_timing(&id, "MAT", 1).await.is_err());
        assert_eq!(
            client.chapter_timing(&id, "MAT", 1).await.unwrap(),
            Some(json!([1]))
        );
    }
}
