//! Digital Bible Platform (v4) API client.
//!
//! Every API call carries `v=4` and the API key as query parameters.
//! Consecutive calls are spaced by a configurable courtesy delay.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use super::types::{timing_payload, ChapterResponse};
use super::{CatalogSource, ContentClient, FetchError, MediaStream};
use crate::config::ContentApiConfig;
use crate::fileset_id::FilesetId;
use crate::metrics;

const API_VERSION: &str = "4";

/// Content API client.
pub struct DbpClient {
    client: Client,
    base_url: String,
    api_key: String,
    download_timeout: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
    request_delay: Duration,
}

impl DbpClient {
    /// Create a new client. Fails if no API key is configured.
    pub fn new(config: &ContentApiConfig) -> Result<Self, FetchError> {
        if config.api_key.trim().is_empty() {
            return Err(FetchError::NotConfigured(
                "content API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            download_timeout: Duration::from_secs(config.download_timeout_secs),
            last_request: Arc::new(Mutex::new(None)),
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn chapter_endpoint(fileset: &str, book: &str, chapter: u32) -> String {
        format!(
            "bibles/filesets/{}/{}/{}",
            urlencoding::encode(fileset),
            urlencoding::encode(book),
            chapter
        )
    }

    /// Wait for the courtesy delay if needed.
    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.request_delay {
                let wait_time = self.request_delay - elapsed;
                debug!("Content API courtesy delay: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// GET a JSON endpoint. A 404 means the content does not exist: `Ok(None)`.
    async fn get_json(
        &self,
        operation: &'static str,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Option<Value>, FetchError> {
        self.wait_for_rate_limit().await;

        let url = self.endpoint_url(endpoint);
        debug!(operation, %endpoint, "Content API request");

        let timer = metrics::CONTENT_API_DURATION
            .with_label_values(&[operation])
            .start_timer();
        let result = self.send_json(&url, params).await;
        timer.observe_duration();

        let status = match &result {
            Ok(Some(_)) => "ok",
            Ok(None) => "not_found",
            Err(_) => "error",
        };
        metrics::CONTENT_API_REQUESTS
            .with_label_values(&[operation, status])
            .inc();

        result
    }

    async fn send_json(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Option<Value>, FetchError> {
        let response = self
            .client
            .get(url)
            .query(&[("v", API_VERSION), ("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::NotConfigured(
                "content API key was rejected".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| FetchError::ParseError(format!("invalid JSON from {}: {}", url, e)))?;
        Ok(Some(value))
    }

    async fn chapter(
        &self,
        operation: &'static str,
        fileset: &FilesetId,
        book: &str,
        chapter: u32,
    ) -> Result<Option<ChapterResponse>, FetchError> {
        let endpoint = Self::chapter_endpoint(fileset.as_str(), book, chapter);
        let Some(value) = self.get_json(operation, &endpoint, &[]).await? else {
            return Ok(None);
        };
        let response = serde_json::from_value(value).map_err(|e| {
            FetchError::ParseError(format!("Failed to parse chapter response: {}", e))
        })?;
        Ok(Some(response))
    }
}

#[async_trait]
impl ContentClient for DbpClient {
    async fn audio_location(
        &self,
        fileset: &FilesetId,
        book: &str,
        chapter: u32,
    ) -> Result<Option<String>, FetchError> {
        let response = self.chapter("audio_location", fileset, book, chapter).await?;
        Ok(response.and_then(|r| r.first_path()))
    }

    async fn download_media(&self, url: &str) -> Result<MediaStream, FetchError> {
        self.wait_for_rate_limit().await;
        debug!(%url, "Downloading media");

        let timer = metrics::CONTENT_API_DURATION
            .with_label_values(&["download_media"])
            .start_timer();

        // The request timeout also bounds reading the body.
        let result: Result<MediaStream, FetchError> = async {
            let response = self
                .client
                .get(url)
                .timeout(self.download_timeout)
                .send()
                .await
                .map_err(FetchError::from_reqwest)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::ApiError {
                    status: status.as_u16(),
                    message: format!("media download returned {}", status),
                });
            }

            Ok(response
                .bytes_stream()
                .map(|chunk| {
                    chunk
                        .map(|bytes| bytes.to_vec())
                        .map_err(FetchError::from_reqwest)
                })
                .boxed())
        }
        .await;
        timer.observe_duration();

        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::CONTENT_API_REQUESTS
            .with_label_values(&["download_media", status])
            .inc();

        result
    }

    async fn chapter_text(
        &self,
        fileset: &FilesetId,
        book: &str,
        chapter: u32,
    ) -> Result<Option<String>, FetchError> {
        let response = self.chapter("chapter_text", fileset, book, chapter).await?;
        Ok(response.and_then(|r| r.joined_text()))
    }

    async fn chapter_timing(
        &self,
        fileset: &FilesetId,
        book: &str,
        chapter: u32,
    ) -> Result<Option<Value>, FetchError> {
        let endpoint = format!(
            "timestamps/{}/{}/{}",
            urlencoding::encode(fileset.timing_key()),
            urlencoding::encode(book),
            chapter
        );
        let response = self.get_json("chapter_timing", &endpoint, &[]).await?;
        Ok(response.and_then(timing_payload))
    }
}

#[async_trait]
impl CatalogSource for DbpClient {
    async fn catalog_page(&self, page: u32, limit: u32) -> Result<Value, FetchError> {
        let params = [("page", page.to_string()), ("limit", limit.to_string())];
        self.get_json("catalog_page", "bibles", &params)
            .await?
            .ok_or_else(|| FetchError::ApiError {
                status: 404,
                message: format!("catalog page {} not found", page),
            })
    }
}
