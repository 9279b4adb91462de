use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub content_api: ContentApiConfig,
    #[serde(default)]
    pub catalog_fetch: CatalogFetchConfig,
    /// Region name -> language codes.
    #[serde(default)]
    pub regions: BTreeMap<String, Vec<String>>,
    /// Story-set name -> book spec string.
    #[serde(default)]
    pub story_sets: BTreeMap<String, String>,
}

impl Config {
    /// Resolve a region name. `ALL` selects every classified language.
    pub fn region(&self, name: &str) -> Option<RegionFilter> {
        if name == ALL_REGIONS {
            return Some(RegionFilter::All);
        }
        self.regions
            .get(name)
            .map(|codes| RegionFilter::Languages(codes.clone()))
    }
}

pub const ALL_REGIONS: &str = "ALL";

/// Language filter derived from a region name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionFilter {
    All,
    Languages(Vec<String>),
}

impl RegionFilter {
    pub fn allows(&self, iso: &str) -> bool {
        match self {
            Self::All => true,
            Self::Languages(codes) => codes.iter().any(|c| c == iso),
        }
    }
}

/// Filesystem locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Raw catalog pages and the timing-capability list.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Classified metadata repository root.
    #[serde(default = "default_metadata_dir")]
    pub metadata_dir: PathBuf,
    /// Downloaded content root.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Per-language error ledgers.
    #[serde(default = "default_error_log_dir")]
    pub error_log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            metadata_dir: default_metadata_dir(),
            output_dir: default_output_dir(),
            error_log_dir: default_error_log_dir(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("api-cache")
}

fn default_metadata_dir() -> PathBuf {
    PathBuf::from("sorted/BB")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads/BB")
}

fn default_error_log_dir() -> PathBuf {
    PathBuf::from("download_log")
}

/// Content API client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key (also read from `BIBLE_API_KEY`).
    #[serde(default)]
    pub api_key: String,
    /// Per-request timeout for JSON endpoints, in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Timeout for media downloads, in seconds (default: 60)
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
    /// Minimum spacing between consecutive requests, in milliseconds.
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,
}

impl Default for ContentApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            timeout_secs: default_timeout(),
            download_timeout_secs: default_download_timeout(),
            request_delay_ms: default_request_delay(),
        }
    }
}

fn default_base_url() -> String {
    "https://4.dbt.io/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_download_timeout() -> u64 {
    60
}

fn default_request_delay() -> u64 {
    100
}

/// Catalog cache refresh settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogFetchConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,
}

impl Default for CatalogFetchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            page_delay_ms: default_page_delay(),
        }
    }
}

fn default_page_size() -> u32 {
    200
}

fn default_page_delay() -> u64 {
    500
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub paths: PathsConfig,
    pub content_api: SanitizedContentApiConfig,
    pub catalog_fetch: CatalogFetchConfig,
    pub regions: usize,
    pub story_sets: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedContentApiConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub request_delay_ms: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            paths: config.paths.clone(),
            content_api: SanitizedContentApiConfig {
                base_url: config.content_api.base_url.clone(),
                api_key_configured: !config.content_api.api_key.is_empty(),
                timeout_secs: config.content_api.timeout_secs,
                download_timeout_secs: config.content_api.download_timeout_secs,
                request_delay_ms: config.content_api.request_delay_ms,
            },
            catalog_fetch: config.catalog_fetch.clone(),
            regions: config.regions.len(),
            story_sets: config.story_sets.keys().cloned().collect(),
        }
    }
}
