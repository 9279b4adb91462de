pub mod canon;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod content_api;
pub mod fileset_id;
pub mod ledger;
pub mod matcher;
pub mod metrics;
pub mod orchestrator;
pub mod repository;
pub mod store;
pub mod testing;

pub use canon::{parse_book_specs, BookRequest, CanonError, Testament};
pub use catalog::{load_catalog, load_timing_filesets, CatalogEntry, CatalogError, TimingIndex};
pub use classifier::{BookSet, ClassificationOutput, ClassifiedMetadata, Classifier, ExclusionSet};
pub use config::{
    load_config, load_config_from_str, require_credentials, validate_config, Config, ConfigError,
    RegionFilter, SanitizedConfig,
};
pub use content_api::{CatalogFetcher, CatalogSource, ContentClient, DbpClient, FetchError};
pub use fileset_id::FilesetId;
pub use ledger::{ErrorLedger, ErrorSummary, LedgerError};
pub use matcher::SyncablePair;
pub use orchestrator::{AcquisitionOrchestrator, LanguageReport, OrchestratorConfig, OrchestratorError};
pub use repository::{
    persist_classification, FsMetadataRepository, LanguageCategory, MetadataRepository,
    RepositoryError,
};
pub use store::{ArtifactKind, ContentStore, StoreError, StreamWriteError};
