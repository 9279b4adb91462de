//! `versekit classify`: cached catalog to metadata repository.

use anyhow::{Context, Result};
use tracing::info;

use versekit_core::{
    catalog, load_catalog, load_timing_filesets, persist_classification, Classifier, Config,
    FsMetadataRepository,
};

pub fn run(config: &Config) -> Result<()> {
    let cache = &config.paths.cache_dir;
    let snapshot = load_catalog(&catalog::pages_dir(cache))
        .context("Failed to load catalog cache (run `versekit fetch` first)")?;
    let timing = load_timing_filesets(&catalog::timing_list_path(cache))
        .context("Failed to load timing fileset list")?;
    info!(
        pages = snapshot.page_count,
        entries = snapshot.entries.len(),
        timing_filesets = timing.len(),
        "Loaded catalog snapshot"
    );

    let output = Classifier::new(timing).classify(&snapshot.entries);

    let repository = FsMetadataRepository::create(&config.paths.metadata_dir)
        .context("Failed to open metadata repository")?;
    let persisted = persist_classification(&repository, &output, &snapshot.fingerprint)
        .context("Failed to persist classification")?;

    let summary = output.summary(&snapshot.fingerprint);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!(
        languages = summary.total_languages,
        filesets = summary.total_filesets,
        syncable_pairs = summary.syncable_pairs,
        written = persisted.records_written,
        unchanged = persisted.records_unchanged,
        exclusions = persisted.exclusions,
        "Classification complete"
    );
    Ok(())
}
