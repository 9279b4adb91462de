//! `versekit download`: acquire content for one language or a batch.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use serde_json::json;
use tracing::{info, warn};

use versekit_core::{
    canon::expand_story_sets, parse_book_specs, require_credentials, AcquisitionOrchestrator,
    BookRequest, Config, ContentStore, DbpClient, FsMetadataRepository, LanguageCategory,
    LanguageReport, MetadataRepository, OrchestratorConfig, OrchestratorError,
};

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Language code (e.g. `eng`) for a single-language run.
    #[arg(conflicts_with_all = ["book_set", "region"])]
    pub language: Option<String>,

    /// Books to fetch, e.g. `GEN,EXO`, `MAT:1-5` or a story-set name.
    #[arg(long)]
    pub books: Option<String>,

    /// Batch over every language in this category (e.g. `SYNC_NT`).
    #[arg(long, requires = "books")]
    pub book_set: Option<String>,

    /// Restrict a batch to a configured region, or `ALL`.
    #[arg(long)]
    pub region: Option<String>,

    /// Re-download content that is already present.
    #[arg(long)]
    pub force: bool,
}

/// Which languages a download invocation covers.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    Single(String),
    Batch {
        category: LanguageCategory,
        region: Option<String>,
    },
}

impl DownloadArgs {
    fn selection(&self) -> Result<Selection> {
        if let Some(language) = &self.language {
            return Ok(Selection::Single(language.to_lowercase()));
        }
        if self.book_set.is_none() && self.region.is_none() {
            bail!("specify a language, --book-set or --region");
        }
        let category = match &self.book_set {
            Some(name) => name.parse::<LanguageCategory>().map_err(|e| anyhow!(e))?,
            None => LanguageCategory::All,
        };
        Ok(Selection::Batch {
            category,
            region: self.region.clone(),
        })
    }

    fn book_requests(&self, config: &Config) -> Result<Vec<BookRequest>> {
        match &self.books {
            Some(spec) => {
                let expanded = expand_story_sets(spec, &config.story_sets);
                parse_book_specs(&expanded)
                    .with_context(|| format!("Invalid book specification '{}'", spec))
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Resolve the languages to process. Unknown regions are fatal.
fn resolve_languages(
    selection: &Selection,
    config: &Config,
    repository: &dyn MetadataRepository,
) -> Result<Vec<String>> {
    match selection {
        Selection::Single(language) => {
            if !repository.language_exists(language)? {
                bail!("language '{}' has no classified metadata", language);
            }
            Ok(vec![language.clone()])
        }
        Selection::Batch { category, region } => {
            let filter = match region {
                Some(name) => Some(
                    config
                        .region(name)
                        .ok_or_else(|| anyhow!("unknown region '{}'", name))?,
                ),
                None => None,
            };
            let mut languages = repository.languages_by_category(*category)?;
            if let Some(filter) = filter {
                languages.retain(|iso| filter.allows(iso));
            }
            Ok(languages)
        }
    }
}

fn report_line(report: &LanguageReport) -> serde_json::Value {
    json!({
        "run_id": report.run_id,
        "language": report.language,
        "books": report.books.len(),
        "audio": report.audio_successes(),
        "text": report.text_successes(),
        "timing": report.timing_successes(),
        "failures": report.failures(),
        "ledger": report.errors,
    })
}

pub async fn run(config: &Config, args: &DownloadArgs) -> Result<()> {
    let selection = args.selection()?;
    let books = args.book_requests(config)?;

    let repository = Arc::new(FsMetadataRepository::open(&config.paths.metadata_dir)?);
    require_credentials(config)?;

    let languages = resolve_languages(&selection, config, repository.as_ref())?;
    if languages.is_empty() {
        warn!(?selection, "No languages match the selection");
        return Ok(());
    }
    info!(languages = languages.len(), force = args.force, "Starting download");

    let client = DbpClient::new(&config.content_api).context("Failed to create content API client")?;
    let orchestrator = AcquisitionOrchestrator::new(
        OrchestratorConfig::default().with_force(args.force),
        Arc::new(client),
        repository,
        ContentStore::new(&config.paths.output_dir),
        &config.paths.error_log_dir,
    )?;

    let mut failed = 0;
    for language in &languages {
        match orchestrator.acquire_language(language, &books).await {
            Ok(report) => println!("{}", report_line(&report)),
            Err(e @ OrchestratorError::Unauthorized(_)) => {
                return Err(e).context("Content API rejected the credentials, aborting");
            }
            Err(e) => {
                warn!(language = %language, error = %e, "Language failed");
                failed += 1;
            }
        }
    }

    if failed > 0 && failed == languages.len() {
        bail!("all {} languages failed", failed);
    }
    Ok(())
}
